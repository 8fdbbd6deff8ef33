//! Derives the subject a batch of scripts is filed under.
//!
//! The course-code pattern is a heuristic: title text that happens to look
//! like a course code (e.g. "PART2 LAB101") will be taken as one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const UNKNOWN_CODE: &str = "UNKNOWN";
pub const UNKNOWN_TITLE: &str = "Unknown Title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub code: String,
    pub title: String,
    /// `{code}_{title with spaces as underscores}`, before sanitizing.
    pub key: String,
}

fn course_code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([0-9]{2,4}[A-Z]{2,4}[0-9]{2,4}|[A-Z]{2,4}[0-9]{2,4})\b")
            .expect("course code pattern is valid")
    })
}

fn title_prefix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*?-\s*").expect("title prefix pattern is valid"))
}

pub fn resolve_subject(course_title: Option<&str>, course_code: Option<&str>) -> SubjectInfo {
    let mut code = UNKNOWN_CODE.to_string();
    let mut title = UNKNOWN_TITLE.to_string();

    if let Some(c) = course_code.map(str::trim).filter(|c| !c.is_empty()) {
        code = c.to_uppercase();
    }

    if let Some(t) = course_title.map(str::trim).filter(|t| !t.is_empty()) {
        let text = t.to_uppercase();
        match course_code_pattern().captures(&text).and_then(|c| c.get(1)) {
            Some(m) => {
                code = m.as_str().split_whitespace().collect();
                title = title_prefix_pattern()
                    .replace(&text, "")
                    .trim()
                    .to_uppercase();
            }
            None => title = text,
        }
    }

    let key = format!("{}_{}", code, title.replace(' ', "_"));
    SubjectInfo { code, title, key }
}

/// Identifier-safe form of a subject key: upper-cased, then only `A-Z`,
/// `0-9` and `_` kept.
pub fn sanitize_key(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Splits a sanitized key back into display code and title.
pub fn split_key(key: &str) -> (String, String) {
    match key.split_once('_') {
        Some((code, title)) => (code.to_string(), title.replace('_', " ")),
        None => (key.to_string(), UNKNOWN_TITLE.to_string()),
    }
}

/// Collects the first non-empty course title and course code seen across a
/// batch; each is taken independently from whichever script first has it.
#[derive(Debug, Default, Clone)]
pub struct SubjectSeed {
    title: Option<String>,
    code: Option<String>,
}

impl SubjectSeed {
    pub fn observe(&mut self, course_title: &str, course_code: &str) {
        if self.title.is_none() && !course_title.trim().is_empty() {
            self.title = Some(course_title.to_string());
        }
        if self.code.is_none() && !course_code.trim().is_empty() {
            self.code = Some(course_code.to_string());
        }
    }

    pub fn resolve(&self) -> SubjectInfo {
        resolve_subject(self.title.as_deref(), self.code.as_deref())
    }
}
