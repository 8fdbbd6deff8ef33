//! Turns the model's free-text reply into an `ExtractedScript`.

use crate::model::ExtractedScript;
use anyhow::Context;
use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

fn json_object_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("json object pattern is valid"))
}

pub fn marksheet_schema() -> Value {
    let scalar = json!({ "type": ["string", "number", "null"] });
    json!({
        "type": "object",
        "properties": {
            "Register Number": scalar,
            "Course Code": scalar,
            "Course Title": scalar,
            "Semester": scalar,
            "Exam Date": scalar,
            "Invigilator Name": scalar,
            "Marks": {
                "type": ["array", "null"],
                "items": {
                    "type": "object",
                    "properties": {
                        "Q.No": scalar,
                        "CO": scalar,
                        "Marks Awarded": scalar
                    }
                }
            }
        }
    })
}

/// Takes the outermost `{...}` span of `text`, checks it against the
/// marksheet schema, then decodes it.
pub fn parse_extraction(text: &str) -> anyhow::Result<ExtractedScript> {
    let span = json_object_pattern()
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| anyhow::anyhow!("no JSON object in model output"))?;

    let value: Value = serde_json::from_str(span).context("model output is not valid JSON")?;
    validate(&value)?;

    serde_json::from_value(value).context("model output does not match the marksheet shape")
}

pub fn validate(value: &Value) -> anyhow::Result<()> {
    let schema = marksheet_schema();
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| anyhow::anyhow!("marksheet schema compile failed: {}", e))?;

    if let Err(errors) = compiled.validate(value) {
        let list: Vec<String> = errors
            .map(|e| format!("{} at '{}'", e, e.instance_path))
            .collect();
        anyhow::bail!(
            "model output failed marksheet validation ({} errors): {}",
            list.len(),
            list.join("; ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"Register Number\": \"R7\", \"Marks\": [{\"Q.No\": \"1\", \"CO\": \"CO1\", \"Marks Awarded\": \"6\"}]}\n```";
        let script = parse_extraction(reply).unwrap();
        assert_eq!(script.metadata.register_number, "R7");
        assert_eq!(script.marks.len(), 1);
        assert_eq!(script.marks[0].marks_awarded, 6.0);
    }

    #[test]
    fn reply_without_json_fails() {
        let err = parse_extraction("I could not read this image.").unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }

    #[test]
    fn schema_violation_is_reported() {
        let err = parse_extraction(r#"{"Marks": "none"}"#).unwrap_err();
        assert!(err.to_string().contains("marksheet validation"), "{err}");
    }

    #[test]
    fn truncated_json_fails() {
        let err = parse_extraction(r#"{"Register Number": "R1", "Marks": [}"#).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn missing_marks_key_is_empty_list() {
        let script = parse_extraction(r#"{"Register Number": "R1"}"#).unwrap();
        assert!(script.marks.is_empty());
    }
}
