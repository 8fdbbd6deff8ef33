use crate::engine::BatchOutcome;
use crate::model::CoAttainment;
use crate::rubric::Rubric;
use crate::storage::{SubjectListing, SubjectStatus};
use std::fmt::Write;

pub fn print_outcome(outcome: &BatchOutcome) {
    eprint!("{}", render_outcome(outcome));
}

pub fn print_listings(listings: &[SubjectListing]) {
    print!("{}", render_listings(listings));
}

pub fn print_rubric(rubric: &Rubric) {
    print!("{}", render_rubric(rubric));
}

pub fn render_outcome(outcome: &BatchOutcome) -> String {
    let mut out = String::new();
    for s in &outcome.scripts {
        let _ = writeln!(
            out,
            "OK   [{}] {}  CO: {}  PO: {}",
            s.file_name,
            display_or(&s.register_number, "-"),
            format_mapping(&s.attainment.co),
            format_mapping(&s.attainment.po),
        );
        if !s.unmatched_questions.is_empty() {
            let _ = writeln!(
                out,
                "     not in rubric: {}",
                s.unmatched_questions.join(", ")
            );
        }
    }
    for s in &outcome.skipped {
        let _ = writeln!(out, "SKIP [{}]: {}", s.file_name, s.reason);
    }
    let _ = writeln!(
        out,
        "Subject: {} ({}) -> {}",
        outcome.subject.code, outcome.subject.title, outcome.merge.key
    );
    if outcome.merge.recovered {
        let _ = writeln!(out, "WARN previous table was unreadable and has been replaced");
    }
    let _ = writeln!(
        out,
        "Results: processed={} skipped={} rows={}",
        outcome.processed,
        outcome.skipped.len(),
        outcome.merge.rows_after
    );
    out
}

pub fn render_listings(listings: &[SubjectListing]) -> String {
    if listings.is_empty() {
        return "No subjects stored.\n".to_string();
    }
    let mut out = String::new();
    for l in listings {
        let status = match l.status {
            SubjectStatus::Completed => "completed",
            SubjectStatus::Corrupted => "CORRUPTED",
        };
        let _ = writeln!(
            out,
            "{:<12} {:<40} {:<10} {}",
            l.subject_code,
            l.subject_title,
            status,
            l.updated_at.as_deref().unwrap_or("")
        );
    }
    out
}

pub fn render_rubric(rubric: &Rubric) -> String {
    let c = &rubric.columns;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Columns: question={:?} co={:?} max={:?}",
        c.question, c.co, c.max_marks
    );
    let _ = writeln!(out, "Questions: {}", rubric.rows.len());
    for po in &c.po {
        let cos = rubric.cos_for_po(po);
        if cos.is_empty() {
            let _ = writeln!(out, "{po}: (no related CO, omitted)");
        } else {
            let _ = writeln!(out, "{po}: {}", cos.join(", "));
        }
    }
    out
}

fn format_mapping(map: &CoAttainment) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }
    map.iter()
        .map(|(k, v)| format!("{k}={v:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_or<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.is_empty() {
        fallback
    } else {
        s
    }
}
