//! Rubric loading: resolves the question-number, CO and max-marks columns by
//! header, collects PO indicator columns, and validates the rows.

use crate::errors::{AttainError, AttainResult};
use std::collections::{BTreeMap, HashSet};

pub mod table;

pub use table::{Cell, RawTable};

pub const QUESTION_SYNONYMS: &[&str] = &["q.no", "qno", "question", "question no", "question number"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubricColumns {
    pub question: String,
    pub co: String,
    pub max_marks: String,
    /// Headers starting with "PO", in file order.
    pub po: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RubricRow {
    pub question_no: String,
    pub co: String,
    pub max_marks: f64,
    /// PO name → whether this row's indicator cell equals 1.
    pub po_flags: BTreeMap<String, bool>,
}

#[derive(Debug, Clone)]
pub struct Rubric {
    pub columns: RubricColumns,
    pub rows: Vec<RubricRow>,
}

impl Rubric {
    /// Parses an uploaded rubric file; `.xlsx`/`.xls`/`.ods` go through the
    /// workbook reader, anything else is read as delimited text.
    pub fn load(file_name: &str, bytes: &[u8]) -> AttainResult<Self> {
        let table = table::read_table(file_name, bytes)?;
        Self::from_table(&table)
    }

    pub fn from_table(table: &RawTable) -> AttainResult<Self> {
        let columns = resolve_columns(&table.headers)?;

        let q_idx = index_of(table, &columns.question)?;
        let co_idx = index_of(table, &columns.co)?;
        let max_idx = index_of(table, &columns.max_marks)?;
        let po_idx = columns
            .po
            .iter()
            .map(|po| index_of(table, po).map(|i| (po.clone(), i)))
            .collect::<AttainResult<Vec<_>>>()?;

        let mut rows = Vec::new();
        let mut seen = HashSet::new();

        for r in 0..table.rows.len() {
            let question_no = table.cell(r, q_idx).as_text();
            if question_no.is_empty() {
                continue;
            }

            if !seen.insert(question_no.clone()) {
                return Err(AttainError::Configuration(format!(
                    "rubric lists question {question_no} more than once"
                )));
            }

            let co = table.cell(r, co_idx).as_text();
            if co.is_empty() {
                return Err(AttainError::Configuration(format!(
                    "rubric question {question_no} has no {} value",
                    columns.co
                )));
            }

            let max_marks = table.cell(r, max_idx).as_f64().ok_or_else(|| {
                AttainError::Configuration(format!(
                    "rubric question {question_no} has a non-numeric {} value",
                    columns.max_marks
                ))
            })?;

            let po_flags = po_idx
                .iter()
                .map(|(po, i)| (po.clone(), table.cell(r, *i).as_f64() == Some(1.0)))
                .collect();

            rows.push(RubricRow {
                question_no,
                co,
                max_marks,
                po_flags,
            });
        }

        tracing::debug!(
            event = "rubric_loaded",
            questions = rows.len(),
            po_columns = columns.po.len(),
            question_column = %columns.question,
            co_column = %columns.co,
            max_column = %columns.max_marks
        );

        Ok(Self { columns, rows })
    }

    /// Exact match on the trimmed question number.
    pub fn row(&self, question_no: &str) -> Option<&RubricRow> {
        let q = question_no.trim();
        self.rows.iter().find(|r| r.question_no == q)
    }

    /// Distinct COs flagged for `po`, in rubric order.
    pub fn cos_for_po(&self, po: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if row.po_flags.get(po).copied().unwrap_or(false) && !out.contains(&row.co.as_str()) {
                out.push(&row.co);
            }
        }
        out
    }
}

pub fn resolve_columns(headers: &[String]) -> AttainResult<RubricColumns> {
    let find = |pred: &dyn Fn(&str) -> bool| {
        headers
            .iter()
            .find(|h| pred(&h.trim().to_lowercase()))
            .map(|h| h.clone())
    };

    let question = find(&|h| QUESTION_SYNONYMS.contains(&h));
    let co = find(&|h| h == "co");
    let max_marks = find(&|h| h.contains("max"));

    let mut missing = Vec::new();
    if question.is_none() {
        missing.push(missing_hint("question number (Q.No)", "q.no", headers));
    }
    if co.is_none() {
        missing.push(missing_hint("CO", "co", headers));
    }
    if max_marks.is_none() {
        missing.push(missing_hint("Max Marks", "max marks", headers));
    }

    match (question, co, max_marks) {
        (Some(question), Some(co), Some(max_marks)) => {
            let po = headers
                .iter()
                .filter(|h| h.trim().to_uppercase().starts_with("PO"))
                .cloned()
                .collect();
            Ok(RubricColumns {
                question,
                co,
                max_marks,
                po,
            })
        }
        _ => Err(AttainError::Configuration(format!(
            "rubric file must contain columns for question number (Q.No), CO, and Max Marks; missing: {}",
            missing.join("; ")
        ))),
    }
}

fn missing_hint(label: &str, canonical: &str, headers: &[String]) -> String {
    let closest = headers
        .iter()
        .filter(|h| !h.trim().is_empty())
        .map(|h| (h, strsim::normalized_levenshtein(&h.trim().to_lowercase(), canonical)))
        .filter(|(_, score)| *score >= 0.5)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match closest {
        Some((h, _)) => format!("{label} (closest header: {h:?})"),
        None => label.to_string(),
    }
}

fn index_of(table: &RawTable, header: &str) -> AttainResult<usize> {
    table
        .column_index(header)
        .ok_or_else(|| AttainError::Configuration(format!("rubric column {header:?} vanished")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_csv(text: &str) -> AttainResult<Rubric> {
        Rubric::load("rubric.csv", text.as_bytes())
    }

    #[test]
    fn resolves_synonyms_case_insensitively() {
        let rubric = load_csv("Question Number,co,Maximum,po1,PO2\n1,CO1,10,1,0\n").unwrap();
        assert_eq!(rubric.columns.question, "Question Number");
        assert_eq!(rubric.columns.co, "co");
        assert_eq!(rubric.columns.max_marks, "Maximum");
        assert_eq!(rubric.columns.po, vec!["po1", "PO2"]);
    }

    #[test]
    fn co_column_must_match_exactly() {
        let err = load_csv("Q.No,Course Outcome,Max Marks\n1,CO1,10\n").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("CO"));
    }

    #[test]
    fn missing_columns_carry_closest_header_hint() {
        let err = load_csv("Q No,CO,Max Marks\n1,CO1,10\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("question number"), "{msg}");
        assert!(msg.contains("closest header: \"Q No\""), "{msg}");
    }

    #[test]
    fn po_columns_are_optional() {
        let rubric = load_csv("Q.No,CO,Max Marks\n1,CO1,10\n2,CO2,5\n").unwrap();
        assert!(rubric.columns.po.is_empty());
        assert_eq!(rubric.rows.len(), 2);
        assert!(rubric.rows[0].po_flags.is_empty());
    }

    #[test]
    fn blank_question_rows_are_skipped() {
        let rubric = load_csv("Q.No,CO,Max Marks\n1,CO1,10\n,,\n2,CO2,5\n").unwrap();
        assert_eq!(rubric.rows.len(), 2);
    }

    #[test]
    fn duplicate_questions_are_rejected() {
        let err = load_csv("Q.No,CO,Max Marks\n1,CO1,10\n1,CO2,5\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn non_numeric_max_is_rejected() {
        let err = load_csv("Q.No,CO,Max Marks\n1,CO1,ten\n").unwrap_err();
        assert!(err.to_string().contains("question 1"));
    }

    #[test]
    fn cos_for_po_are_distinct_and_ordered() {
        let rubric = load_csv(
            "Q.No,CO,Max Marks,PO1,PO2\n1,CO2,10,1,0\n2,CO1,10,1,0\n3,CO2,5,1,0\n4,CO3,5,0,1.0\n",
        )
        .unwrap();
        assert_eq!(rubric.cos_for_po("PO1"), vec!["CO2", "CO1"]);
        assert_eq!(rubric.cos_for_po("PO2"), vec!["CO3"]);
        assert!(rubric.cos_for_po("PO9").is_empty());
    }

    #[test]
    fn numeric_question_numbers_match_trimmed_text() {
        let rubric = load_csv("Q.No,CO,Max Marks\n1,CO1,10\n1a,CO1,5\n").unwrap();
        assert!(rubric.row(" 1 ").is_some());
        assert!(rubric.row("1a").is_some());
        assert!(rubric.row("2").is_none());
    }
}
