//! Flat row shapes: the persisted column layout and the display rows handed
//! to callers.

use crate::model::{
    CoAttainment, ExamMetadata, MarkRecord, PoAttainment, ResultRecord, SummaryRecord,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DISPLAY_COLUMNS: &[&str] = &[
    "Register Number",
    "Course Code",
    "Course Title",
    "Semester",
    "Exam Date",
    "Invigilator Name",
    "Q.No",
    "CO",
    "Marks Awarded",
    "Summary Type",
    "CO Attainment (%)",
    "PO Attainment (%)",
];

/// One row of the persisted `results` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    pub register_number: Option<String>,
    pub course_code: Option<String>,
    pub course_title: Option<String>,
    pub semester: Option<String>,
    pub exam_date: Option<String>,
    pub invigilator_name: Option<String>,
    pub q_no: Option<String>,
    pub co: Option<String>,
    pub marks_awarded: Option<f64>,
    pub summary_type: Option<String>,
    pub co_attainment: Option<String>,
    pub po_attainment: Option<String>,
}

impl FlatRow {
    pub fn from_record(record: &ResultRecord) -> Self {
        let m = record.metadata();
        let mut row = FlatRow {
            register_number: Some(m.register_number.clone()),
            course_code: Some(m.course_code.clone()),
            course_title: Some(m.course_title.clone()),
            semester: Some(m.semester.clone()),
            exam_date: Some(m.exam_date.clone()),
            invigilator_name: Some(m.invigilator_name.clone()),
            ..Default::default()
        };
        match record {
            ResultRecord::Mark(mark) => {
                row.q_no = Some(mark.question_no.clone());
                row.co = Some(mark.co.clone());
                row.marks_awarded = mark.marks_awarded.filter(|v| v.is_finite());
            }
            ResultRecord::Summary(summary) => {
                row.summary_type = Some(summary.summary_type.clone());
                row.co_attainment = Some(mapping_to_string(&summary.co_attainment));
                row.po_attainment = Some(mapping_to_string(&summary.po_attainment));
            }
        }
        row
    }

    /// Rebuilds the typed record. A non-empty `summary_type` marks a summary
    /// row; its attainment columns must hold JSON objects.
    pub fn into_record(self) -> Result<ResultRecord, String> {
        let metadata = ExamMetadata {
            register_number: self.register_number.unwrap_or_default(),
            course_code: self.course_code.unwrap_or_default(),
            course_title: self.course_title.unwrap_or_default(),
            semester: self.semester.unwrap_or_default(),
            exam_date: self.exam_date.unwrap_or_default(),
            invigilator_name: self.invigilator_name.unwrap_or_default(),
        };

        match self.summary_type.filter(|s| !s.is_empty()) {
            Some(summary_type) => Ok(ResultRecord::Summary(SummaryRecord {
                metadata,
                summary_type,
                co_attainment: mapping_from_str(self.co_attainment.as_deref())?,
                po_attainment: mapping_from_str(self.po_attainment.as_deref())?,
            })),
            None => Ok(ResultRecord::Mark(MarkRecord {
                metadata,
                question_no: self.q_no.unwrap_or_default(),
                co: self.co.unwrap_or_default(),
                marks_awarded: self.marks_awarded,
            })),
        }
    }
}

/// Non-finite percentages would be written as `null`; they are dropped so
/// every written cell reads back.
fn mapping_to_string(map: &CoAttainment) -> String {
    let finite: CoAttainment = map
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    serde_json::to_string(&finite).unwrap_or_else(|_| "{}".to_string())
}

/// `null` entries (tables written before non-finite values were dropped)
/// are skipped rather than failing the whole table.
fn mapping_from_str(raw: Option<&str>) -> Result<PoAttainment, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(PoAttainment::new()),
        Some(s) => {
            let cells: BTreeMap<String, Option<f64>> = serde_json::from_str(s)
                .map_err(|e| format!("bad attainment cell {s:?}: {e}"))?;
            Ok(cells
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect())
        }
    }
}

pub fn to_display_rows(records: &[ResultRecord]) -> Vec<Map<String, Value>> {
    records.iter().map(display_row).collect()
}

fn display_row(record: &ResultRecord) -> Map<String, Value> {
    let flat = FlatRow::from_record(record);
    let text = |v: Option<String>| Value::String(v.unwrap_or_default());

    let mut row = Map::new();
    row.insert("Register Number".into(), text(flat.register_number));
    row.insert("Course Code".into(), text(flat.course_code));
    row.insert("Course Title".into(), text(flat.course_title));
    row.insert("Semester".into(), text(flat.semester));
    row.insert("Exam Date".into(), text(flat.exam_date));
    row.insert("Invigilator Name".into(), text(flat.invigilator_name));
    row.insert("Q.No".into(), text(flat.q_no));
    row.insert("CO".into(), text(flat.co));
    row.insert(
        "Marks Awarded".into(),
        flat.marks_awarded
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(String::new())),
    );
    row.insert("Summary Type".into(), text(flat.summary_type));
    row.insert("CO Attainment (%)".into(), text(flat.co_attainment));
    row.insert("PO Attainment (%)".into(), text(flat.po_attainment));
    row
}
