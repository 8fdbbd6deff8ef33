use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// CO name → attainment percentage (0-100, two decimals; may exceed 100 when
/// awarded marks exceed the rubric maximum).
pub type CoAttainment = BTreeMap<String, f64>;

/// PO name → mean of the related COs' percentages.
pub type PoAttainment = BTreeMap<String, f64>;

pub const SUMMARY_TYPE_CO_PO: &str = "CO-PO Attainment";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamMetadata {
    #[serde(rename = "Register Number", default, deserialize_with = "lenient_string")]
    pub register_number: String,
    #[serde(rename = "Course Code", default, deserialize_with = "lenient_string")]
    pub course_code: String,
    #[serde(rename = "Course Title", default, deserialize_with = "lenient_string")]
    pub course_title: String,
    #[serde(rename = "Semester", default, deserialize_with = "lenient_string")]
    pub semester: String,
    #[serde(rename = "Exam Date", default, deserialize_with = "lenient_string")]
    pub exam_date: String,
    #[serde(rename = "Invigilator Name", default, deserialize_with = "lenient_string")]
    pub invigilator_name: String,
}

/// One row of the marks table read off a script. `co` is informational; the
/// rubric decides which CO a question counts towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptMarkRow {
    #[serde(rename = "Q.No", default, deserialize_with = "lenient_string")]
    pub question_no: String,
    #[serde(rename = "CO", default, deserialize_with = "lenient_string")]
    pub co: String,
    #[serde(rename = "Marks Awarded", default, deserialize_with = "lenient_marks")]
    pub marks_awarded: f64,
}

impl ScriptMarkRow {
    pub fn new(question_no: impl Into<String>, co: impl Into<String>, marks_awarded: f64) -> Self {
        Self {
            question_no: question_no.into(),
            co: co.into(),
            marks_awarded,
        }
    }
}

/// What the extraction collaborator returns for one script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedScript {
    #[serde(flatten)]
    pub metadata: ExamMetadata,
    #[serde(rename = "Marks", default, deserialize_with = "null_as_empty")]
    pub marks: Vec<ScriptMarkRow>,
}

impl ExtractedScript {
    /// Nothing was read off the script: every metadata field blank and no
    /// marks.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() && self.metadata == ExamMetadata::default()
    }
}

/// An uploaded answer-script image.
#[derive(Debug, Clone)]
pub struct ScriptImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ScriptImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkRecord {
    pub metadata: ExamMetadata,
    pub question_no: String,
    pub co: String,
    pub marks_awarded: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub metadata: ExamMetadata,
    pub summary_type: String,
    pub co_attainment: CoAttainment,
    pub po_attainment: PoAttainment,
}

/// A row of a subject's result table: either one question's marks or the
/// per-script attainment summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultRecord {
    Mark(MarkRecord),
    Summary(SummaryRecord),
}

impl ResultRecord {
    pub fn metadata(&self) -> &ExamMetadata {
        match self {
            ResultRecord::Mark(m) => &m.metadata,
            ResultRecord::Summary(s) => &s.metadata,
        }
    }

    /// Summary rows carry no question number.
    pub fn question_no(&self) -> &str {
        match self {
            ResultRecord::Mark(m) => &m.question_no,
            ResultRecord::Summary(_) => "",
        }
    }

    /// Identity used when merging into an existing table. Summary rows get
    /// their own slot so a mark row with a blank question number never
    /// replaces one.
    pub fn dedupe_key(&self) -> (String, RowSlot) {
        let slot = match self {
            ResultRecord::Mark(m) => RowSlot::Question(m.question_no.clone()),
            ResultRecord::Summary(_) => RowSlot::Summary,
        };
        (self.metadata().register_number.clone(), slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowSlot {
    Question(String),
    Summary,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn lenient_marks<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let v = serde_json::Value::deserialize(deserializer)?;
    let marks = match v {
        serde_json::Value::Null => return Ok(0.0),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("marks out of range: {n}")))?,
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>()
                .map_err(|_| D::Error::custom(format!("marks awarded is not a number: {s:?}")))?
        }
        other => {
            return Err(D::Error::custom(format!(
                "marks awarded is not a number: {other}"
            )))
        }
    };
    // "NaN" and "inf" parse as f64 but poison every percentage they touch
    if !marks.is_finite() {
        return Err(D::Error::custom(format!(
            "marks awarded is not a finite number: {marks}"
        )));
    }
    Ok(marks)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_script_accepts_loose_types() {
        let raw = serde_json::json!({
            "Register Number": 21104001,
            "Course Code": " 21cs301 ",
            "Course Title": null,
            "Marks": [
                {"Q.No": 1, "CO": "CO1", "Marks Awarded": "8"},
                {"Q.No": "2", "CO": null, "Marks Awarded": 4.5},
                {"Q.No": "3"}
            ]
        });
        let script: ExtractedScript = serde_json::from_value(raw).unwrap();
        assert_eq!(script.metadata.register_number, "21104001");
        assert_eq!(script.metadata.course_code, "21cs301");
        assert_eq!(script.metadata.course_title, "");
        assert_eq!(script.metadata.semester, "");
        assert_eq!(script.marks.len(), 3);
        assert_eq!(script.marks[0], ScriptMarkRow::new("1", "CO1", 8.0));
        assert_eq!(script.marks[1].marks_awarded, 4.5);
        assert_eq!(script.marks[2].marks_awarded, 0.0);
    }

    #[test]
    fn non_numeric_marks_are_rejected() {
        let raw = serde_json::json!({
            "Marks": [{"Q.No": "1", "Marks Awarded": "eight"}]
        });
        let err = serde_json::from_value::<ExtractedScript>(raw).unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn non_finite_marks_are_rejected() {
        for bad in ["NaN", "inf", "-Infinity"] {
            let raw = serde_json::json!({
                "Marks": [{"Q.No": "1", "Marks Awarded": bad}]
            });
            let err = serde_json::from_value::<ExtractedScript>(raw).unwrap_err();
            assert!(err.to_string().contains("not a finite number"), "{bad}: {err}");
        }
    }

    #[test]
    fn null_marks_list_is_empty() {
        let raw = serde_json::json!({"Register Number": "R1", "Marks": null});
        let script: ExtractedScript = serde_json::from_value(raw).unwrap();
        assert!(script.marks.is_empty());
    }

    #[test]
    fn summary_rows_have_their_own_slot() {
        let rec = ResultRecord::Summary(SummaryRecord {
            metadata: ExamMetadata {
                register_number: "R1".into(),
                ..Default::default()
            },
            summary_type: SUMMARY_TYPE_CO_PO.into(),
            co_attainment: CoAttainment::new(),
            po_attainment: PoAttainment::new(),
        });
        assert_eq!(rec.dedupe_key(), ("R1".to_string(), RowSlot::Summary));

        let blank_question = ResultRecord::Mark(MarkRecord {
            metadata: rec.metadata().clone(),
            question_no: String::new(),
            co: "CO1".into(),
            marks_awarded: Some(1.0),
        });
        assert_ne!(blank_question.dedupe_key(), rec.dedupe_key());
    }

    #[test]
    fn empty_reply_is_empty() {
        let script: ExtractedScript = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(script.is_empty());

        let script: ExtractedScript =
            serde_json::from_value(serde_json::json!({"Register Number": "R1"})).unwrap();
        assert!(!script.is_empty());
    }
}
