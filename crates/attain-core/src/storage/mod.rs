use crate::errors::AttainResult;
use crate::model::ResultRecord;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod merge;
pub mod rows;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryResultStore;
pub use sqlite::SqliteResultStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectStatus {
    Completed,
    Corrupted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectListing {
    pub subject_code: String,
    pub subject_title: String,
    /// Sanitized key the table is stored under.
    pub file_name: String,
    pub status: SubjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTable {
    pub key: String,
    pub records: Vec<ResultRecord>,
}

impl SubjectTable {
    /// Flat display rows with every column present and no null/non-finite
    /// values.
    pub fn to_rows(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        rows::to_display_rows(&self.records)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub key: String,
    pub rows_before: usize,
    pub rows_after: usize,
    /// The previous table was unreadable and has been replaced.
    pub recovered: bool,
}

/// Per-subject persisted result tables.
pub trait ResultStore: Send + Sync {
    /// Appends `rows` to the table for `subject_key`, replacing earlier rows
    /// with the same (register number, question number).
    fn merge(&self, subject_key: &str, rows: Vec<ResultRecord>) -> AttainResult<MergeOutcome>;

    /// All stored subjects, sorted by subject code.
    fn list(&self) -> AttainResult<Vec<SubjectListing>>;

    /// Exact sanitized-key match first, then a case-insensitive prefix scan.
    fn fetch(&self, subject_name: &str) -> AttainResult<SubjectTable>;

    /// Deletes every stored table and returns how many were removed.
    fn clear(&self) -> AttainResult<usize>;
}

pub(crate) fn sort_listings(listings: &mut [SubjectListing]) {
    listings.sort_by(|a, b| a.subject_code.cmp(&b.subject_code));
}
