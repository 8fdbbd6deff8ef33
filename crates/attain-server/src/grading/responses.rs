use attain_core::engine::{BatchOutcome, SkippedScript};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub status: &'static str,
    pub message: String,
    pub subject_code: String,
    pub subject_title: String,
    pub subject_key: String,
    pub processed: usize,
    pub skipped: Vec<SkippedScript>,
}

impl From<BatchOutcome> for ProcessResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            status: "success",
            message: outcome.message(),
            subject_code: outcome.subject.code,
            subject_title: outcome.subject.title,
            subject_key: outcome.merge.key,
            processed: outcome.processed,
            skipped: outcome.skipped,
        }
    }
}
