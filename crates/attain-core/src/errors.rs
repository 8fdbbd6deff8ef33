use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttainError {
    /// Rubric is unusable (missing required columns, bad rows). Fatal to a batch.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request payload is missing or unreadable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// One script could not be extracted. Non-fatal inside a batch.
    #[error("extraction failed for {script}: {reason}")]
    Extraction { script: String, reason: String },

    #[error("no data extracted from uploaded scripts")]
    NoData,

    #[error("result table for {subject} is unreadable: {reason}")]
    StoreCorruption { subject: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AttainError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, AttainError::Configuration(_))
    }
}

impl From<rusqlite::Error> for AttainError {
    fn from(err: rusqlite::Error) -> Self {
        AttainError::Storage(err.to_string())
    }
}

pub type AttainResult<T> = Result<T, AttainError>;
