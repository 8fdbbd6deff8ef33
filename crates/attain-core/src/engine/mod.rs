pub mod batch;
pub mod retry;

pub use batch::{BatchOutcome, BatchProcessor, ScriptAttainment, SkippedScript};
pub use retry::ExtractionPolicy;
