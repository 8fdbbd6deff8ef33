pub mod attainment;
pub mod engine;
pub mod errors;
pub mod model;
pub mod providers;
pub mod report;
pub mod rubric;
pub mod storage;
pub mod subject;

pub use errors::{AttainError, AttainResult};
