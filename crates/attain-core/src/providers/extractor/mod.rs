use crate::model::{ExtractedScript, ScriptImage};
use async_trait::async_trait;

pub mod gemini;
pub mod parse;
pub mod replay;

pub use gemini::GeminiExtractor;
pub use replay::ReplayExtractor;

/// Reads exam metadata and the marks table off one answer-script image.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, script: &ScriptImage) -> anyhow::Result<ExtractedScript>;
    fn provider_name(&self) -> &'static str;
}

pub const EXTRACTION_PROMPT: &str = r#"You are an OCR assistant.
From this exam image extract:
- Register Number
- Course Code
- Course Title
- Semester
- Exam Date
- Invigilator Name
- Marks Table (Q.No, CO, Marks Awarded)
Return only valid JSON like:
{
  "Register Number": "...",
  "Course Code": "...",
  "Course Title": "...",
  "Semester": "...",
  "Exam Date": "...",
  "Invigilator Name": "...",
  "Marks": [{"Q.No": "...", "CO": "...", "Marks Awarded": "..."}]
}
"#;
