use super::{parse::parse_extraction, Extractor, EXTRACTION_PROMPT};
use crate::model::{ExtractedScript, ScriptImage};
use async_trait::async_trait;
use base64::Engine;
use serde_json::json;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiExtractor {
    pub model: String,
    pub api_key: String,
    pub endpoint: String,
    pub client: reqwest::Client,
}

impl GeminiExtractor {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            model,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// MIME type sent with the inline image; falls back to PNG for unknown
/// extensions.
pub fn image_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE || m.essence_str() == "application/pdf")
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "image/png".to_string())
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(&self, script: &ScriptImage) -> anyhow::Result<ExtractedScript> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );

        let data = base64::engine::general_purpose::STANDARD.encode(&script.bytes);
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "inline_data": { "mime_type": image_mime_type(&script.file_name), "data": data } },
                    { "text": EXTRACTION_PROMPT }
                ]
            }],
            "generationConfig": { "temperature": 0.0 }
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json().await?;

        let text = json
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Gemini API response missing content"))?;

        tracing::debug!(
            event = "extraction_reply",
            script = %script.file_name,
            model = %self.model,
            chars = text.len()
        );

        parse_extraction(text)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
