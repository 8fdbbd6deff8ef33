use attain_core::engine::ExtractionPolicy;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Gemini,
    Replay,
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "replay" => Ok(Self::Replay),
            other => Err(format!("unknown extractor {other:?} (expected gemini or replay)")),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub results_dir: PathBuf,
    pub extractor: ExtractorKind,
    pub replay_dir: Option<PathBuf>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub extraction_timeout_secs: u64,
    pub extraction_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_upload_bytes: usize,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            results_dir: PathBuf::from("results"),
            extractor: ExtractorKind::Gemini,
            replay_dir: None,
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            extraction_timeout_secs: 60,
            extraction_retries: 2,
            retry_backoff_ms: 500,
            max_upload_bytes: 25 * 1024 * 1024,
            cors_origins: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: ServerConfig,
    /// Keys in the YAML file that no field consumed.
    pub ignored_keys: BTreeSet<String>,
}

impl ServerConfig {
    /// Defaults, then the optional YAML file, then the process environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<LoadedConfig> {
        let mut loaded = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => LoadedConfig::default(),
        };
        loaded.config.apply_env(|key| std::env::var(key).ok());
        loaded.config.validate()?;
        Ok(loaded)
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<LoadedConfig> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        Self::from_yaml_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse config {}: {}", path.display(), e))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<LoadedConfig> {
        let mut ignored_keys = BTreeSet::new();
        let deserializer = serde_yaml::Deserializer::from_str(raw);
        let config: ServerConfig = serde_ignored::deserialize(deserializer, |path| {
            ignored_keys.insert(path.to_string());
        })?;
        Ok(LoadedConfig {
            config,
            ignored_keys,
        })
    }

    /// Overlays values from `lookup`; values that fail to parse are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ATTAIN_HOST") {
            self.host = v;
        }
        if let Some(n) = lookup("ATTAIN_PORT").and_then(|v| v.parse().ok()) {
            self.port = n;
        }
        if let Some(v) = lookup("ATTAIN_RESULTS_DIR") {
            self.results_dir = PathBuf::from(v);
        }
        if let Some(k) = lookup("ATTAIN_EXTRACTOR").and_then(|v| v.parse().ok()) {
            self.extractor = k;
        }
        if let Some(v) = lookup("ATTAIN_REPLAY_DIR") {
            self.replay_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = lookup("ATTAIN_GEMINI_MODEL") {
            self.gemini_model = v;
        }
        if let Some(n) = lookup("ATTAIN_EXTRACTION_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.extraction_timeout_secs = n;
        }
        if let Some(n) = lookup("ATTAIN_EXTRACTION_RETRIES").and_then(|v| v.parse().ok()) {
            self.extraction_retries = n;
        }
        if let Some(n) = lookup("ATTAIN_RETRY_BACKOFF_MS").and_then(|v| v.parse().ok()) {
            self.retry_backoff_ms = n;
        }
        if let Some(n) = lookup("ATTAIN_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            self.max_upload_bytes = n;
        }
        if let Some(v) = lookup("ATTAIN_CORS_ORIGINS") {
            self.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("ATTAIN_LOG") {
            self.log_level = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.extractor {
            ExtractorKind::Gemini if self.gemini_api_key.is_none() => {
                anyhow::bail!("the gemini extractor needs GEMINI_API_KEY (or gemini_api_key)")
            }
            ExtractorKind::Replay if self.replay_dir.is_none() => {
                anyhow::bail!("the replay extractor needs ATTAIN_REPLAY_DIR (or replay_dir)")
            }
            _ => {}
        }
        if self.extraction_timeout_secs == 0 {
            anyhow::bail!("extraction_timeout_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn extraction_policy(&self) -> ExtractionPolicy {
        ExtractionPolicy {
            timeout: Duration::from_secs(self.extraction_timeout_secs),
            retries: self.extraction_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}
