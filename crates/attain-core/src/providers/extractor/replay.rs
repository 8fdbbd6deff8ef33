//! Replays recorded extraction replies instead of calling a model.
//!
//! Replies are looked up by script file name, either from an in-memory map or
//! from `<dir>/<script file name>.json`. The stored text goes through the
//! same parsing as a live reply.

use super::{parse::parse_extraction, Extractor};
use crate::model::{ExtractedScript, ScriptImage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

enum Source {
    Dir(PathBuf),
    Map(HashMap<String, String>),
}

pub struct ReplayExtractor {
    source: Source,
    delay: Option<Duration>,
    transient_failures: Mutex<HashMap<String, u32>>,
}

impl ReplayExtractor {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::with_source(Source::Dir(dir.into()))
    }

    pub fn from_map<K, V>(replies: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = replies
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::with_source(Source::Map(map))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            delay: None,
            transient_failures: Mutex::new(HashMap::new()),
        }
    }

    /// Sleeps before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails the first `count` calls for `file_name` before replying.
    pub fn with_transient_failures(self, file_name: impl Into<String>, count: u32) -> Self {
        if let Ok(mut m) = self.transient_failures.lock() {
            m.insert(file_name.into(), count);
        }
        self
    }

    fn reply_for(&self, file_name: &str) -> anyhow::Result<String> {
        match &self.source {
            Source::Map(map) => map
                .get(file_name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no recorded reply for {}", file_name)),
            Source::Dir(dir) => {
                let path = dir.join(format!("{file_name}.json"));
                std::fs::read_to_string(&path).map_err(|e| {
                    anyhow::anyhow!("no recorded reply at {}: {}", path.display(), e)
                })
            }
        }
    }
}

#[async_trait]
impl Extractor for ReplayExtractor {
    async fn extract(&self, script: &ScriptImage) -> anyhow::Result<ExtractedScript> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        {
            let mut pending = self
                .transient_failures
                .lock()
                .map_err(|_| anyhow::anyhow!("replay state poisoned"))?;
            if let Some(n) = pending.get_mut(&script.file_name) {
                if *n > 0 {
                    *n -= 1;
                    anyhow::bail!("transient replay failure for {}", script.file_name);
                }
            }
        }

        let text = self.reply_for(&script.file_name)?;
        parse_extraction(&text)
    }

    fn provider_name(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> ScriptImage {
        ScriptImage::new(name, vec![0u8; 4])
    }

    #[tokio::test]
    async fn map_replies_are_parsed() {
        let ex = ReplayExtractor::from_map([("a.png", r#"{"Register Number": "R1"}"#)]);
        let script = ex.extract(&image("a.png")).await.unwrap();
        assert_eq!(script.metadata.register_number, "R1");
        assert!(ex.extract(&image("b.png")).await.is_err());
    }

    #[tokio::test]
    async fn dir_replies_use_sidecar_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("s1.jpg.json"),
            r#"{"Register Number": "R2", "Marks": []}"#,
        )
        .unwrap();
        let ex = ReplayExtractor::from_dir(dir.path());
        let script = ex.extract(&image("s1.jpg")).await.unwrap();
        assert_eq!(script.metadata.register_number, "R2");
        let err = ex.extract(&image("s2.jpg")).await.unwrap_err();
        assert!(err.to_string().contains("no recorded reply"));
    }

    #[tokio::test]
    async fn transient_failures_run_out() {
        let ex = ReplayExtractor::from_map([("a.png", "{}")]).with_transient_failures("a.png", 2);
        assert!(ex.extract(&image("a.png")).await.is_err());
        assert!(ex.extract(&image("a.png")).await.is_err());
        assert!(ex.extract(&image("a.png")).await.is_ok());
    }
}
