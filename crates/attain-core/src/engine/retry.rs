use crate::errors::AttainError;
use crate::model::{ExtractedScript, ScriptImage};
use crate::providers::extractor::Extractor;
use tokio::time::{sleep, timeout, Duration};

#[derive(Debug, Clone)]
pub struct ExtractionPolicy {
    /// Upper bound for a single extraction call.
    pub timeout: Duration,
    /// Extra attempts after the first one fails.
    pub retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff: Duration,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl ExtractionPolicy {
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Calls the extractor with a per-attempt timeout, retrying failures with
/// exponential backoff. Returns the last error once attempts run out.
pub async fn extract_with_policy(
    extractor: &dyn Extractor,
    script: &ScriptImage,
    policy: &ExtractionPolicy,
) -> Result<ExtractedScript, AttainError> {
    let max_attempts = 1 + policy.retries;
    let mut last_error = String::new();

    for attempt in 0..max_attempts {
        if attempt > 0 {
            let wait = policy.backoff_for(attempt - 1);
            tracing::debug!(
                event = "extraction_retry",
                script = %script.file_name,
                attempt = attempt + 1,
                wait_ms = wait.as_millis() as u64
            );
            sleep(wait).await;
        }

        match timeout(policy.timeout, extractor.extract(script)).await {
            Ok(Ok(data)) => return Ok(data),
            Ok(Err(e)) => last_error = format!("{e:#}"),
            Err(_) => {
                last_error = format!("timed out after {}s", policy.timeout.as_secs_f64())
            }
        }

        tracing::debug!(
            event = "extraction_attempt_failed",
            script = %script.file_name,
            provider = extractor.provider_name(),
            attempt = attempt + 1,
            max_attempts,
            error = %last_error
        );
    }

    Err(AttainError::Extraction {
        script: script.file_name.clone(),
        reason: last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::extractor::ReplayExtractor;

    fn fast_policy(retries: u32) -> ExtractionPolicy {
        ExtractionPolicy {
            timeout: Duration::from_millis(200),
            retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles() {
        let p = ExtractionPolicy {
            backoff: Duration::from_millis(100),
            ..Default::default()
        };
        assert_eq!(p.backoff_for(0), Duration::from_millis(100));
        assert_eq!(p.backoff_for(1), Duration::from_millis(200));
        assert_eq!(p.backoff_for(3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let ex = ReplayExtractor::from_map([("a.png", "{}")]).with_transient_failures("a.png", 2);
        let script = ScriptImage::new("a.png", vec![]);
        assert!(extract_with_policy(&ex, &script, &fast_policy(2)).await.is_ok());
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let ex = ReplayExtractor::from_map([("a.png", "{}")]).with_transient_failures("a.png", 3);
        let script = ScriptImage::new("a.png", vec![]);
        let err = extract_with_policy(&ex, &script, &fast_policy(2))
            .await
            .unwrap_err();
        match err {
            AttainError::Extraction { script, reason } => {
                assert_eq!(script, "a.png");
                assert!(reason.contains("transient"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let ex = ReplayExtractor::from_map([("a.png", "{}")]).with_delay(Duration::from_secs(5));
        let script = ScriptImage::new("a.png", vec![]);
        let policy = ExtractionPolicy {
            timeout: Duration::from_millis(20),
            retries: 0,
            backoff: Duration::from_millis(1),
        };
        let err = extract_with_policy(&ex, &script, &policy).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
