use super::rubric::file_name;
use super::{exit_codes, open_store, report_error};
use crate::cli::args::{ExtractorArg, ProcessArgs};
use attain_core::engine::{BatchProcessor, ExtractionPolicy};
use attain_core::model::ScriptImage;
use attain_core::providers::extractor::{Extractor, GeminiExtractor, ReplayExtractor};
use attain_core::report::console;
use attain_core::rubric::Rubric;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(args: ProcessArgs, results_dir: &Path) -> anyhow::Result<i32> {
    let extractor = match build_extractor(&args) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let rubric_bytes = std::fs::read(&args.rubric)
        .map_err(|e| anyhow::anyhow!("failed to read rubric {}: {}", args.rubric.display(), e))?;
    let rubric = match Rubric::load(&file_name(&args.rubric), &rubric_bytes) {
        Ok(r) => r,
        Err(e) => return Ok(report_error(&e)),
    };

    let mut scripts = Vec::with_capacity(args.scripts.len());
    for path in &args.scripts {
        let bytes = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("failed to read script {}: {}", path.display(), e))?;
        scripts.push(ScriptImage::new(file_name(path), bytes));
    }

    let store = match open_store(results_dir) {
        Ok(s) => s,
        Err(e) => return Ok(report_error(&e)),
    };
    let policy = ExtractionPolicy {
        timeout: Duration::from_secs(args.timeout_secs),
        retries: args.retries,
        backoff: Duration::from_millis(args.backoff_ms),
    };
    let processor = BatchProcessor::new(extractor, Arc::new(store)).with_policy(policy);

    match processor.process(&rubric, scripts).await {
        Ok(outcome) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                console::print_outcome(&outcome);
            }
            Ok(exit_codes::OK)
        }
        Err(e) => Ok(report_error(&e)),
    }
}

fn build_extractor(args: &ProcessArgs) -> anyhow::Result<Arc<dyn Extractor>> {
    match args.extractor {
        ExtractorArg::Gemini => {
            let key = args
                .gemini_api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    anyhow::anyhow!("the gemini extractor needs --gemini-api-key or GEMINI_API_KEY")
                })?;
            Ok(Arc::new(GeminiExtractor::new(args.gemini_model.clone(), key)))
        }
        ExtractorArg::Replay => {
            let dir = args.replay_dir.clone().ok_or_else(|| {
                anyhow::anyhow!("the replay extractor needs --replay-dir or ATTAIN_REPLAY_DIR")
            })?;
            Ok(Arc::new(ReplayExtractor::from_dir(dir)))
        }
    }
}
