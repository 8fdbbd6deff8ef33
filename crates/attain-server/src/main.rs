use anyhow::Result;
use attain_server::config::ServerConfig;
use attain_server::logging::init_logging;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML file overlaid on the built-in defaults; env vars still win.
    #[arg(long, env = "ATTAIN_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // .env has to be in the environment before the config reads it
    let dotenv = dotenvy::dotenv().ok();
    let loaded = ServerConfig::load(args.config.as_deref())?;

    init_logging(&loaded.config.log_level);

    if let Some(path) = dotenv {
        tracing::debug!(event = "dotenv_loaded", path = %path.display());
    }
    if !loaded.ignored_keys.is_empty() {
        tracing::warn!(
            event = "config_unknown_keys",
            keys = ?loaded.ignored_keys,
            "ignoring unknown config keys"
        );
    }

    let cfg = loaded.config;
    tracing::info!(
        event = "server_start",
        bind = %cfg.bind_addr(),
        results_dir = %cfg.results_dir.display(),
        extractor = ?cfg.extractor,
        model = %cfg.gemini_model,
        timeout_secs = cfg.extraction_timeout_secs,
        retries = cfg.extraction_retries,
        max_upload_bytes = cfg.max_upload_bytes
    );

    attain_server::run(cfg).await
}
