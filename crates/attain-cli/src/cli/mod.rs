pub mod args;
pub mod commands;

use tracing_subscriber::{fmt, EnvFilter};

/// Compact logs on stderr. `ATTAIN_LOG` overrides the level picked by
/// `--verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("ATTAIN_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
