use super::args::*;
use attain_core::storage::SqliteResultStore;
use attain_core::AttainError;
use std::path::Path;

pub mod process;
pub mod rubric;
pub mod subjects;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const BATCH_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let results_dir = cli.results_dir;
    match cli.cmd {
        Command::Process(args) => process::run(args, &results_dir).await,
        Command::Rubric(args) => rubric::run(args),
        Command::List(args) => subjects::cmd_list(args, &results_dir),
        Command::Show(args) => subjects::cmd_show(args, &results_dir),
        Command::Clear(args) => subjects::cmd_clear(args, &results_dir),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Reports `err` on stderr and picks the exit code for it.
pub fn report_error(err: &AttainError) -> i32 {
    eprintln!("error: {err}");
    match err {
        AttainError::Configuration(_) | AttainError::InvalidInput(_) => exit_codes::CONFIG_ERROR,
        _ => exit_codes::BATCH_FAILED,
    }
}

fn open_store(results_dir: &Path) -> Result<SqliteResultStore, AttainError> {
    SqliteResultStore::open(results_dir)
}
