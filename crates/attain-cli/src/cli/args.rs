use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "attain",
    version,
    about = "CO/PO attainment from graded answer scripts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// Directory holding one result table per subject
    #[arg(long, global = true, env = "ATTAIN_RESULTS_DIR", default_value = "results")]
    pub results_dir: PathBuf,

    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract, aggregate and store a batch of scripts
    Process(ProcessArgs),
    /// Validate a rubric file and show how it was read
    Rubric(RubricArgs),
    /// List stored subjects
    List(ListArgs),
    /// Print a subject's result rows as JSON
    Show(ShowArgs),
    /// Delete every stored subject table
    Clear(ClearArgs),
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExtractorArg {
    Gemini,
    Replay,
}

#[derive(Parser, Clone)]
pub struct ProcessArgs {
    #[arg(long)]
    pub rubric: PathBuf,

    /// Answer-script images
    #[arg(required = true, num_args = 1..)]
    pub scripts: Vec<PathBuf>,

    #[arg(long, value_enum, env = "ATTAIN_EXTRACTOR", default_value = "gemini")]
    pub extractor: ExtractorArg,

    /// Directory of `<script file name>.json` replies (replay extractor)
    #[arg(long, env = "ATTAIN_REPLAY_DIR")]
    pub replay_dir: Option<PathBuf>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "ATTAIN_GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    pub gemini_model: String,

    #[arg(long, env = "ATTAIN_EXTRACTION_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, env = "ATTAIN_EXTRACTION_RETRIES", default_value_t = 2)]
    pub retries: u32,

    #[arg(long, env = "ATTAIN_RETRY_BACKOFF_MS", default_value_t = 500)]
    pub backoff_ms: u64,

    /// Print the outcome as JSON on stdout instead of the console summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct RubricArgs {
    pub file: PathBuf,
}

#[derive(Parser, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct ShowArgs {
    /// Subject key, or a case-insensitive prefix of one
    pub subject: String,
}

#[derive(Parser, Clone)]
pub struct ClearArgs {
    /// Confirm deletion
    #[arg(long)]
    pub yes: bool,
}
