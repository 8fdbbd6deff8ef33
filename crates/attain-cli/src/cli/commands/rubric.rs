use super::{exit_codes, report_error};
use crate::cli::args::RubricArgs;
use attain_core::report::console;
use attain_core::rubric::Rubric;

pub fn run(args: RubricArgs) -> anyhow::Result<i32> {
    let bytes = std::fs::read(&args.file)
        .map_err(|e| anyhow::anyhow!("failed to read rubric {}: {}", args.file.display(), e))?;
    let name = file_name(&args.file);

    match Rubric::load(&name, &bytes) {
        Ok(rubric) => {
            console::print_rubric(&rubric);
            Ok(exit_codes::OK)
        }
        Err(e) => Ok(report_error(&e)),
    }
}

pub(super) fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
