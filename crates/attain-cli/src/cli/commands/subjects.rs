use super::{exit_codes, report_error};
use crate::cli::args::{ClearArgs, ListArgs, ShowArgs};
use attain_core::report::console;
use attain_core::storage::{ResultStore, SqliteResultStore};
use std::path::Path;

pub fn cmd_list(args: ListArgs, results_dir: &Path) -> anyhow::Result<i32> {
    let listings = match SqliteResultStore::attach(results_dir).list() {
        Ok(l) => l,
        Err(e) => return Ok(report_error(&e)),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
    } else {
        console::print_listings(&listings);
    }
    Ok(exit_codes::OK)
}

pub fn cmd_show(args: ShowArgs, results_dir: &Path) -> anyhow::Result<i32> {
    let table = match SqliteResultStore::attach(results_dir).fetch(&args.subject) {
        Ok(t) => t,
        Err(e) => return Ok(report_error(&e)),
    };
    println!("{}", serde_json::to_string_pretty(&table.to_rows())?);
    Ok(exit_codes::OK)
}

pub fn cmd_clear(args: ClearArgs, results_dir: &Path) -> anyhow::Result<i32> {
    if !args.yes {
        eprintln!(
            "refusing to delete every table in {} without --yes",
            results_dir.display()
        );
        return Ok(exit_codes::CONFIG_ERROR);
    }
    match SqliteResultStore::attach(results_dir).clear() {
        Ok(deleted) => {
            eprintln!("deleted {deleted} subject table(s)");
            Ok(exit_codes::OK)
        }
        Err(e) => Ok(report_error(&e)),
    }
}
