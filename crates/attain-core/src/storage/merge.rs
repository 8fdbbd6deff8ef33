use crate::model::ResultRecord;
use std::collections::HashSet;

/// Concatenates `existing` and `incoming` and drops every row whose
/// (register number, question number or summary slot) appears again later, so the newest
/// submission wins. Surviving rows keep their relative order.
pub fn merge_records(existing: Vec<ResultRecord>, incoming: Vec<ResultRecord>) -> Vec<ResultRecord> {
    let combined: Vec<ResultRecord> = existing.into_iter().chain(incoming).collect();

    let mut seen = HashSet::new();
    let mut kept: Vec<ResultRecord> = combined
        .into_iter()
        .rev()
        .filter(|r| seen.insert(r.dedupe_key()))
        .collect();
    kept.reverse();
    kept
}
