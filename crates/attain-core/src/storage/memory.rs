use super::merge::merge_records;
use super::{sort_listings, MergeOutcome, ResultStore, SubjectListing, SubjectStatus, SubjectTable};
use crate::errors::{AttainError, AttainResult};
use crate::model::ResultRecord;
use crate::subject::{sanitize_key, split_key};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// In-process `ResultStore`. Tables marked corrupted behave like unreadable
/// files: `list` reports them, `fetch` fails, `merge` replaces them.
#[derive(Default)]
pub struct MemoryResultStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: BTreeMap<String, Vec<ResultRecord>>,
    corrupted: BTreeSet<String>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_corrupted(&self, key: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            let key = sanitize_key(key);
            inner.tables.entry(key.clone()).or_default();
            inner.corrupted.insert(key);
        }
    }

    fn lock(&self) -> AttainResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AttainError::Storage("memory store lock poisoned".into()))
    }
}

impl ResultStore for MemoryResultStore {
    fn merge(&self, subject_key: &str, rows: Vec<ResultRecord>) -> AttainResult<MergeOutcome> {
        let key = sanitize_key(subject_key);
        if key.is_empty() {
            return Err(AttainError::InvalidInput(format!(
                "subject key {subject_key:?} has no usable characters"
            )));
        }

        let mut inner = self.lock()?;
        let recovered = inner.corrupted.remove(&key);
        let existing = if recovered {
            Vec::new()
        } else {
            inner.tables.remove(&key).unwrap_or_default()
        };
        let rows_before = existing.len();
        let merged = merge_records(existing, rows);
        let rows_after = merged.len();
        inner.tables.insert(key.clone(), merged);

        Ok(MergeOutcome {
            key,
            rows_before,
            rows_after,
            recovered,
        })
    }

    fn list(&self) -> AttainResult<Vec<SubjectListing>> {
        let inner = self.lock()?;
        let mut listings: Vec<SubjectListing> = inner
            .tables
            .keys()
            .map(|key| {
                let (subject_code, subject_title) = split_key(key);
                SubjectListing {
                    subject_code,
                    subject_title,
                    file_name: key.clone(),
                    status: if inner.corrupted.contains(key) {
                        SubjectStatus::Corrupted
                    } else {
                        SubjectStatus::Completed
                    },
                    updated_at: None,
                }
            })
            .collect();
        sort_listings(&mut listings);
        Ok(listings)
    }

    fn fetch(&self, subject_name: &str) -> AttainResult<SubjectTable> {
        let inner = self.lock()?;
        let safe = sanitize_key(subject_name);
        let needle = subject_name.trim().to_lowercase();

        let found = if inner.tables.contains_key(&safe) {
            Some(safe)
        } else if needle.is_empty() {
            None
        } else {
            inner
                .tables
                .keys()
                .find(|k| k.to_lowercase().starts_with(&needle))
                .cloned()
        };
        let key = found.ok_or_else(|| {
            AttainError::NotFound(format!("no results file found for subject {subject_name:?}"))
        })?;

        if inner.corrupted.contains(&key) {
            return Err(AttainError::StoreCorruption {
                subject: key,
                reason: "table marked corrupted".into(),
            });
        }

        Ok(SubjectTable {
            records: inner.tables.get(&key).cloned().unwrap_or_default(),
            key,
        })
    }

    fn clear(&self) -> AttainResult<usize> {
        let mut inner = self.lock()?;
        let deleted = inner.tables.len();
        inner.tables.clear();
        inner.corrupted.clear();
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExamMetadata, MarkRecord};

    fn mark(reg: &str, q: &str) -> ResultRecord {
        ResultRecord::Mark(MarkRecord {
            metadata: ExamMetadata {
                register_number: reg.into(),
                ..Default::default()
            },
            question_no: q.into(),
            co: "CO1".into(),
            marks_awarded: Some(1.0),
        })
    }

    #[test]
    fn behaves_like_a_store() {
        let store = MemoryResultStore::new();
        store.merge("cs101_data", vec![mark("R1", "1")]).unwrap();
        store.merge("cs101_data", vec![mark("R1", "1"), mark("R1", "2")]).unwrap();

        let table = store.fetch("CS101_DATA").unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(store.fetch("cs101").unwrap().key, "CS101_DATA");
        assert!(matches!(store.fetch("ma"), Err(AttainError::NotFound(_))));

        let listed = store.list().unwrap();
        assert_eq!(listed[0].subject_code, "CS101");
        assert_eq!(listed[0].subject_title, "DATA");
        assert_eq!(store.clear().unwrap(), 1);
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn corrupted_tables_are_replaced_on_merge() {
        let store = MemoryResultStore::new();
        store.mark_corrupted("X_Y");
        assert_eq!(store.list().unwrap()[0].status, SubjectStatus::Corrupted);
        assert!(matches!(
            store.fetch("X_Y"),
            Err(AttainError::StoreCorruption { .. })
        ));

        let outcome = store.merge("X_Y", vec![mark("R1", "1")]).unwrap();
        assert!(outcome.recovered);
        assert_eq!(store.fetch("X_Y").unwrap().records.len(), 1);
    }
}
