//! File-backed result store: one SQLite database per subject, named
//! `{sanitized key}.sqlite`, each holding a single flat `results` table.

use super::merge::merge_records;
use super::rows::FlatRow;
use super::{sort_listings, MergeOutcome, ResultStore, SubjectListing, SubjectStatus, SubjectTable};
use crate::errors::{AttainError, AttainResult};
use crate::model::ResultRecord;
use crate::subject::{sanitize_key, split_key};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

pub const TABLE_EXTENSION: &str = "sqlite";

pub struct SqliteResultStore {
    dir: PathBuf,
    // merges hold it shared, clear holds it exclusively
    gate: RwLock<()>,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SqliteResultStore {
    pub fn open(dir: impl Into<PathBuf>) -> AttainResult<Self> {
        let store = Self::attach(dir);
        std::fs::create_dir_all(&store.dir)?;
        Ok(store)
    }

    /// Points at `dir` without touching the filesystem. A missing directory
    /// reads as an empty store; the first merge creates it.
    pub fn attach(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            gate: RwLock::new(()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{TABLE_EXTENSION}"))
    }

    fn key_lock(&self, key: &str) -> AttainResult<Arc<Mutex<()>>> {
        let mut locks = self.key_locks.lock().map_err(|_| poisoned())?;
        Ok(locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// `(file stem, path)` of every stored table, sorted by stem.
    fn table_files(&self) -> AttainResult<Vec<(String, PathBuf)>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((stem.to_string(), path.clone()));
            }
        }
        files.sort();
        Ok(files)
    }
}

fn poisoned() -> AttainError {
    AttainError::Storage("result store lock poisoned".into())
}

fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

pub fn read_table(path: &Path) -> Result<Vec<ResultRecord>, String> {
    let conn = open_read_only(path).map_err(|e| e.to_string())?;
    let mut stmt = conn
        .prepare(super::schema::SELECT_ALL)
        .map_err(|e| e.to_string())?;

    let rows = stmt
        .query_map([], |row| {
            Ok(FlatRow {
                register_number: row.get(0)?,
                course_code: row.get(1)?,
                course_title: row.get(2)?,
                semester: row.get(3)?,
                exam_date: row.get(4)?,
                invigilator_name: row.get(5)?,
                q_no: row.get(6)?,
                co: row.get(7)?,
                marks_awarded: row.get(8)?,
                summary_type: row.get(9)?,
                co_attainment: row.get(10)?,
                po_attainment: row.get(11)?,
            })
        })
        .map_err(|e| e.to_string())?;

    let mut records = Vec::new();
    for r in rows {
        let flat = r.map_err(|e| e.to_string())?;
        records.push(flat.into_record()?);
    }
    Ok(records)
}

fn probe_table(path: &Path) -> rusqlite::Result<()> {
    let conn = open_read_only(path)?;
    let mut stmt = conn.prepare(super::schema::PROBE)?;
    let mut rows = stmt.query([])?;
    rows.next()?;
    Ok(())
}

/// Writes `records` to a sibling temp file then renames it over `path`.
pub fn write_table(path: &Path, records: &[ResultRecord]) -> AttainResult<()> {
    let tmp = path.with_extension(format!("{TABLE_EXTENSION}.tmp"));
    if tmp.exists() {
        std::fs::remove_file(&tmp)?;
    }

    {
        let mut conn = Connection::open(&tmp)?;
        conn.execute_batch(super::schema::DDL)?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(super::schema::INSERT_ROW)?;
            for rec in records {
                let f = FlatRow::from_record(rec);
                stmt.execute(params![
                    f.register_number,
                    f.course_code,
                    f.course_title,
                    f.semester,
                    f.exam_date,
                    f.invigilator_name,
                    f.q_no,
                    f.co,
                    f.marks_awarded,
                    f.summary_type,
                    f.co_attainment,
                    f.po_attainment,
                ])?;
            }
        }
        tx.commit()?;
    }

    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn modified_rfc3339(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(chrono::DateTime::<chrono::Utc>::from(modified).to_rfc3339())
}

impl ResultStore for SqliteResultStore {
    fn merge(&self, subject_key: &str, rows: Vec<ResultRecord>) -> AttainResult<MergeOutcome> {
        let key = sanitize_key(subject_key);
        if key.is_empty() {
            return Err(AttainError::InvalidInput(format!(
                "subject key {subject_key:?} has no usable characters"
            )));
        }

        let _shared = self.gate.read().map_err(|_| poisoned())?;
        let lock = self.key_lock(&key)?;
        let _exclusive = lock.lock().map_err(|_| poisoned())?;

        let path = self.table_path(&key);
        let (existing, recovered) = if path.exists() {
            match read_table(&path) {
                Ok(existing) => (existing, false),
                Err(reason) => {
                    tracing::warn!(
                        event = "merge_fallback",
                        subject = %key,
                        path = %path.display(),
                        reason = %reason,
                        "could not merge existing results; replacing table"
                    );
                    (Vec::new(), true)
                }
            }
        } else {
            (Vec::new(), false)
        };

        let rows_before = existing.len();
        let merged = merge_records(existing, rows);
        std::fs::create_dir_all(&self.dir)?;
        write_table(&path, &merged)?;

        tracing::info!(
            event = "results_saved",
            subject = %key,
            path = %path.display(),
            rows_before,
            rows_after = merged.len()
        );

        Ok(MergeOutcome {
            key,
            rows_before,
            rows_after: merged.len(),
            recovered,
        })
    }

    fn list(&self) -> AttainResult<Vec<SubjectListing>> {
        let mut listings = Vec::new();
        for (stem, path) in self.table_files()? {
            let status = match probe_table(&path) {
                Ok(()) => SubjectStatus::Completed,
                Err(e) => {
                    tracing::warn!(
                        event = "corrupted_table",
                        file = %path.display(),
                        error = %e
                    );
                    SubjectStatus::Corrupted
                }
            };
            let (subject_code, subject_title) = split_key(&stem);
            listings.push(SubjectListing {
                subject_code,
                subject_title,
                updated_at: modified_rfc3339(&path),
                file_name: stem,
                status,
            });
        }
        sort_listings(&mut listings);
        Ok(listings)
    }

    fn fetch(&self, subject_name: &str) -> AttainResult<SubjectTable> {
        let safe = sanitize_key(subject_name);
        let exact = self.table_path(&safe);

        let found = if !safe.is_empty() && exact.is_file() {
            Some((safe, exact))
        } else {
            let needle = subject_name.trim().to_lowercase();
            if needle.is_empty() {
                None
            } else {
                self.table_files()?.into_iter().find(|(stem, _)| {
                    format!("{stem}.{TABLE_EXTENSION}")
                        .to_lowercase()
                        .starts_with(&needle)
                })
            }
        };

        let (key, path) = found.ok_or_else(|| {
            AttainError::NotFound(format!("no results file found for subject {subject_name:?}"))
        })?;

        let records = read_table(&path).map_err(|reason| {
            tracing::warn!(event = "fetch_failed", subject = %key, reason = %reason);
            AttainError::StoreCorruption {
                subject: key.clone(),
                reason,
            }
        })?;

        Ok(SubjectTable { key, records })
    }

    fn clear(&self) -> AttainResult<usize> {
        let _exclusive = self.gate.write().map_err(|_| poisoned())?;

        let mut deleted = 0;
        for (_, path) in self.table_files()? {
            std::fs::remove_file(&path)?;
            deleted += 1;
        }
        self.key_locks.lock().map_err(|_| poisoned())?.clear();

        tracing::info!(event = "results_cleared", deleted);
        Ok(deleted)
    }
}
