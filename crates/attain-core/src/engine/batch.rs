use super::retry::{extract_with_policy, ExtractionPolicy};
use crate::attainment::{aggregate, Attainment};
use crate::errors::{AttainError, AttainResult};
use crate::model::{
    ExtractedScript, MarkRecord, ResultRecord, ScriptImage, SummaryRecord, SUMMARY_TYPE_CO_PO,
};
use crate::providers::extractor::Extractor;
use crate::rubric::Rubric;
use crate::storage::{MergeOutcome, ResultStore};
use crate::subject::{SubjectInfo, SubjectSeed};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ScriptAttainment {
    pub file_name: String,
    pub register_number: String,
    pub attainment: Attainment,
    /// Question numbers read off the script that the rubric does not list.
    pub unmatched_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedScript {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub subject: SubjectInfo,
    pub merge: MergeOutcome,
    pub submitted: usize,
    pub processed: usize,
    pub skipped: Vec<SkippedScript>,
    pub scripts: Vec<ScriptAttainment>,
}

impl BatchOutcome {
    pub fn message(&self) -> String {
        if self.skipped.is_empty() {
            format!("{} script(s) processed successfully.", self.processed)
        } else {
            format!(
                "{} script(s) processed successfully, {} skipped.",
                self.processed,
                self.skipped.len()
            )
        }
    }
}

/// Runs one upload: every script is extracted and aggregated in turn, then
/// all rows are merged into the subject's table in a single write.
pub struct BatchProcessor {
    pub extractor: Arc<dyn Extractor>,
    pub store: Arc<dyn ResultStore>,
    pub policy: ExtractionPolicy,
}

impl BatchProcessor {
    pub fn new(extractor: Arc<dyn Extractor>, store: Arc<dyn ResultStore>) -> Self {
        Self {
            extractor,
            store,
            policy: ExtractionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn process(
        &self,
        rubric: &Rubric,
        scripts: Vec<ScriptImage>,
    ) -> AttainResult<BatchOutcome> {
        if scripts.is_empty() {
            return Err(AttainError::InvalidInput("no script files submitted".into()));
        }

        let submitted = scripts.len();
        let mut seed = SubjectSeed::default();
        let mut records = Vec::new();
        let mut skipped = Vec::new();
        let mut processed = Vec::new();

        for script in &scripts {
            tracing::info!(
                event = "script_processing",
                script = %script.file_name,
                bytes = script.bytes.len()
            );

            let extracted = extract_with_policy(self.extractor.as_ref(), script, &self.policy)
                .await
                .and_then(|d| {
                    if d.is_empty() {
                        Err(AttainError::Extraction {
                            script: script.file_name.clone(),
                            reason: "no data extracted".into(),
                        })
                    } else {
                        Ok(d)
                    }
                });

            let data = match extracted {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(
                        event = "script_skipped",
                        script = %script.file_name,
                        provider = self.extractor.provider_name(),
                        error = %e
                    );
                    skipped.push(SkippedScript {
                        file_name: script.file_name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            seed.observe(&data.metadata.course_title, &data.metadata.course_code);

            let attainment = aggregate(rubric, &data.marks);
            let unmatched_questions = data
                .marks
                .iter()
                .filter(|m| rubric.row(&m.question_no).is_none())
                .map(|m| m.question_no.clone())
                .collect::<Vec<_>>();

            if !unmatched_questions.is_empty() {
                tracing::debug!(
                    event = "unmatched_questions",
                    script = %script.file_name,
                    questions = ?unmatched_questions
                );
            }

            records.extend(script_records(&data, &attainment));
            processed.push(ScriptAttainment {
                file_name: script.file_name.clone(),
                register_number: data.metadata.register_number.clone(),
                attainment,
                unmatched_questions,
            });
        }

        if processed.is_empty() {
            return Err(AttainError::NoData);
        }

        let subject = seed.resolve();
        tracing::info!(
            event = "subject_resolved",
            code = %subject.code,
            title = %subject.title,
            key = %subject.key
        );

        let merge = self.merge(&subject.key, records).await?;

        tracing::info!(
            event = "batch_done",
            subject = %merge.key,
            submitted,
            processed = processed.len(),
            skipped = skipped.len(),
            rows_after = merge.rows_after
        );

        Ok(BatchOutcome {
            subject,
            merge,
            submitted,
            processed: processed.len(),
            skipped,
            scripts: processed,
        })
    }

    /// The store does file IO and may wait on a per-subject lock, so it runs
    /// on the blocking pool.
    async fn merge(&self, key: &str, records: Vec<ResultRecord>) -> AttainResult<MergeOutcome> {
        let store = self.store.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || store.merge(&key, records))
            .await
            .map_err(|e| AttainError::Storage(format!("merge task failed: {e}")))?
    }
}

/// One mark row per extracted question (matched or not) followed by the
/// script's attainment summary row.
pub fn script_records(data: &ExtractedScript, attainment: &Attainment) -> Vec<ResultRecord> {
    let mut out: Vec<ResultRecord> = data
        .marks
        .iter()
        .map(|m| {
            ResultRecord::Mark(MarkRecord {
                metadata: data.metadata.clone(),
                question_no: m.question_no.clone(),
                co: m.co.clone(),
                marks_awarded: Some(m.marks_awarded),
            })
        })
        .collect();

    out.push(ResultRecord::Summary(SummaryRecord {
        metadata: data.metadata.clone(),
        summary_type: SUMMARY_TYPE_CO_PO.to_string(),
        co_attainment: attainment.co.clone(),
        po_attainment: attainment.po.clone(),
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExamMetadata, ScriptMarkRow};

    #[test]
    fn records_include_unmatched_rows_and_summary() {
        let data = ExtractedScript {
            metadata: ExamMetadata {
                register_number: "R1".into(),
                ..Default::default()
            },
            marks: vec![
                ScriptMarkRow::new("1", "CO1", 4.0),
                ScriptMarkRow::new("42", "CO9", 1.0),
            ],
        };
        let recs = script_records(&data, &Attainment::default());
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[1].question_no(), "42");
        assert!(matches!(recs[2], ResultRecord::Summary(_)));
    }

    #[test]
    fn message_mentions_skips() {
        let outcome = BatchOutcome {
            subject: crate::subject::resolve_subject(None, None),
            merge: MergeOutcome {
                key: "K".into(),
                rows_before: 0,
                rows_after: 0,
                recovered: false,
            },
            submitted: 3,
            processed: 2,
            skipped: vec![SkippedScript {
                file_name: "c.png".into(),
                reason: "x".into(),
            }],
            scripts: vec![],
        };
        assert_eq!(outcome.message(), "2 script(s) processed successfully, 1 skipped.");
    }
}
