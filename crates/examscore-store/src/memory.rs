//! In-memory attempt store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use examscore_core::model::{
    AnswerComment, AttemptRecordPatch, AttemptScoreRecord, Question, Submission,
};
use examscore_core::traits::AttemptStore;

use crate::error::StoreError;

/// A stored answer row, referencing its question by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub id: String,
    pub learner_id: String,
    pub exam_id: String,
    pub attempt_id: String,
    pub question_id: String,
    #[serde(default)]
    pub raw_answer: Option<serde_json::Value>,
}

/// A teacher comment tied to an attempt record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredComment {
    pub attempt_record_id: String,
    #[serde(flatten)]
    pub comment: AnswerComment,
}

#[derive(Default)]
struct State {
    questions: HashMap<String, Question>,
    submissions: Vec<StoredSubmission>,
    records: Vec<AttemptScoreRecord>,
    comments: Vec<StoredComment>,
}

/// An [`AttemptStore`] backed by process memory.
///
/// Keeps call counters so tests can check how the grading core used it, and
/// can inject a read delay or a failure.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    record_reads: AtomicU32,
    record_writes: AtomicU32,
    read_delay: Option<Duration>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long after loading a record, widening any race window
    /// between the read and the following write.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Fail every operation with [`StoreError::Unavailable`].
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> anyhow::Result<()> {
        match &self.failure {
            Some(message) => Err(StoreError::Unavailable(message.clone()).into()),
            None => Ok(()),
        }
    }

    pub fn insert_question(&self, question: Question) {
        self.state().questions.insert(question.id.clone(), question);
    }

    pub fn insert_submission(&self, submission: StoredSubmission) {
        self.state().submissions.push(submission);
    }

    /// Insert or replace a record.
    pub fn insert_record(&self, record: AttemptScoreRecord) {
        let mut state = self.state();
        match state.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => state.records.push(record),
        }
    }

    pub(crate) fn restore_comments(&self, comments: Vec<StoredComment>) {
        self.state().comments.extend(comments);
    }

    pub fn record(&self, attempt_record_id: &str) -> Option<AttemptScoreRecord> {
        self.state()
            .records
            .iter()
            .find(|r| r.id == attempt_record_id)
            .cloned()
    }

    pub fn questions(&self) -> Vec<Question> {
        let mut questions: Vec<_> = self.state().questions.values().cloned().collect();
        questions.sort_by(|a, b| a.id.cmp(&b.id));
        questions
    }

    pub fn submissions(&self) -> Vec<StoredSubmission> {
        self.state().submissions.clone()
    }

    pub fn records(&self) -> Vec<AttemptScoreRecord> {
        self.state().records.clone()
    }

    pub fn comments(&self) -> Vec<StoredComment> {
        self.state().comments.clone()
    }

    /// Number of record loads served.
    pub fn record_reads(&self) -> u32 {
        self.record_reads.load(Ordering::Relaxed)
    }

    /// Number of record updates applied.
    pub fn record_writes(&self) -> u32 {
        self.record_writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_attempt_submissions(
        &self,
        learner_id: &str,
        exam_id: &str,
        attempt_id: &str,
    ) -> anyhow::Result<Vec<Submission>> {
        self.check_available()?;
        let state = self.state();
        state
            .submissions
            .iter()
            .filter(|s| {
                s.learner_id == learner_id && s.exam_id == exam_id && s.attempt_id == attempt_id
            })
            .map(|s| {
                let question = state.questions.get(&s.question_id).ok_or_else(|| {
                    StoreError::UnknownQuestion {
                        submission_id: s.id.clone(),
                        question_id: s.question_id.clone(),
                    }
                })?;
                Ok(Submission {
                    id: s.id.clone(),
                    attempt_id: s.attempt_id.clone(),
                    question: question.clone(),
                    raw_answer: s.raw_answer.clone(),
                })
            })
            .collect()
    }

    async fn find_attempt_record(
        &self,
        attempt_record_id: &str,
    ) -> anyhow::Result<Option<AttemptScoreRecord>> {
        self.check_available()?;
        self.record_reads.fetch_add(1, Ordering::Relaxed);
        let record = self.record(attempt_record_id);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(record)
    }

    async fn update_attempt_record(
        &self,
        attempt_record_id: &str,
        patch: &AttemptRecordPatch,
    ) -> anyhow::Result<()> {
        self.check_available()?;
        let mut state = self.state();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == attempt_record_id)
            .ok_or_else(|| StoreError::RecordNotFound(attempt_record_id.to_string()))?;
        patch.apply_to(record);
        self.record_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn save_answer_comments(
        &self,
        attempt_record_id: &str,
        comments: &[AnswerComment],
    ) -> anyhow::Result<()> {
        self.check_available()?;
        let mut state = self.state();
        // A new batch replaces earlier comments on the same answers.
        state.comments.retain(|stored| {
            stored.attempt_record_id != attempt_record_id
                || !comments
                    .iter()
                    .any(|c| c.question_id == stored.comment.question_id)
        });
        state
            .comments
            .extend(comments.iter().cloned().map(|comment| StoredComment {
                attempt_record_id: attempt_record_id.to_string(),
                comment,
            }));
        Ok(())
    }
}
