//! Persistence collaborator trait.
//!
//! The grading core never talks to storage directly; it goes through an
//! [`AttemptStore`], implemented by `examscore-store` or by the host
//! application's database layer.

use async_trait::async_trait;

use crate::model::{AnswerComment, AttemptRecordPatch, AttemptScoreRecord, Submission};

/// Storage of submissions and attempt score records.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Human-readable store name (e.g. "memory").
    fn name(&self) -> &str;

    /// All submissions of a learner for one exam attempt, each joined with
    /// its question. Order is storage order.
    async fn find_attempt_submissions(
        &self,
        learner_id: &str,
        exam_id: &str,
        attempt_id: &str,
    ) -> anyhow::Result<Vec<Submission>>;

    /// Load an attempt score record.
    async fn find_attempt_record(
        &self,
        attempt_record_id: &str,
    ) -> anyhow::Result<Option<AttemptScoreRecord>>;

    /// Write the patched fields of an attempt score record.
    async fn update_attempt_record(
        &self,
        attempt_record_id: &str,
        patch: &AttemptRecordPatch,
    ) -> anyhow::Result<()>;

    /// Persist teacher comments on individual answers, replacing any earlier
    /// comments on the same questions of this record.
    async fn save_answer_comments(
        &self,
        attempt_record_id: &str,
        comments: &[AnswerComment],
    ) -> anyhow::Result<()>;
}
