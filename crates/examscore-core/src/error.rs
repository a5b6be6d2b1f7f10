//! Grading error types.
//!
//! These errors are surfaced by the grading service to its caller (a thin
//! request handler). Persistence failures are carried through unchanged in
//! [`GradingError::Store`] so the caller can inspect the original cause.

use thiserror::Error;

use crate::model::{QuestionKind, Skill};

/// Errors that can occur while normalizing, scoring, or persisting scores.
#[derive(Debug, Error)]
pub enum GradingError {
    /// A structured submission could not be parsed for its question kind.
    #[error("malformed {kind} answer: {reason}")]
    MalformedAnswer { kind: QuestionKind, reason: String },

    /// The learner has no submissions at all for the exam attempt.
    #[error("no submissions found for learner {learner_id} in exam {exam_id} (attempt {attempt_id})")]
    NoSubmissionsFound {
        learner_id: String,
        exam_id: String,
        attempt_id: String,
    },

    /// The attempt score record does not exist.
    #[error("participant not found: {0}")]
    ParticipantNotFound(String),

    /// The skill is not valid for the requested operation.
    #[error("invalid skill for this operation: {0}")]
    InvalidSkill(Skill),

    /// A manual score outside the accepted range.
    #[error("invalid score {score}: must be between {min} and {max}")]
    InvalidScore { score: f64, min: f64, max: f64 },

    /// An error from the persistence collaborator, propagated unchanged.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl GradingError {
    /// Returns `true` if this error is an input validation failure raised
    /// before any computation happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GradingError::InvalidSkill(_) | GradingError::InvalidScore { .. }
        )
    }

    /// HTTP status code the request layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            GradingError::MalformedAnswer { .. }
            | GradingError::InvalidSkill(_)
            | GradingError::InvalidScore { .. } => 400,
            GradingError::NoSubmissionsFound { .. } | GradingError::ParticipantNotFound(_) => 404,
            GradingError::Store(_) => 500,
        }
    }
}
