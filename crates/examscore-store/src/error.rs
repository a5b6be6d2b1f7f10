//! Store error types.

use thiserror::Error;

/// Errors raised by the bundled stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A submission references a question the store does not know.
    #[error("submission {submission_id} references unknown question {question_id}")]
    UnknownQuestion {
        submission_id: String,
        question_id: String,
    },

    /// An update targeted a record that does not exist.
    #[error("attempt record not found: {0}")]
    RecordNotFound(String),

    /// Injected failure, used to exercise error propagation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
