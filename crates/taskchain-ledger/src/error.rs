//! Ledger errors.

use taskchain_core::TaskId;
use thiserror::Error;

/// Errors returned by ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// `complete_task` was called for an id the ledger never assigned.
    #[error("Task does not exist: {0}")]
    UnknownTask(TaskId),

    /// `create_task` was called with an empty topic.
    #[error("Topic must be non-empty")]
    EmptyTopic,

    /// The transaction was accepted but confirmation never arrived.
    #[error("Transaction confirmation timed out")]
    ConfirmationTimeout,

    /// The transaction was rejected by the ledger.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Transport-level failure talking to the ledger endpoint.
    #[error("Ledger transport error: {0}")]
    Transport(String),
}

impl LedgerError {
    /// Returns true if the operation may succeed on a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConfirmationTimeout | Self::Rejected(_) | Self::Transport(_)
        )
    }
}
