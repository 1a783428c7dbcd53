//! Status enums for on-chain tasks and the local pipeline.

use serde::{Deserialize, Serialize};

/// On-chain status of a Task, derived from the stored record.
///
/// The ledger never persists a status field; a task is `Pending` exactly
/// while its `result` is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task created, result not yet written.
    #[default]
    Pending,
    /// Result stored on the ledger.
    Completed,
}

/// Pipeline stage names, used when a task fails locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Content generation by the processor.
    Processing,
    /// Writing the result back to the ledger.
    Submission,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Submission => write!(f, "submission"),
        }
    }
}

/// In-process pipeline state for a dispatched task.
///
/// Held only in memory for the process lifetime; the ledger remains the
/// single source of truth for persisted state. A `Failed` entry means the
/// task is still `Pending` on-chain and needs operator attention or a
/// replay after restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalState {
    /// Claimed by the listener, waiting for a worker slot.
    Dispatched,
    /// Processor is generating content.
    Processing,
    /// Result submitter is writing to the ledger.
    Submitting,
    /// Confirmed on the ledger.
    Completed,
    /// Retries exhausted at the given stage.
    Failed { stage: PipelineStage },
}

impl LocalState {
    /// Returns true if the pipeline is still making progress.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Dispatched | Self::Processing | Self::Submitting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(LocalState::Dispatched.is_active());
        assert!(LocalState::Submitting.is_active());
        assert!(!LocalState::Completed.is_active());
        assert!(!LocalState::Failed { stage: PipelineStage::Submission }.is_active());
    }
}
