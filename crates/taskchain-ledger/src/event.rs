//! Notifications emitted by the ledger.

use serde::{Deserialize, Serialize};
use taskchain_core::TaskId;

/// A notification emitted when a ledger write is confirmed.
///
/// Delivery to subscribers is at-least-once and may lag under load;
/// consumers de-duplicate by task id. `events_since` replays the confirmed
/// history for reconciliation after a dropped subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A task was recorded by `create_task`.
    TaskCreated {
        id: TaskId,
        topic: String,
        requester: String,
        block: u64,
    },

    /// A result was stored by `complete_task`.
    TaskCompleted {
        id: TaskId,
        result: String,
        block: u64,
    },
}

impl LedgerEvent {
    /// The task this event concerns.
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::TaskCreated { id, .. } | Self::TaskCompleted { id, .. } => *id,
        }
    }

    /// The block in which the write was confirmed.
    pub fn block(&self) -> u64 {
        match self {
            Self::TaskCreated { block, .. } | Self::TaskCompleted { block, .. } => *block,
        }
    }
}
