//! The ledger client trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use taskchain_core::{Task, TaskId};

use crate::error::LedgerError;
use crate::event::LedgerEvent;

/// Receipt for a confirmed ledger write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash, `0x`-prefixed hex.
    pub tx_hash: String,

    /// Block in which the write was confirmed.
    pub block: u64,

    /// When confirmation was observed.
    pub confirmed_at: DateTime<Utc>,
}

/// Client for the append-only task ledger.
///
/// Writes are totally ordered and durable once a receipt is returned, but
/// there is no atomicity across separate calls: `get_task` followed by
/// `complete_task` is a check-then-act, not a compare-and-swap. The
/// connection is shared across components and must tolerate concurrent
/// calls.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Record a new task. Assigns the next dense id and emits
    /// [`LedgerEvent::TaskCreated`] once confirmed.
    async fn create_task(&self, topic: &str, requester: &str) -> Result<TxReceipt, LedgerError>;

    /// Store a result for `id` and emit [`LedgerEvent::TaskCompleted`].
    ///
    /// Fails with [`LedgerError::UnknownTask`] if `id` is zero or was never
    /// assigned. Deliberately permissive about an already-completed task:
    /// a second call overwrites the stored result. Callers are expected to
    /// guard with a `get_task` idempotency check rather than rely on the
    /// ledger to refuse the write.
    async fn complete_task(&self, id: TaskId, result: &str) -> Result<TxReceipt, LedgerError>;

    /// Read the task record for `id`.
    ///
    /// Returns a zero-valued record (`id == 0`) for ids the ledger never
    /// assigned; distinguishing "never created" is the caller's job.
    async fn get_task(&self, id: TaskId) -> Result<Task, LedgerError>;

    /// The most recently confirmed block number.
    async fn latest_block(&self) -> Result<u64, LedgerError>;

    /// Subscribe to live event notifications.
    ///
    /// The returned receiver may lag and drop events under load; consumers
    /// reconcile via [`LedgerClient::events_since`].
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent>;

    /// Replay confirmed events from `from_block` (inclusive) to the latest
    /// block, in confirmation order.
    async fn events_since(&self, from_block: u64) -> Result<Vec<LedgerEvent>, LedgerError>;
}
