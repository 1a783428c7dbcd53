//! In-process ledger implementation.
//!
//! Backs development runs and tests with the same semantics the contract
//! provides on-chain: dense ids from 1, a monotonically increasing block
//! counter, an append-only event log for replay, and zero-valued records
//! for unknown ids. Writes either confirm fully or leave no trace; a
//! fault-injection hook models rejected/timed-out transactions.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use taskchain_core::{Task, TaskId};

use crate::client::{LedgerClient, TxReceipt};
use crate::error::LedgerError;
use crate::event::LedgerEvent;

/// Capacity of the live notification channel. Subscribers that fall more
/// than this far behind observe a lag and must reconcile via replay.
const EVENT_CHANNEL_CAPACITY: usize = 256;

struct LedgerState {
    /// Task records; index + 1 is the task id.
    tasks: Vec<Task>,

    /// Confirmed events in order, for `events_since` replay.
    events: Vec<LedgerEvent>,

    /// Latest confirmed block number.
    block: u64,

    /// Write counter folded into transaction hashes.
    nonce: u64,
}

/// In-process [`LedgerClient`] implementation.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    events_tx: broadcast::Sender<LedgerEvent>,

    /// Number of upcoming `complete_task` calls to fail without mutating
    /// state. Test hook modelling confirmation timeouts.
    fail_completions: AtomicU32,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(LedgerState {
                tasks: Vec::new(),
                events: Vec::new(),
                block: 0,
                nonce: 0,
            }),
            events_tx,
            fail_completions: AtomicU32::new(0),
        }
    }

    /// Make the next `n` `complete_task` calls fail with a confirmation
    /// timeout, leaving ledger state untouched.
    pub fn fail_next_completions(&self, n: u32) {
        self.fail_completions.store(n, Ordering::SeqCst);
    }

    /// Number of tasks ever created.
    pub async fn task_count(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    fn tx_hash(nonce: u64, op: &str, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(nonce.to_be_bytes());
        hasher.update(op.as_bytes());
        hasher.update(payload.as_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }

    fn receipt(state: &mut LedgerState, op: &str, payload: &str) -> TxReceipt {
        state.nonce += 1;
        state.block += 1;
        TxReceipt {
            tx_hash: Self::tx_hash(state.nonce, op, payload),
            block: state.block,
            confirmed_at: Utc::now(),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn create_task(&self, topic: &str, requester: &str) -> Result<TxReceipt, LedgerError> {
        if topic.is_empty() {
            return Err(LedgerError::EmptyTopic);
        }

        let mut state = self.state.write().await;
        let id = TaskId::new(state.tasks.len() as u64 + 1);
        let receipt = Self::receipt(&mut state, "create_task", topic);

        state.tasks.push(Task::new(id, topic, requester));

        let event = LedgerEvent::TaskCreated {
            id,
            topic: topic.to_string(),
            requester: requester.to_string(),
            block: receipt.block,
        };
        state.events.push(event.clone());
        drop(state);

        debug!(task_id = %id, tx_hash = %receipt.tx_hash, "Task recorded");

        // No subscribers is fine; replay covers late joiners.
        let _ = self.events_tx.send(event);
        Ok(receipt)
    }

    async fn complete_task(&self, id: TaskId, result: &str) -> Result<TxReceipt, LedgerError> {
        // Fault injection happens before any state change so a failed
        // write never leaves a partial record.
        if self
            .fail_completions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(LedgerError::ConfirmationTimeout);
        }

        let mut state = self.state.write().await;
        let index = id
            .is_valid()
            .then(|| id.value() as usize - 1)
            .filter(|&i| i < state.tasks.len())
            .ok_or(LedgerError::UnknownTask(id))?;

        let receipt = Self::receipt(&mut state, "complete_task", result);

        // Permissive by contract: a re-completion overwrites the result.
        state.tasks[index].result = result.to_string();

        let event = LedgerEvent::TaskCompleted {
            id,
            result: result.to_string(),
            block: receipt.block,
        };
        state.events.push(event.clone());
        drop(state);

        debug!(task_id = %id, tx_hash = %receipt.tx_hash, "Result stored");

        let _ = self.events_tx.send(event);
        Ok(receipt)
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, LedgerError> {
        let state = self.state.read().await;
        let task = id
            .is_valid()
            .then(|| id.value() as usize - 1)
            .and_then(|i| state.tasks.get(i))
            .cloned()
            .unwrap_or_else(Task::unknown);
        Ok(task)
    }

    async fn latest_block(&self) -> Result<u64, LedgerError> {
        Ok(self.state.read().await.block)
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }

    async fn events_since(&self, from_block: u64) -> Result<Vec<LedgerEvent>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.block() >= from_block)
            .cloned()
            .collect())
    }
}
