//! Result submitter: idempotent, bounded-retry ledger writes.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use taskchain_core::{ContentLimits, RetryPolicy, Task, TaskId};
use taskchain_ledger::{LedgerClient, LedgerError, TxReceipt};

/// How content was resized before storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationReport {
    pub original_chars: usize,
    pub original_bytes: usize,
    pub stored_chars: usize,
    pub stored_bytes: usize,
}

/// Result of a submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The ledger already held a non-empty result; no write was attempted.
    AlreadyCompleted(Task),

    /// The result was written and confirmed.
    Submitted {
        receipt: TxReceipt,
        /// The record as re-read after confirmation.
        on_chain: Task,
        /// Present when the truncation policy fired.
        truncation: Option<TruncationReport>,
    },
}

impl SubmitOutcome {
    /// The confirmed on-chain record.
    pub fn on_chain(&self) -> &Task {
        match self {
            Self::AlreadyCompleted(task) => task,
            Self::Submitted { on_chain, .. } => on_chain,
        }
    }

    /// Transaction hash, empty for the no-op case.
    pub fn tx_hash(&self) -> &str {
        match self {
            Self::AlreadyCompleted(_) => "",
            Self::Submitted { receipt, .. } => &receipt.tx_hash,
        }
    }
}

/// Submission errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Non-retryable ledger failure, e.g. the task id was never assigned.
    #[error(transparent)]
    Ledger(LedgerError),

    /// The bounded retry schedule ran out. The task is still pending
    /// on-chain; recovery is an operator retry or replay after restart.
    #[error("Submission retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: LedgerError },
}

/// Writes finished results back to the ledger.
///
/// Every attempt is preceded by a fresh `get_task` read: if the record
/// already carries a result, the submission is a no-op. The check-then-act
/// is best effort; the ledger has no conditional write, so two independent
/// processes racing on the same id can still double-complete. That race is
/// accepted, not solved here.
#[derive(Clone)]
pub struct Submitter {
    ledger: Arc<dyn LedgerClient>,
    limits: ContentLimits,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Submitter {
    /// Create a submitter.
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        limits: ContentLimits,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            limits,
            retry,
            timeout,
        }
    }

    /// Commit `result` for task `id`.
    pub async fn submit(&self, id: TaskId, result: &str) -> Result<SubmitOutcome, SubmitError> {
        let prepared = self.limits.prepare(result);
        let truncation = if prepared.truncated {
            warn!(
                task_id = %id,
                original_chars = prepared.original_chars,
                original_bytes = prepared.original_bytes,
                stored_bytes = prepared.stored_bytes(),
                "Result exceeds ledger limits, storing truncated form"
            );
            Some(TruncationReport {
                original_chars: prepared.original_chars,
                original_bytes: prepared.original_bytes,
                stored_chars: prepared.stored_chars(),
                stored_bytes: prepared.stored_bytes(),
            })
        } else {
            None
        };

        let mut last = LedgerError::ConfirmationTimeout;
        let mut attempt = 1u32;
        loop {
            // Idempotency guard, refreshed before every attempt.
            match self.ledger.get_task(id).await {
                Ok(current) => {
                    if !current.exists() {
                        return Err(SubmitError::Ledger(LedgerError::UnknownTask(id)));
                    }
                    if current.is_completed() {
                        info!(task_id = %id, "Result already on ledger, skipping write");
                        return Ok(SubmitOutcome::AlreadyCompleted(current));
                    }
                }
                Err(e) => {
                    warn!(task_id = %id, attempt, error = %e, "Pre-submit read failed");
                    last = e;
                    if !self.backoff_or_exhaust(&mut attempt).await {
                        break;
                    }
                    continue;
                }
            }

            let write = tokio::time::timeout(
                self.timeout,
                self.ledger.complete_task(id, &prepared.content),
            )
            .await;

            match write {
                Ok(Ok(receipt)) => {
                    // Verify the stored record before reporting success.
                    let on_chain = self
                        .ledger
                        .get_task(id)
                        .await
                        .map_err(SubmitError::Ledger)?;
                    info!(
                        task_id = %id,
                        tx_hash = %receipt.tx_hash,
                        block = receipt.block,
                        "Result confirmed on ledger"
                    );
                    return Ok(SubmitOutcome::Submitted {
                        receipt,
                        on_chain,
                        truncation,
                    });
                }
                Ok(Err(e)) if !e.is_retryable() => return Err(SubmitError::Ledger(e)),
                Ok(Err(e)) => {
                    warn!(task_id = %id, attempt, error = %e, "Ledger write failed");
                    last = e;
                }
                Err(_) => {
                    warn!(task_id = %id, attempt, "Ledger write timed out");
                    last = LedgerError::ConfirmationTimeout;
                }
            }

            if !self.backoff_or_exhaust(&mut attempt).await {
                break;
            }
        }

        Err(SubmitError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last,
        })
    }

    /// Sleep the jittered backoff for `attempt` and bump the counter, or
    /// report exhaustion.
    async fn backoff_or_exhaust(&self, attempt: &mut u32) -> bool {
        if !self.retry.allows_retry(*attempt) {
            return false;
        }
        let delay = self.retry.delay(*attempt);
        let jitter = rand::thread_rng().gen_range(Duration::ZERO..=delay / 4);
        tokio::time::sleep(delay + jitter).await;
        *attempt += 1;
        true
    }
}
