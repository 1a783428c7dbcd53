//! Per-task pipeline: process, then submit.
//!
//! One pipeline runs per dispatched task id. Both stages carry a timeout
//! and a bounded retry schedule; exhaustion marks the task failed locally
//! and leaves it pending on the ledger, never silently dropped.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn};

use taskchain_core::{LocalState, PipelineStage, TaskId};

use crate::state::AppState;
use crate::submitter::{SubmitError, SubmitOutcome};

/// Outcome of a full pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The result as produced by the processor, before truncation.
    pub local_result: String,

    /// What the submitter did with it.
    pub submission: SubmitOutcome,
}

/// Pipeline failure, tagged with the stage that gave up.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Processing failed after {attempts} attempts: {message}")]
    Processing { attempts: u32, message: String },

    #[error(transparent)]
    Submission(#[from] SubmitError),
}

impl PipelineError {
    /// The stage that exhausted its retries.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Processing { .. } => PipelineStage::Processing,
            Self::Submission(_) => PipelineStage::Submission,
        }
    }
}

/// Run the full pipeline for one task.
pub async fn run_task(
    state: &Arc<AppState>,
    id: TaskId,
    topic: &str,
) -> Result<PipelineOutcome, PipelineError> {
    state.set_local(id, LocalState::Processing).await;

    let local_result = match generate(state, id, topic).await {
        Ok(result) => result,
        Err(e) => {
            state
                .set_local(
                    id,
                    LocalState::Failed {
                        stage: PipelineStage::Processing,
                    },
                )
                .await;
            error!(task_id = %id, error = %e, "Task failed in processing, needs operator retry");
            return Err(e);
        }
    };

    info!(
        task_id = %id,
        chars = local_result.chars().count(),
        bytes = local_result.len(),
        "Processing finished"
    );

    state.set_local(id, LocalState::Submitting).await;

    match state.submitter.submit(id, &local_result).await {
        Ok(submission) => {
            state.set_local(id, LocalState::Completed).await;
            Ok(PipelineOutcome {
                local_result,
                submission,
            })
        }
        Err(e) => {
            state
                .set_local(
                    id,
                    LocalState::Failed {
                        stage: PipelineStage::Submission,
                    },
                )
                .await;
            error!(task_id = %id, error = %e, "Task failed in submission, still pending on ledger");
            Err(e.into())
        }
    }
}

/// Invoke the processor under the configured timeout and retry schedule.
async fn generate(
    state: &Arc<AppState>,
    id: TaskId,
    topic: &str,
) -> Result<String, PipelineError> {
    let policy = state.config.processing_retry;
    let mut last = String::new();

    for attempt in 1..=policy.max_attempts {
        let run = tokio::time::timeout(
            state.config.processing_timeout,
            state.processor.process(id, topic),
        )
        .await;

        match run {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(e)) => {
                warn!(task_id = %id, attempt, error = %e, "Processor failed");
                last = e.to_string();
            }
            Err(_) => {
                warn!(task_id = %id, attempt, "Processor timed out");
                last = format!(
                    "timed out after {:?}",
                    state.config.processing_timeout
                );
            }
        }

        if policy.allows_retry(attempt) {
            let delay = policy.delay(attempt);
            let jitter = rand::thread_rng().gen_range(Duration::ZERO..=delay / 4);
            tokio::time::sleep(delay + jitter).await;
        }
    }

    Err(PipelineError::Processing {
        attempts: policy.max_attempts,
        message: last,
    })
}
