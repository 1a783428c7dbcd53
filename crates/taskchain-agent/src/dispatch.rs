//! Dispatcher: bounded worker pool running task pipelines.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use taskchain_core::TaskId;

use crate::pipeline;
use crate::state::AppState;

/// A claimed task handed from the listener to the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: TaskId,
    pub topic: String,
}

/// Consumes work items and runs one pipeline per task id.
///
/// Pipelines for different ids run fully in parallel, capped by the
/// configured concurrency limit so a burst of task creations cannot pile
/// up unbounded work. Same-id serialization comes from the listener's
/// claim set: an id is handed over at most once per process lifetime.
pub struct Dispatcher {
    state: Arc<AppState>,
    work_rx: mpsc::Receiver<WorkItem>,
    slots: Arc<Semaphore>,
}

impl Dispatcher {
    /// Create a dispatcher draining `work_rx`.
    pub fn new(state: Arc<AppState>, work_rx: mpsc::Receiver<WorkItem>) -> Self {
        let slots = Arc::new(Semaphore::new(state.config.max_concurrent_tasks));
        Self {
            state,
            work_rx,
            slots,
        }
    }

    /// Run until the work channel closes.
    pub async fn run(mut self) {
        while let Some(item) = self.work_rx.recv().await {
            let permit = match self.slots.clone().acquire_owned().await {
                Ok(permit) => permit,
                // Semaphore is never closed while the dispatcher runs.
                Err(_) => break,
            };

            let state = self.state.clone();
            tokio::spawn(async move {
                info!(task_id = %item.id, topic = %item.topic, "Pipeline started");
                if let Err(e) = pipeline::run_task(&state, item.id, &item.topic).await {
                    warn!(
                        task_id = %item.id,
                        stage = %e.stage(),
                        error = %e,
                        "Pipeline failed"
                    );
                }
                drop(permit);
            });
        }
        info!("Work channel closed, dispatcher stopping");
    }
}
