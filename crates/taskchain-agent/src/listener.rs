//! Event listener: exactly-once dispatch of `TaskCreated` notifications.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, trace, warn};

use taskchain_core::{LocalState, TaskId};
use taskchain_ledger::{LedgerError, LedgerEvent};

use crate::dispatch::WorkItem;
use crate::state::AppState;

/// Consumes the ledger's notification stream and hands each created task
/// to the dispatcher exactly once per process lifetime.
///
/// The transport only promises at-least-once delivery: notifications can
/// repeat across re-broadcasts and the live channel can lag under load.
/// De-duplication by id (the claim set on [`AppState`]) turns that into
/// exactly-once dispatch; lag and reconnects trigger a replay of the
/// confirmed event history so nothing is silently dropped.
pub struct Listener {
    state: Arc<AppState>,
    work_tx: mpsc::Sender<WorkItem>,

    /// Highest confirmed block observed, the replay cursor.
    last_block: u64,
}

impl Listener {
    /// Create a listener feeding `work_tx`.
    pub fn new(state: Arc<AppState>, work_tx: mpsc::Sender<WorkItem>) -> Self {
        Self {
            state,
            work_tx,
            last_block: 0,
        }
    }

    /// Subscribe and run until the process stops, resubscribing after
    /// stream loss.
    pub async fn run(mut self) {
        loop {
            let rx = self.state.ledger.subscribe();
            let mut stream = BroadcastStream::new(rx);

            // Catch up on writes confirmed before (or while re-)subscribing.
            if let Err(e) = self.reconcile().await {
                warn!(error = %e, "Reconciliation failed, relying on live stream");
            }

            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) => self.handle_event(event).await,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event stream lagged, replaying history");
                        if let Err(e) = self.reconcile().await {
                            warn!(error = %e, "Replay after lag failed");
                        }
                    }
                }
            }

            warn!("Event stream closed, resubscribing");
            tokio::time::sleep(self.state.config.resubscribe_delay).await;
        }
    }

    async fn handle_event(&mut self, event: LedgerEvent) {
        self.last_block = self.last_block.max(event.block());
        match event {
            LedgerEvent::TaskCreated { id, topic, .. } => self.dispatch(id, topic).await,
            LedgerEvent::TaskCompleted { id, .. } => {
                trace!(task_id = %id, "Completion confirmed");
            }
        }
    }

    /// Claim `id` and enqueue it for processing, once.
    async fn dispatch(&self, id: TaskId, topic: String) {
        if !id.is_valid() {
            warn!("Dropping notification with zero task id");
            return;
        }
        if !self.state.claim(id) {
            debug!(task_id = %id, "Duplicate notification ignored");
            return;
        }

        self.state.set_local(id, LocalState::Dispatched).await;
        info!(task_id = %id, topic = %topic, "Dispatching task");

        if self.work_tx.send(WorkItem { id, topic }).await.is_err() {
            error!(task_id = %id, "Work channel closed, task stranded until restart");
        }
    }

    /// Replay confirmed events from the cursor and cross-check every
    /// claimed id against the ledger.
    ///
    /// Replaying an already-seen block is harmless: the claim set drops
    /// duplicates. The cross-check covers dropped notifications: an id
    /// dispatched here but never observed completed is re-read via
    /// `get_task`, adopting a completion the stream lost and re-surfacing
    /// tasks that are still pending. Locally failed tasks stay pending on
    /// the ledger and are logged again so they cannot go unnoticed between
    /// restarts.
    async fn reconcile(&mut self) -> Result<(), LedgerError> {
        let events = self.state.ledger.events_since(self.last_block).await?;
        let replayed = events.len();
        for event in events {
            self.handle_event(event).await;
        }
        debug!(replayed, cursor = self.last_block, "Reconciliation pass done");

        for id in self.state.claimed() {
            match self.state.local_state(id).await {
                Some(LocalState::Failed { stage }) => {
                    warn!(task_id = %id, %stage, "Task failed locally, awaiting operator retry");
                }
                Some(local) if local.is_active() => match self.state.ledger.get_task(id).await {
                    Ok(task) if task.is_completed() => {
                        debug!(task_id = %id, "Ledger shows completion, updating local state");
                        self.state.set_local(id, LocalState::Completed).await;
                    }
                    Ok(_) => {
                        warn!(task_id = %id, local_state = ?local, "Claimed task still pending on ledger");
                    }
                    Err(e) => {
                        warn!(task_id = %id, error = %e, "Could not verify claimed task");
                    }
                },
                _ => {}
            }
        }
        Ok(())
    }
}
