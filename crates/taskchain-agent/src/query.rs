//! Read-only projection of ledger state.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use taskchain_core::{ContentLimits, LocalState, Task, TaskId, TaskStatus};
use taskchain_ledger::LedgerError;

use crate::state::AppState;

/// A task record as served to clients: the confirmed ledger state plus
/// whatever this process knows about an in-flight pipeline for it.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub task: Task,
    pub status: TaskStatus,
    pub local_state: Option<LocalState>,
}

/// Query errors.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The id is zero or the ledger never assigned it.
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Read-only facade over the ledger.
///
/// All reads pass through to the ledger's current confirmed state; no
/// caching. The local pipeline overlay is advisory and process-scoped.
pub struct QueryService {
    state: Arc<AppState>,
}

impl QueryService {
    /// Create a query service over the shared state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Fetch the record for `id`.
    pub async fn get_task(&self, id: TaskId) -> Result<TaskView, QueryError> {
        let task = self.state.ledger.get_task(id).await?;
        if !task.exists() {
            return Err(QueryError::NotFound(id));
        }
        let status = task.status();
        let local_state = self.state.local_state(id).await;
        Ok(TaskView {
            task,
            status,
            local_state,
        })
    }

    /// Up to `count` most recently created tasks, descending by id.
    ///
    /// Ids are discovered by scanning the confirmed event history over the
    /// configured lookback window, then each record is read fresh from the
    /// ledger. `count` defaults and is clamped per configuration to bound
    /// read cost.
    pub async fn recent_tasks(&self, count: Option<usize>) -> Result<Vec<TaskView>, QueryError> {
        let config = &self.state.config;
        let count = count
            .unwrap_or(config.recent_tasks_default)
            .min(config.recent_tasks_max);

        let latest = self.state.ledger.latest_block().await?;
        let from = latest.saturating_sub(config.event_lookback_blocks);
        let events = self.state.ledger.events_since(from).await?;

        let ids: BTreeSet<TaskId> = events.iter().map(|e| e.task_id()).collect();
        debug!(window_from = from, candidates = ids.len(), "Recent-task scan");

        let mut views = Vec::with_capacity(count);
        for id in ids.iter().rev().take(count) {
            match self.get_task(*id).await {
                Ok(view) => views.push(view),
                // Record aged out of the window between scan and read.
                Err(QueryError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(views)
    }

    /// Only the stored result for `id`.
    ///
    /// An empty string means the task is still pending; a processor that
    /// legitimately produced empty content is indistinguishable here, a
    /// documented limitation of the record format.
    pub async fn task_result(&self, id: TaskId) -> Result<TaskView, QueryError> {
        self.get_task(id).await
    }

    /// The configured content bounds, for client-side pre-validation.
    pub fn limits(&self) -> ContentLimits {
        self.state.config.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::processor::DraftProcessor;
    use taskchain_ledger::{InMemoryLedger, LedgerClient};

    async fn service_with_tasks(n: u64) -> (QueryService, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::new());
        for i in 1..=n {
            ledger
                .create_task(&format!("topic {i}"), "0xaa")
                .await
                .unwrap();
        }
        let state = AppState::new(Config::default(), ledger.clone(), Arc::new(DraftProcessor));
        (QueryService::new(state), ledger)
    }

    #[tokio::test]
    async fn test_get_task_zero_is_not_found() {
        let (service, _) = service_with_tasks(1).await;
        let err = service.get_task(TaskId::NONE).await.unwrap_err();
        assert!(matches!(err, QueryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_task_is_not_found() {
        let (service, _) = service_with_tasks(1).await;
        let err = service.get_task(TaskId::new(999)).await.unwrap_err();
        assert!(matches!(err, QueryError::NotFound(id) if id == TaskId::new(999)));
    }

    #[tokio::test]
    async fn test_recent_tasks_descending_and_clamped() {
        let (service, _) = service_with_tasks(8).await;

        let views = service.recent_tasks(Some(3)).await.unwrap();
        let ids: Vec<u64> = views.iter().map(|v| v.task.id.value()).collect();
        assert_eq!(ids, vec![8, 7, 6]);

        // Default count.
        let views = service.recent_tasks(None).await.unwrap();
        assert_eq!(views.len(), 5);

        // Requests above the cap are clamped, and never exceed the total.
        let views = service.recent_tasks(Some(10_000)).await.unwrap();
        assert_eq!(views.len(), 8);
    }

    #[tokio::test]
    async fn test_recent_tasks_reflect_completion() {
        let (service, ledger) = service_with_tasks(2).await;
        ledger.complete_task(TaskId::new(1), "done").await.unwrap();

        let views = service.recent_tasks(Some(5)).await.unwrap();
        assert_eq!(views[0].status, TaskStatus::Pending);
        assert_eq!(views[1].status, TaskStatus::Completed);
        assert_eq!(views[1].task.result, "done");
    }

    #[tokio::test]
    async fn test_task_result_pending_is_empty() {
        let (service, _) = service_with_tasks(1).await;
        let view = service.task_result(TaskId::new(1)).await.unwrap();
        assert_eq!(view.task.result, "");
        assert_eq!(view.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_limits_match_config() {
        let (service, _) = service_with_tasks(0).await;
        let limits = service.limits();
        assert_eq!(limits.max_characters, 5000);
        assert_eq!(limits.max_bytes, 10240);
    }
}
