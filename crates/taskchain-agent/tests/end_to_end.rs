//! End-to-end lifecycle tests over the in-process ledger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use taskchain_agent::{
    pipeline, AppState, Config, Dispatcher, Listener, Processor, ProcessorError, QueryService,
};
use taskchain_core::{LocalState, PipelineStage, RetryPolicy, Task, TaskId, TaskStatus};
use taskchain_ledger::{InMemoryLedger, LedgerClient};

/// Processor returning a fixed string for every topic.
struct StaticProcessor(String);

#[async_trait]
impl Processor for StaticProcessor {
    async fn process(&self, _id: TaskId, _topic: &str) -> Result<String, ProcessorError> {
        Ok(self.0.clone())
    }
}

fn fast_config() -> Config {
    Config {
        processing_retry: RetryPolicy::new(3, Duration::from_millis(1)),
        submission_retry: RetryPolicy::new(3, Duration::from_millis(1)),
        processing_timeout: Duration::from_secs(1),
        submission_timeout: Duration::from_secs(1),
        resubscribe_delay: Duration::from_millis(10),
        ..Config::default()
    }
}

/// Spin up listener and dispatcher over a shared ledger.
fn start_agent(
    ledger: Arc<InMemoryLedger>,
    processor: Arc<dyn Processor>,
) -> Arc<AppState> {
    let state = AppState::new(fast_config(), ledger, processor);
    let (work_tx, work_rx) = mpsc::channel(16);
    tokio::spawn(Listener::new(state.clone(), work_tx).run());
    tokio::spawn(Dispatcher::new(state.clone(), work_rx).run());
    state
}

async fn wait_completed(ledger: &Arc<InMemoryLedger>, id: TaskId) -> Task {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let task = ledger.get_task(id).await.unwrap();
            if task.is_completed() {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task did not complete in time")
}

#[tokio::test]
async fn test_create_dispatch_complete_lifecycle() {
    let ledger = Arc::new(InMemoryLedger::new());
    start_agent(
        ledger.clone(),
        Arc::new(StaticProcessor("Generated content...".to_string())),
    );

    ledger
        .create_task("Web3 Integration", "0xrequester")
        .await
        .unwrap();

    let task = wait_completed(&ledger, TaskId::new(1)).await;
    assert_eq!(task.id, TaskId::new(1));
    assert_eq!(task.topic, "Web3 Integration");
    assert_eq!(task.result, "Generated content...");
    assert_eq!(task.requester, "0xrequester");
    assert_eq!(task.status(), TaskStatus::Completed);
}

#[tokio::test]
async fn test_tasks_created_before_startup_are_replayed() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.create_task("early bird", "0xaa").await.unwrap();

    start_agent(
        ledger.clone(),
        Arc::new(StaticProcessor("caught up".to_string())),
    );

    let task = wait_completed(&ledger, TaskId::new(1)).await;
    assert_eq!(task.result, "caught up");
}

#[tokio::test]
async fn test_oversized_result_truncated_and_limits_consistent() {
    let ledger = Arc::new(InMemoryLedger::new());
    let state = start_agent(
        ledger.clone(),
        Arc::new(StaticProcessor("a".repeat(20_000))),
    );

    ledger.create_task("long form", "0xaa").await.unwrap();
    let task = wait_completed(&ledger, TaskId::new(1)).await;

    let limits = QueryService::new(state).limits();
    assert_eq!(limits.max_characters, 5000);
    assert_eq!(limits.max_bytes, 10240);
    assert!(task.result.len() <= limits.max_bytes);
    assert!(task.result.contains("[Content truncated"));
}

#[tokio::test]
async fn test_submission_retries_exhausted_leaves_task_pending() {
    let ledger = Arc::new(InMemoryLedger::new());
    let state = AppState::new(
        fast_config(),
        ledger.clone(),
        Arc::new(StaticProcessor("doomed".to_string())),
    );

    ledger.create_task("flaky chain", "0xaa").await.unwrap();
    ledger.fail_next_completions(3);

    let id = TaskId::new(1);
    let err = pipeline::run_task(&state, id, "flaky chain")
        .await
        .unwrap_err();
    assert_eq!(err.stage(), PipelineStage::Submission);

    // On-chain state untouched, failure surfaced locally.
    let task = ledger.get_task(id).await.unwrap();
    assert!(task.result.is_empty());
    assert_eq!(
        state.local_state(id).await,
        Some(LocalState::Failed {
            stage: PipelineStage::Submission
        })
    );
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let ledger = Arc::new(InMemoryLedger::new());
    let state = AppState::new(
        fast_config(),
        ledger,
        Arc::new(StaticProcessor(String::new())),
    );

    let result = QueryService::new(state).get_task(TaskId::new(999)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_concurrent_tasks_all_complete() {
    let ledger = Arc::new(InMemoryLedger::new());
    start_agent(
        ledger.clone(),
        Arc::new(StaticProcessor("parallel".to_string())),
    );

    for i in 1..=10 {
        ledger
            .create_task(&format!("topic {i}"), "0xaa")
            .await
            .unwrap();
    }

    for i in 1..=10u64 {
        let task = wait_completed(&ledger, TaskId::new(i)).await;
        assert_eq!(task.result, "parallel");
    }
}
