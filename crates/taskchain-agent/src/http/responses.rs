//! HTTP request and response types.

use serde::{Deserialize, Serialize};

use taskchain_core::{LocalState, Task, TaskStatus};

use crate::query::TaskView;
use crate::submitter::TruncationReport;

// ============================================================================
// Process-task types
// ============================================================================

/// Request body for the process-task endpoint.
#[derive(Debug, Deserialize)]
pub struct ProcessTaskRequest {
    /// Ledger-assigned task id, must be positive.
    pub task_id: u64,

    /// Topic to generate content for, must be non-empty.
    pub topic: String,
}

/// Response body for the process-task endpoint.
#[derive(Debug, Serialize)]
pub struct ProcessTaskResponse {
    pub task_id: u64,

    /// Full processor output, before any truncation.
    pub local_result: String,

    /// Hash of the confirmed write; empty when no write was needed.
    pub transaction_hash: String,

    /// "Successful" or "AlreadyCompleted".
    pub transaction_status: String,

    /// The record as re-read from the ledger after confirmation.
    pub on_chain_result: Option<TaskRecord>,

    /// Present when the truncation policy fired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_status: Option<ContentStatus>,
}

/// Truncation details attached to a process-task response.
#[derive(Debug, Serialize)]
pub struct ContentStatus {
    pub truncated: bool,
    pub original_length: usize,
    pub stored_length: usize,
    pub percentage_stored: f64,
}

impl From<&TruncationReport> for ContentStatus {
    fn from(report: &TruncationReport) -> Self {
        let percentage =
            (report.stored_chars as f64 / report.original_chars as f64 * 10_000.0).round() / 100.0;
        Self {
            truncated: true,
            original_length: report.original_chars,
            stored_length: report.stored_chars,
            percentage_stored: percentage,
        }
    }
}

// ============================================================================
// Task record types
// ============================================================================

/// A task record as served to clients.
#[derive(Debug, Serialize)]
pub struct TaskRecord {
    pub id: u64,
    pub topic: String,
    pub result: String,
    pub requester: String,
    pub status: TaskStatus,
    pub created_at: String,

    /// In-flight pipeline state known to this process, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_state: Option<LocalState>,
}

impl TaskRecord {
    /// Build a record from a bare ledger task.
    pub fn from_task(task: Task) -> Self {
        let status = task.status();
        Self {
            id: task.id.value(),
            topic: task.topic,
            result: task.result,
            requester: task.requester,
            status,
            created_at: task.created_at.to_rfc3339(),
            local_state: None,
        }
    }
}

impl From<TaskView> for TaskRecord {
    fn from(view: TaskView) -> Self {
        let mut record = Self::from_task(view.task);
        record.status = view.status;
        record.local_state = view.local_state;
        record
    }
}

/// Response for the task-result endpoint: just the stored outcome.
#[derive(Debug, Serialize)]
pub struct TaskResultResponse {
    pub task_id: u64,
    pub topic: String,
    pub result: String,
    pub requester: String,
}

impl From<TaskView> for TaskResultResponse {
    fn from(view: TaskView) -> Self {
        Self {
            task_id: view.task.id.value(),
            topic: view.task.topic,
            result: view.task.result,
            requester: view.task.requester,
        }
    }
}

// ============================================================================
// Query types
// ============================================================================

/// Query parameters for the recent-tasks endpoint.
#[derive(Debug, Deserialize)]
pub struct RecentTasksParams {
    pub count: Option<usize>,
}

/// Response for the blockchain-limits endpoint.
#[derive(Debug, Serialize)]
pub struct LimitsResponse {
    pub max_characters: usize,
    pub max_bytes: usize,
    pub notes: Vec<String>,
}

// ============================================================================
// Error types
// ============================================================================

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Pipeline stage that failed, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}
