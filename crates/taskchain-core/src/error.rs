//! Core domain errors.

use thiserror::Error;

/// Input validation errors for Taskchain.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A task id of zero was supplied where a real task is required.
    #[error("task_id must be positive")]
    InvalidTaskId,

    /// An empty topic was supplied.
    #[error("topic must be non-empty")]
    EmptyTopic,
}
