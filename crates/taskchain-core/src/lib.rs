//! Taskchain Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/RPC
//! - The async runtime
//! - The HTTP layer
//!
//! All types here represent the core business domain of Taskchain: tasks
//! recorded on an append-only ledger, the content limits applied before a
//! result is written back, and the bounded retry schedule used by the
//! off-chain pipeline.

pub mod content;
pub mod error;
pub mod ids;
pub mod retry;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use content::{ContentLimits, PreparedContent};
pub use error::CoreError;
pub use ids::TaskId;
pub use retry::RetryPolicy;
pub use status::{LocalState, PipelineStage, TaskStatus};
pub use task::Task;
