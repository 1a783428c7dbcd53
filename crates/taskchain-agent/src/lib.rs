//! Taskchain Agent
//!
//! The off-chain half of the task lifecycle: listens for `TaskCreated`
//! notifications from the ledger, dispatches each task exactly once to the
//! content processor through a bounded worker pool, writes results back
//! idempotently with bounded retries, and serves a read-only HTTP API over
//! the ledger's confirmed state.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod listener;
pub mod pipeline;
pub mod processor;
pub mod query;
pub mod state;
pub mod submitter;

pub use config::Config;
pub use dispatch::{Dispatcher, WorkItem};
pub use listener::Listener;
pub use processor::{DraftProcessor, Processor, ProcessorError};
pub use query::QueryService;
pub use state::AppState;
pub use submitter::{SubmitError, SubmitOutcome, Submitter};
