//! Taskchain Ledger Seam
//!
//! The ledger is the single source of truth for persisted task state: an
//! append-only, totally ordered record store exposing `create_task`,
//! `complete_task` and `get_task`, and emitting `TaskCreated` /
//! `TaskCompleted` notifications. This crate defines the [`LedgerClient`]
//! trait the rest of the system programs against, plus [`InMemoryLedger`],
//! an in-process implementation with confirmation and replay semantics used
//! for development and tests. A production chain binding (RPC transport,
//! wallet signing) implements the same trait and lives outside this
//! repository.

pub mod client;
pub mod error;
pub mod event;
pub mod memory;

pub use client::{LedgerClient, TxReceipt};
pub use error::LedgerError;
pub use event::LedgerEvent;
pub use memory::InMemoryLedger;
