//! Newtype wrapper for ledger-assigned task identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a Task.
///
/// Ids are assigned by the ledger as a dense increasing sequence starting
/// at 1. Zero is reserved: a zero-valued record is how the ledger reports
/// a task that was never created.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// The reserved "does not exist" id.
    pub const NONE: TaskId = TaskId(0);

    /// Create a new TaskId from a raw ledger value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ledger value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns true if this id can refer to a task (non-zero).
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// The id following this one in the ledger's dense sequence.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_invalid() {
        assert!(!TaskId::NONE.is_valid());
        assert!(!TaskId::new(0).is_valid());
        assert!(TaskId::new(1).is_valid());
    }

    #[test]
    fn test_id_display() {
        let id = TaskId::new(42);
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_next_is_dense() {
        assert_eq!(TaskId::NONE.next(), TaskId::new(1));
        assert_eq!(TaskId::new(7).next(), TaskId::new(8));
    }
}
