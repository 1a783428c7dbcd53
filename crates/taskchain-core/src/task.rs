//! The Task record as stored on the ledger.

use crate::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Task as recorded on the append-only ledger.
///
/// `topic` and `requester` are immutable after creation; `result` is empty
/// until the off-chain pipeline completes the task. The ledger returns a
/// zero-valued record for ids it never assigned, so callers must check
/// `exists()` before trusting the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Ledger-assigned identifier (dense, starting at 1).
    pub id: TaskId,

    /// What to generate content about. Non-empty for real records.
    pub topic: String,

    /// Generated content; empty while the task is pending.
    pub result: String,

    /// Identity of the creator.
    pub requester: String,

    /// When the creation transaction was confirmed.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending Task record.
    pub fn new(id: TaskId, topic: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            id,
            topic: topic.into(),
            result: String::new(),
            requester: requester.into(),
            created_at: Utc::now(),
        }
    }

    /// The zero-valued record the ledger returns for unknown ids.
    pub fn unknown() -> Self {
        Self {
            id: TaskId::NONE,
            topic: String::new(),
            result: String::new(),
            requester: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Returns true if this record refers to a task the ledger assigned.
    pub fn exists(&self) -> bool {
        self.id.is_valid()
    }

    /// Derived status: pending iff the result is still empty.
    pub fn status(&self) -> TaskStatus {
        if self.result.is_empty() {
            TaskStatus::Pending
        } else {
            TaskStatus::Completed
        }
    }

    /// Returns true if a result has been stored.
    pub fn is_completed(&self) -> bool {
        self.status() == TaskStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derived_from_result() {
        let mut task = Task::new(TaskId::new(1), "Web3 Integration", "0xabc");
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(!task.is_completed());

        task.result = "Generated content".to_string();
        assert_eq!(task.status(), TaskStatus::Completed);
        assert!(task.is_completed());
    }

    #[test]
    fn test_unknown_record_does_not_exist() {
        let task = Task::unknown();
        assert!(!task.exists());
        assert_eq!(task.id, TaskId::NONE);
    }
}
