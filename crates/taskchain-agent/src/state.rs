//! Shared application state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use taskchain_core::{LocalState, TaskId};
use taskchain_ledger::LedgerClient;

use crate::config::Config;
use crate::processor::Processor;
use crate::submitter::Submitter;

/// Shared application state.
pub struct AppState {
    /// Agent configuration.
    pub config: Config,

    /// Shared ledger connection; tolerates concurrent calls.
    pub ledger: Arc<dyn LedgerClient>,

    /// Content generation collaborator.
    pub processor: Arc<dyn Processor>,

    /// Result submitter with the configured retry schedule.
    pub submitter: Submitter,

    /// Task ids claimed for dispatch in this process lifetime.
    ///
    /// Std mutex: the subscription callback and a reconciliation pass may
    /// race on it, and it is never held across an await.
    dispatched: Mutex<HashSet<TaskId>>,

    /// In-flight pipeline state per task, process lifetime only.
    local: RwLock<HashMap<TaskId, LocalState>>,
}

impl AppState {
    /// Create the shared state wrapped in Arc.
    pub fn new(
        config: Config,
        ledger: Arc<dyn LedgerClient>,
        processor: Arc<dyn Processor>,
    ) -> Arc<Self> {
        let submitter = Submitter::new(
            ledger.clone(),
            config.limits,
            config.submission_retry,
            config.submission_timeout,
        );
        Arc::new(Self {
            config,
            ledger,
            processor,
            submitter,
            dispatched: Mutex::new(HashSet::new()),
            local: RwLock::new(HashMap::new()),
        })
    }

    /// Claim `id` for dispatch. Returns false if it was already claimed,
    /// making dispatch exactly-once per process lifetime.
    pub fn claim(&self, id: TaskId) -> bool {
        self.dispatched.lock().unwrap().insert(id)
    }

    /// Ids claimed so far.
    pub fn claimed(&self) -> Vec<TaskId> {
        self.dispatched.lock().unwrap().iter().copied().collect()
    }

    /// Record the pipeline state for `id`.
    pub async fn set_local(&self, id: TaskId, state: LocalState) {
        self.local.write().await.insert(id, state);
    }

    /// Current pipeline state for `id`, if it was dispatched here.
    pub async fn local_state(&self, id: TaskId) -> Option<LocalState> {
        self.local.read().await.get(&id).cloned()
    }
}
