//! Agent configuration, read from the environment.

use std::time::Duration;

use tracing::warn;

use taskchain_core::{ContentLimits, RetryPolicy};

/// Agent configuration.
///
/// Every knob has a default suitable for development; production deployments
/// override via environment variables. The signing credential for the chain
/// wallet is consumed by the ledger transport, never read here.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API bind address.
    pub http_bind_addr: String,

    /// Chain RPC endpoint, recorded for the production ledger binding.
    pub rpc_url: Option<String>,

    /// Task contract address, recorded for the production ledger binding.
    pub contract_address: Option<String>,

    /// Size bounds applied to results before submission.
    pub limits: ContentLimits,

    /// Upper bound on concurrently executing task pipelines.
    pub max_concurrent_tasks: usize,

    /// Timeout for a single processor invocation.
    pub processing_timeout: Duration,

    /// Timeout for a single ledger write and its confirmation.
    pub submission_timeout: Duration,

    /// Retry schedule for processor failures.
    pub processing_retry: RetryPolicy,

    /// Retry schedule for ledger write failures.
    pub submission_retry: RetryPolicy,

    /// Default `count` for the recent-tasks query.
    pub recent_tasks_default: usize,

    /// Hard cap on the recent-tasks `count` parameter.
    pub recent_tasks_max: usize,

    /// How many blocks back the recent-tasks event scan reaches.
    pub event_lookback_blocks: u64,

    /// Delay before the listener re-subscribes after losing the event
    /// stream.
    pub resubscribe_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_bind_addr: "0.0.0.0:5000".to_string(),
            rpc_url: None,
            contract_address: None,
            limits: ContentLimits::default(),
            max_concurrent_tasks: 8,
            processing_timeout: Duration::from_secs(180),
            submission_timeout: Duration::from_secs(180),
            processing_retry: RetryPolicy::new(3, Duration::from_millis(500)),
            submission_retry: RetryPolicy::new(3, Duration::from_millis(500)),
            recent_tasks_default: 5,
            recent_tasks_max: 50,
            event_lookback_blocks: 5000,
            resubscribe_delay: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_delay = Duration::from_millis(env_parse("RETRY_BASE_DELAY_MS", 500));

        Self {
            http_bind_addr: env_string("HTTP_BIND_ADDR", &defaults.http_bind_addr),
            rpc_url: std::env::var("AVALANCHE_FUJI_RPC").ok(),
            contract_address: std::env::var("CONTRACT_ADDRESS").ok(),
            limits: ContentLimits {
                max_characters: env_parse("BLOCKCHAIN_TEXT_LIMIT", defaults.limits.max_characters),
                max_bytes: env_parse("BLOCKCHAIN_TEXT_LIMIT_BYTES", defaults.limits.max_bytes),
            },
            max_concurrent_tasks: env_parse("MAX_CONCURRENT_TASKS", defaults.max_concurrent_tasks),
            processing_timeout: Duration::from_secs(env_parse("PROCESSING_TIMEOUT_SECS", 180)),
            submission_timeout: Duration::from_secs(env_parse("SUBMISSION_TIMEOUT_SECS", 180)),
            processing_retry: RetryPolicy::new(env_parse("PROCESSING_MAX_ATTEMPTS", 3), base_delay),
            submission_retry: RetryPolicy::new(env_parse("SUBMISSION_MAX_ATTEMPTS", 3), base_delay),
            recent_tasks_default: env_parse("RECENT_TASKS_DEFAULT", defaults.recent_tasks_default),
            recent_tasks_max: env_parse("RECENT_TASKS_MAX", defaults.recent_tasks_max),
            event_lookback_blocks: env_parse(
                "EVENT_LOOKBACK_BLOCKS",
                defaults.event_lookback_blocks,
            ),
            resubscribe_delay: defaults.resubscribe_delay,
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(var = key, value = %raw, "Ignoring unparseable environment value");
                default
            }
        },
        Err(_) => default,
    }
}
