//! Taskchain Agent Daemon

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use taskchain_agent::{AppState, Config, Dispatcher, DraftProcessor, Listener};
use taskchain_ledger::InMemoryLedger;

/// Capacity of the listener-to-dispatcher work channel.
const WORK_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load config
    let config = Config::from_env();
    let http_addr = config.http_bind_addr.clone();

    info!(
        http_addr = %http_addr,
        max_characters = config.limits.max_characters,
        max_bytes = config.limits.max_bytes,
        max_concurrent = config.max_concurrent_tasks,
        "Starting Taskchain agent"
    );
    if let Some(rpc) = &config.rpc_url {
        info!(rpc_url = %rpc, contract = ?config.contract_address, "Chain endpoint configured");
    }

    // The in-process ledger stands in for the chain binding; the rest of
    // the system only sees the LedgerClient trait.
    let ledger = Arc::new(InMemoryLedger::new());
    let state = AppState::new(config, ledger, Arc::new(DraftProcessor));

    // Event listener feeding the bounded worker pool
    let (work_tx, work_rx) = mpsc::channel(WORK_CHANNEL_CAPACITY);
    let listener = Listener::new(state.clone(), work_tx);
    let dispatcher = Dispatcher::new(state.clone(), work_rx);

    let listener_handle = tokio::spawn(listener.run());
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    // HTTP API
    let router = taskchain_agent::http::create_router(state);
    let http_listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server listening on {}", http_addr);

    tokio::select! {
        result = axum::serve(http_listener, router) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
        _ = listener_handle => {
            tracing::error!("Event listener stopped unexpectedly");
        }
        _ = dispatcher_handle => {
            tracing::error!("Dispatcher stopped unexpectedly");
        }
    }

    Ok(())
}
