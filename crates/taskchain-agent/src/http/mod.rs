//! HTTP API for the agent.
//!
//! Provides endpoints for:
//! - Synchronous task processing (`/process_task`)
//! - Task reads (`/get_task/:task_id`, `/task_result/:task_id`)
//! - Recent task listing (`/recent_tasks`)
//! - Content limits (`/blockchain_limits`)
//! - Health check (`/health`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handlers;
pub mod responses;

pub use handlers::ApiError;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/process_task", post(handlers::process_task))
        .route("/get_task/:task_id", get(handlers::get_task))
        .route("/recent_tasks", get(handlers::recent_tasks))
        .route("/blockchain_limits", get(handlers::blockchain_limits))
        .route("/task_result/:task_id", get(handlers::task_result))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use taskchain_core::RetryPolicy;
    use taskchain_ledger::{InMemoryLedger, LedgerClient};

    use super::*;
    use crate::config::Config;
    use crate::processor::DraftProcessor;

    fn router_over(ledger: Arc<InMemoryLedger>) -> Router {
        let config = Config {
            submission_retry: RetryPolicy::new(3, Duration::from_millis(1)),
            processing_retry: RetryPolicy::new(3, Duration::from_millis(1)),
            ..Config::default()
        };
        create_router(AppState::new(config, ledger, Arc::new(DraftProcessor)))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_get_unknown_task_is_404_with_error_body() {
        let app = router_over(Arc::new(InMemoryLedger::new()));

        let response = app.oneshot(get_request("/get_task/999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn test_task_result_unknown_task_is_404() {
        let app = router_over(Arc::new(InMemoryLedger::new()));
        let response = app.oneshot(get_request("/task_result/7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_process_task_zero_id_is_400() {
        let app = router_over(Arc::new(InMemoryLedger::new()));

        let request = post_json(
            "/process_task",
            serde_json::json!({ "task_id": 0, "topic": "Web3" }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("task_id"));
    }

    #[tokio::test]
    async fn test_process_task_empty_topic_is_400() {
        let app = router_over(Arc::new(InMemoryLedger::new()));

        let request = post_json(
            "/process_task",
            serde_json::json!({ "task_id": 1, "topic": "  " }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("topic"));
    }

    #[tokio::test]
    async fn test_process_task_exhausted_submission_is_500_with_stage() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.create_task("flaky chain", "0xaa").await.unwrap();
        ledger.fail_next_completions(3);

        let app = router_over(ledger.clone());
        let request = post_json(
            "/process_task",
            serde_json::json!({ "task_id": 1, "topic": "flaky chain" }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["stage"], "submission");
        assert!(body["error"].as_str().unwrap().contains("exhausted"));

        // The task is untouched on the ledger.
        let task = ledger
            .get_task(taskchain_core::TaskId::new(1))
            .await
            .unwrap();
        assert!(task.result.is_empty());
    }

    #[tokio::test]
    async fn test_process_task_success_reports_on_chain_record() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.create_task("Web3 Integration", "0xaa").await.unwrap();

        let app = router_over(ledger);
        let request = post_json(
            "/process_task",
            serde_json::json!({ "task_id": 1, "topic": "Web3 Integration" }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["transaction_status"], "Successful");
        assert!(body["transaction_hash"].as_str().unwrap().starts_with("0x"));
        assert_eq!(body["on_chain_result"]["id"], 1);
        assert_eq!(body["on_chain_result"]["status"], "COMPLETED");
    }

    #[tokio::test]
    async fn test_blockchain_limits_report_configured_bounds() {
        let app = router_over(Arc::new(InMemoryLedger::new()));
        let response = app.oneshot(get_request("/blockchain_limits")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["max_characters"], 5000);
        assert_eq!(body["max_bytes"], 10240);
    }
}
