//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use taskchain_core::{CoreError, TaskId};

use crate::http::responses::{
    ContentStatus, ErrorResponse, LimitsResponse, ProcessTaskRequest, ProcessTaskResponse,
    RecentTasksParams, TaskRecord, TaskResultResponse,
};
use crate::pipeline;
use crate::query::{QueryError, QueryService};
use crate::state::AppState;
use crate::submitter::SubmitOutcome;

/// API-level errors mapped to HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal { stage: String, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse { error, stage: None },
            ),
            Self::NotFound(error) => (
                StatusCode::NOT_FOUND,
                ErrorResponse { error, stage: None },
            ),
            Self::Internal { stage, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: message,
                    stage: Some(stage),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(_) => Self::NotFound(err.to_string()),
            QueryError::Ledger(e) => Self::Internal {
                stage: "ledger".to_string(),
                message: e.to_string(),
            },
        }
    }
}

/// POST /process_task: run the full pipeline for one task, synchronously.
pub async fn process_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessTaskRequest>,
) -> Result<Json<ProcessTaskResponse>, ApiError> {
    let id = TaskId::new(req.task_id);
    if !id.is_valid() {
        return Err(ApiError::BadRequest(CoreError::InvalidTaskId.to_string()));
    }
    if req.topic.trim().is_empty() {
        return Err(ApiError::BadRequest(CoreError::EmptyTopic.to_string()));
    }

    info!(task_id = %id, topic = %req.topic, "Processing task via HTTP");

    let outcome = pipeline::run_task(&state, id, &req.topic)
        .await
        .map_err(|e| ApiError::Internal {
            stage: e.stage().to_string(),
            message: e.to_string(),
        })?;

    let (transaction_hash, transaction_status, content_status) = match &outcome.submission {
        SubmitOutcome::AlreadyCompleted(_) => {
            (String::new(), "AlreadyCompleted".to_string(), None)
        }
        SubmitOutcome::Submitted {
            receipt,
            truncation,
            ..
        } => (
            receipt.tx_hash.clone(),
            "Successful".to_string(),
            truncation.as_ref().map(ContentStatus::from),
        ),
    };
    let on_chain = outcome.submission.on_chain().clone();

    Ok(Json(ProcessTaskResponse {
        task_id: req.task_id,
        local_result: outcome.local_result,
        transaction_hash,
        transaction_status,
        on_chain_result: Some(TaskRecord::from_task(on_chain)),
        content_status,
    }))
}

/// GET /get_task/:task_id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u64>,
) -> Result<Json<TaskRecord>, ApiError> {
    let view = QueryService::new(state).get_task(TaskId::new(task_id)).await?;
    Ok(Json(view.into()))
}

/// GET /recent_tasks?count=N
pub async fn recent_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentTasksParams>,
) -> Result<Json<Vec<TaskRecord>>, ApiError> {
    let views = QueryService::new(state).recent_tasks(params.count).await?;
    Ok(Json(views.into_iter().map(TaskRecord::from).collect()))
}

/// GET /task_result/:task_id
pub async fn task_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u64>,
) -> Result<Json<TaskResultResponse>, ApiError> {
    let view = QueryService::new(state)
        .task_result(TaskId::new(task_id))
        .await?;
    Ok(Json(view.into()))
}

/// GET /blockchain_limits
pub async fn blockchain_limits(State(state): State<Arc<AppState>>) -> Json<LimitsResponse> {
    let limits = QueryService::new(state).limits();
    Json(LimitsResponse {
        max_characters: limits.max_characters,
        max_bytes: limits.max_bytes,
        notes: vec![
            "Content exceeding these limits is truncated before storage".to_string(),
            "A truncation marker with the original size is appended".to_string(),
        ],
    })
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Taskchain agent: on-chain task processing API"
    }))
}
