//! HTTP surface over the orchestration runtime.
//!
//! Thin layer: submission goes through the orchestrator, reads go straight
//! to the stores, and progress streaming subscribes to the event bus and
//! filters by task id.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_stream::stream;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use caravel_core::store::{StepStore, StoreError, TaskStore};
use caravel_runtime::{Runtime, TaskOrchestrator};
use caravel_stores::{BroadcastEventBus, EventBus};

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<TaskOrchestrator>,
    tasks: Arc<dyn TaskStore>,
    steps: Arc<dyn StepStore>,
    bus: Arc<BroadcastEventBus>,
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    input: String,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub async fn run_server(runtime: Runtime, listen: SocketAddr) -> anyhow::Result<()> {
    let state = AppState {
        orchestrator: runtime.orchestrator,
        tasks: runtime.tasks,
        steps: runtime.steps,
        bus: runtime.bus,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/tasks", post(submit_task))
        .route("/tasks/{id}", get(get_task))
        .route("/tasks/{id}/steps", get(list_steps))
        .route("/tasks/{id}/events", get(stream_events))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context("bind server listener failed")?;
    tracing::info!(%listen, "caravel-server listening");
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status":"ok"}))
}

async fn submit_task(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.input.trim().is_empty() {
        return Err(bad_request("input must not be empty"));
    }
    let task_id = state
        .orchestrator
        .submit(&payload.input)
        .await
        .map_err(internal)?;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { task_id })))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .tasks
        .load(&id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(task))
}

async fn list_steps(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // A task with no steps yet still answers with an empty list, but an
    // unknown task id is a 404.
    state
        .tasks
        .load(&id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(&id))?;
    let steps = state.steps.list_for_task(&id).await.map_err(store_error)?;
    Ok(Json(steps))
}

async fn stream_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<
    Sse<impl futures_util::Stream<Item = Result<SseEvent, std::convert::Infallible>>>,
    ApiError,
> {
    state
        .tasks
        .load(&id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(&id))?;

    let mut rx = state.bus.subscribe();
    let event_stream = stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if event.task_id() != id {
                        continue;
                    }
                    let payload = serde_json::to_string(&event)
                        .unwrap_or_else(|_| "{}".to_string());
                    yield Ok(SseEvent::default().event("task_event").data(payload));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        task_id = %id,
                        skipped,
                        "sse subscriber lagged behind; dropping old events"
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keepalive"),
    ))
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            code: "invalid_argument".to_string(),
            message: message.to_string(),
        }),
    )
}

fn not_found(task_id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            code: "not_found".to_string(),
            message: format!("task {} not found", task_id),
        }),
    )
}

fn store_error(err: StoreError) -> ApiError {
    internal(err)
}

fn internal(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            code: "internal".to_string(),
            message: err.to_string(),
        }),
    )
}
