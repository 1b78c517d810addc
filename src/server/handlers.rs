//! API endpoint handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use super::error::ApiError;
use super::schemas::{CreateRunRequest, ExecuteRequest, ListParams, RunDetailRead};
use super::AppState;
use crate::models::{ExecutionMode, ResearchRun};
use crate::pipeline::RunState;

fn parse_run_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Research run not found"))
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": state.settings.api_version.clone() }))
}

/// Basic ping endpoint; useful as a quick sanity check.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "pong" }))
}

/// Create a new research run with its seeded plan.
pub async fn create_run(
    State(state): State<AppState>,
    Json(payload): Json<CreateRunRequest>,
) -> Result<(StatusCode, Json<ResearchRun>), ApiError> {
    if payload.query.trim().is_empty() {
        return Err(ApiError::validation("Query must not be empty."));
    }

    let run = state
        .orchestrator
        .create_run(&payload.query, payload.title)
        .await?;

    Ok((StatusCode::CREATED, Json(run)))
}

/// List runs, newest first.
pub async fn list_runs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ResearchRun>>, ApiError> {
    let runs = state
        .orchestrator
        .list_runs(params.limit, params.offset)
        .await?;
    Ok(Json(runs))
}

/// Get a run's core attributes.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<ResearchRun>, ApiError> {
    let run_id = parse_run_id(&run_id)?;
    let run = state.orchestrator.get_run(run_id).await?;
    Ok(Json(run))
}

/// Get a run with steps, sources, answer, and events.
pub async fn get_run_detail(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunDetailRead>, ApiError> {
    let run_id = parse_run_id(&run_id)?;
    let detail = state.orchestrator.get_detail(run_id).await?;
    Ok(Json(detail.into()))
}

/// Get the projected per-stage state of a run.
pub async fn get_run_state(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunState>, ApiError> {
    let run_id = parse_run_id(&run_id)?;
    let run_state = state.orchestrator.get_state(run_id).await?;
    Ok(Json(run_state))
}

/// Run the dummy searcher stage.
pub async fn run_dummy_search(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunDetailRead>, ApiError> {
    let run_id = parse_run_id(&run_id)?;
    state.orchestrator.run_dummy_search(run_id).await?;
    let detail = state.orchestrator.get_detail(run_id).await?;
    Ok(Json(detail.into()))
}

/// Run the dummy synthesizer stage.
pub async fn run_dummy_synthesis(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunDetailRead>, ApiError> {
    let run_id = parse_run_id(&run_id)?;
    state.orchestrator.run_dummy_synthesis(run_id).await?;
    let detail = state.orchestrator.get_detail(run_id).await?;
    Ok(Json(detail.into()))
}

/// Execute the full pipeline in dummy or real mode.
pub async fn execute_pipeline(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<RunDetailRead>, ApiError> {
    let run_id = parse_run_id(&run_id)?;
    let mode = ExecutionMode::from_str(&payload.mode)
        .ok_or_else(|| ApiError::validation("mode must be \"dummy\" or \"real\""))?;

    let detail = state.orchestrator.execute(run_id, mode).await?;
    Ok(Json(detail.into()))
}
