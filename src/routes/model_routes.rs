use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::errors::AppResult;
use crate::models::{MessageResponse, ModelSummary};
use crate::services::catalog;
use crate::utils::tools::{registered_tools, ToolStatus};

#[derive(Debug, Serialize)]
pub struct WorkerStatus {
    pub size: usize,
    pub available: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub workers: WorkerStatus,
    pub tools: Vec<ToolStatus>,
}

pub async fn list_models(State(state): State<AppState>) -> AppResult<Json<Vec<ModelSummary>>> {
    let storage = state.config.storage.clone();
    let models = state.workers.run_blocking(move || catalog::list_models(&storage)).await?;
    Ok(Json(models))
}

pub async fn delete_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let storage = state.config.storage.clone();
    let id = model_id.clone();
    state.workers.run_blocking(move || catalog::delete_model(&storage, &id)).await?;
    Ok(Json(MessageResponse::new(format!("Model {} deleted", model_id))))
}

pub async fn cleanup_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let storage = state.config.storage.clone();
    let id = model_id.clone();
    let removed = state.workers.run_blocking(move || catalog::cleanup_model(&storage, &id)).await?;
    Ok(Json(MessageResponse::new(format!(
        "Removed {} intermediate director{} of {}",
        removed.len(),
        if removed.len() == 1 { "y" } else { "ies" },
        model_id
    ))))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        workers: WorkerStatus {
            size: state.workers.size(),
            available: state.workers.available(),
        },
        tools: registered_tools().iter().map(|tool| tool.status()).collect(),
    })
}
