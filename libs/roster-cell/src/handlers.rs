// libs/roster-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::EditEvent;
use crate::services::Reconciler;

/// Edit-notification webhook. Always answers 200; what happened is in the report.
#[axum::debug_handler]
pub async fn roster_edited(
    State(state): State<Arc<AppState>>,
    Json(event): Json<EditEvent>,
) -> Result<Json<Value>, AppError> {
    let reconciler = Reconciler::from_state(&state);
    let report = reconciler.on_edit(&event).await;
    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn sync_reserved(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let reconciler = Reconciler::from_state(&state);
    let report = reconciler.full_sync().await?;
    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn cleanup_orphans(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let reconciler = Reconciler::from_state(&state);
    let report = reconciler.cleanup_orphans().await?;
    Ok(Json(json!(report)))
}
