// libs/slot-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::error::AppError;

use crate::services::SlotRegistry;

pub const ACTION_GET_SLOTS: &str = "getSlots";

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

/// `GET /?action=getSlots`. Unknown actions answer 200 with an error body,
/// which is what the booking page checks for.
#[axum::debug_handler]
pub async fn dispatch_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<Value>, AppError> {
    match query.action.as_deref() {
        Some(ACTION_GET_SLOTS) => list_slots(State(state)).await,
        other => {
            debug!("Rejected GET action {:?}", other);
            Ok(Json(json!({ "error": "Ação inválida" })))
        }
    }
}

#[axum::debug_handler]
pub async fn list_slots(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let registry = SlotRegistry::from_state(&state);
    let slots = registry.list_free().await?;
    Ok(Json(json!(slots)))
}
