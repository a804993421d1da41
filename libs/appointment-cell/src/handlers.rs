// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::BookSlotRequest;
use crate::services::BookingService;

/// `POST /`. The page sends JSON as `text/plain`, so the body is parsed by
/// hand instead of through the `Json` extractor.
#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<Value>, AppError> {
    let request: BookSlotRequest = serde_json::from_str(&body).map_err(|e| {
        warn!("Rejected booking payload: {}", e);
        AppError::BadRequest(format!("Invalid booking payload: {}", e))
    })?;

    let service = BookingService::from_state(&state);
    let receipt = service.book(request).await?;
    debug!(
        "Booking answered, {} side effects left running",
        receipt.side_effects.len()
    );

    Ok(Json(json!(receipt.confirmation)))
}
