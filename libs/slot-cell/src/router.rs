// libs/slot-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use shared_database::AppState;

use crate::handlers;

pub fn slot_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::dispatch_get))
        .route("/slots", get(handlers::list_slots))
        .with_state(state)
}
