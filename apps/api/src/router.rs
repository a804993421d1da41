use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use roster_cell::router::roster_routes;
use shared_database::AppState;
use slot_cell::router::slot_routes;

pub fn create_router(state: Arc<AppState>) -> Router {
    // GET / and POST / come from different cells; merge joins their methods
    Router::new()
        .route("/health", get(|| async { "Clinic booking API is running!" }))
        .merge(slot_routes(state.clone()))
        .merge(appointment_routes(state.clone()))
        .nest("/roster", roster_routes(state))
}
