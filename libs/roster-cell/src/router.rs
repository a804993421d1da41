// libs/roster-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use shared_database::AppState;

use crate::handlers;

pub fn roster_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/edit", post(handlers::roster_edited))
        .route("/sync", post(handlers::sync_reserved))
        .route("/orphans/cleanup", post(handlers::cleanup_orphans))
        .with_state(state)
}
