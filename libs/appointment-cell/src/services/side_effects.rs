// libs/appointment-cell/src/services/side_effects.rs
use std::future::Future;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use shared_database::StoreError;

#[derive(Debug, Error)]
pub enum SideEffectError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unreadable slot date: {0}")]
    InvalidDate(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// What a finished best-effort write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffectOutcome {
    RosterFilled { tab: String, row: usize },
    RosterTabNotFound,
    RosterMarkerNotFound { tab: String },
    TriageRecorded { row: usize },
}

pub type SideEffectHandle = JoinHandle<Result<SideEffectOutcome, SideEffectError>>;

/// Runs `work` detached from the request. Its result is logged here and
/// never reaches the booking caller.
pub fn spawn_best_effort<F>(name: &'static str, work: F) -> SideEffectHandle
where
    F: Future<Output = Result<SideEffectOutcome, SideEffectError>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = work.await;
        match &outcome {
            Ok(done) => info!("{} finished: {:?}", name, done),
            Err(err) => warn!("{} failed, booking unaffected: {}", name, err),
        }
        outcome
    })
}
