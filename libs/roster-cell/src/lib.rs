pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{EditEvent, ReconcileError, RosterLayout, RosterMarker};
pub use router::roster_routes;
pub use services::{Reconciler, RosterScanner, ShiftTabResolver, TabFilter};
