pub mod backfill;
pub mod booking;
pub mod side_effects;
pub mod triage;

pub use backfill::RosterBackfill;
pub use booking::{BookingReceipt, BookingService};
pub use side_effects::SideEffectError;
pub use triage::TriageLogger;
