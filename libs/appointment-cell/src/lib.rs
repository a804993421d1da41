pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{BookSlotRequest, BookingConfirmation, BookingError, ScreeningType, TriageData};
pub use router::appointment_routes;
pub use services::{BookingReceipt, BookingService, RosterBackfill, TriageLogger};
