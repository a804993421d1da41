pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AvailableSlot, SlotError, SlotKey, SlotOrigin, SlotRow, ValidSlots};
pub use router::slot_routes;
pub use services::SlotRegistry;
