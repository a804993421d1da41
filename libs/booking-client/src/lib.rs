//! Client side of the booking page: fetches free slots once, checks the
//! form, submits the booking and builds the WhatsApp confirmation link.

pub mod client;
pub mod models;
pub mod validation;
pub mod whatsapp;

pub use client::{sort_slots, BookingClient};
pub use models::{BookingForm, BookingOutcome, ClientError, FieldError, FormField};
pub use validation::validate_form;
pub use whatsapp::{whatsapp_link, DEFAULT_WHATSAPP_DESTINATION};
