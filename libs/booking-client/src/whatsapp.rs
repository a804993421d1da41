// libs/booking-client/src/whatsapp.rs
use slot_cell::AvailableSlot;

pub const DEFAULT_WHATSAPP_DESTINATION: &str = "5548920039171";

pub fn confirmation_message(slot: &AvailableSlot, name: &str) -> String {
    let weekday = slot.weekday.replace("-feira", "");
    let when = if weekday.is_empty() {
        slot.date.clone()
    } else {
        format!("{}, {}", weekday, slot.date)
    };

    format!(
        "Olá! Aqui é {}. Acabei de solicitar um agendamento com {} para {} às {}. Poderia confirmar, por favor?",
        name,
        slot.origin.professional_role(),
        when,
        slot.time
    )
}

/// `wa.me` deep link with the confirmation text pre-filled.
pub fn whatsapp_link(destination: &str, slot: &AvailableSlot, name: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        destination,
        urlencoding::encode(&confirmation_message(slot, name))
    )
}
