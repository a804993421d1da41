// libs/booking-client/src/validation.rs
use std::sync::OnceLock;

use regex::Regex;

use shared_utils::datetime::current_year;

use crate::models::{BookingForm, FieldError, FormField};

pub const MIN_NAME_CHARS: usize = 3;
pub const MIN_REASON_CHARS: usize = 5;
pub const MIN_YEAR: i32 = 1900;

fn birth_date_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").ok())
        .as_ref()
}

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_valid_phone(phone: &str) -> bool {
    (10..=11).contains(&digits(phone).len())
}

/// `dd/mm/yyyy` with day 1-31, month 1-12 and a year between 1900 and
/// `max_year`. Day and month are not checked against each other.
pub fn check_birth_date(raw: &str, max_year: i32) -> Result<(), String> {
    let captures = birth_date_re()
        .and_then(|re| re.captures(raw))
        .ok_or_else(|| "Use o formato DD/MM/AAAA".to_string())?;

    let part = |i: usize| captures[i].parse::<i32>().unwrap_or(0);
    let (day, month, year) = (part(1), part(2), part(3));

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) || !(MIN_YEAR..=max_year).contains(&year) {
        return Err("Data inválida. Verifique dia, mês e ano.".to_string());
    }
    Ok(())
}

pub fn validate_form(form: &BookingForm) -> Vec<FieldError> {
    validate_form_in(form, current_year())
}

/// Every problem in the form, in field order.
pub fn validate_form_in(form: &BookingForm, max_year: i32) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let name = form.name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        errors.push(FieldError::new(FormField::Name, "Informe seu nome completo"));
    }

    let birth_date = form.birth_date.trim();
    if birth_date.is_empty() {
        errors.push(FieldError::new(FormField::BirthDate, "Informe sua data de nascimento"));
    } else if let Err(message) = check_birth_date(birth_date, max_year) {
        errors.push(FieldError::new(FormField::BirthDate, message));
    }

    let phone = form.phone.trim();
    if phone.is_empty() {
        errors.push(FieldError::new(FormField::Phone, "Informe seu telefone"));
    } else if !is_valid_phone(phone) {
        errors.push(FieldError::new(FormField::Phone, "Telefone inválido"));
    }

    if form.reason.trim().chars().count() < MIN_REASON_CHARS {
        errors.push(FieldError::new(FormField::Reason, "Descreva o motivo da consulta"));
    }

    errors
}
