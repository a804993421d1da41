// libs/booking-client/src/models.rs
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::BookingConfirmation;

/// What the patient typed, before trimming.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingForm {
    pub name: String,
    pub birth_date: String,
    pub phone: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Slot,
    Name,
    BirthDate,
    Phone,
    Reason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.field, self.message)
    }
}

/// A booking the server accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingOutcome {
    pub confirmation: BookingConfirmation,
    pub whatsapp_link: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("URL da API não configurada")]
    NotConfigured,

    #[error("Formulário inválido: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidForm(Vec<FieldError>),

    #[error("Erro de conexão: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Api(String),

    #[error("Resposta inesperada: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Every failure is answered the same way on the page: show the message
    /// and let the patient submit again.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => "Verifique sua conexão e tente novamente.".to_string(),
            other => other.to_string(),
        }
    }
}
