// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use shared_database::StoreError;
use shared_models::error::AppError;
use slot_cell::SlotError;

pub const BOOKING_SUCCESS_MESSAGE: &str = "Agendamento realizado com sucesso!";

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Body posted by the booking page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    #[serde(rename = "rowIndex")]
    pub row_index: usize,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "dataNascimento", default)]
    pub birth_date: String,
    #[serde(rename = "observacoes", default)]
    pub reason: String,
    /// Date and time the patient picked, checked against the row on booking.
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "hora", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(
        rename = "triagem",
        default,
        deserialize_with = "lenient_triage",
        skip_serializing_if = "Option::is_none"
    )]
    pub triage: Option<TriageData>,
}

impl BookSlotRequest {
    pub fn patient(&self) -> PatientDetails {
        PatientDetails {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            birth_date: self.birth_date.trim().to_string(),
            reason: self.reason.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDetails {
    pub name: String,
    pub phone: String,
    pub birth_date: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningType {
    /// Pre-natal follow-up
    Prenatal,
    /// Well-child follow-up
    Puericultura,
}

impl ScreeningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningType::Prenatal => "prenatal",
            ScreeningType::Puericultura => "puericultura",
        }
    }
}

/// Optional intake screening sent along with a booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageData {
    #[serde(rename = "tipo")]
    pub screening: Option<ScreeningType>,
    #[serde(rename = "semanasGestacao", default, deserialize_with = "count_or_text")]
    pub pregnancy_weeks: Option<u32>,
    #[serde(rename = "dum", default)]
    pub last_menstrual_period: Option<String>,
    #[serde(rename = "idadeMeses", default, deserialize_with = "count_or_text")]
    pub child_age_months: Option<u32>,
    #[serde(rename = "nomeResponsavel", default)]
    pub guardian_name: Option<String>,
    #[serde(rename = "primeiraConsulta", default, deserialize_with = "yes_no_or_text")]
    pub first_visit: Option<bool>,
    #[serde(rename = "dataUltimaConsulta", default)]
    pub last_visit_date: Option<String>,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
}

/// A triage block that does not fit is dropped so it never costs the
/// patient the booking.
fn lenient_triage<'de, D>(deserializer: D) -> Result<Option<TriageData>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match serde_json::from_value(value) {
        Ok(triage) => Some(triage),
        Err(err) => {
            warn!("Triage block ignored: {}", err);
            None
        }
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(u32),
    Flag(bool),
    Text(String),
    Other(Value),
}

// Form inputs arrive as text.
fn count_or_text<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseValue>::deserialize(deserializer)? {
        Some(LooseValue::Number(n)) => Some(n),
        Some(LooseValue::Text(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

fn yes_no_or_text<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseValue>::deserialize(deserializer)? {
        Some(LooseValue::Flag(flag)) => Some(flag),
        Some(LooseValue::Text(text)) => match text.trim().to_lowercase().as_str() {
            "sim" | "s" | "true" => Some(true),
            "não" | "nao" | "n" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    #[serde(rename = "sucesso")]
    pub success: bool,
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: String,
}

impl BookingConfirmation {
    pub fn booked(date: &str, time: &str) -> Self {
        Self {
            success: true,
            message: BOOKING_SUCCESS_MESSAGE.to_string(),
            date: date.to_string(),
            time: time.to_string(),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("Appointment log unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Slot(slot) => slot.into(),
            BookingError::Store(StoreError::SheetNotFound(sheet)) => {
                AppError::Configuration(format!("A aba \"{}\" não foi encontrada na planilha.", sheet))
            }
            BookingError::Store(StoreError::NotConfigured(msg)) => AppError::Configuration(msg),
            BookingError::Store(other) => AppError::ExternalService(other.to_string()),
            BookingError::Validation(msg) => AppError::ValidationError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_reads_the_page_payload() {
        let request: BookSlotRequest = serde_json::from_value(json!({
            "rowIndex": 5,
            "nome": " Ana Souza ",
            "telefone": "48999990000",
            "observacoes": "Retorno"
        }))
        .unwrap();

        assert_eq!(request.row_index, 5);
        assert_eq!(request.birth_date, "");
        assert!(request.triage.is_none());
        assert_eq!(request.patient().name, "Ana Souza");
    }

    #[test]
    fn triage_payload_uses_portuguese_keys() {
        let triage: TriageData = serde_json::from_value(json!({
            "tipo": "prenatal",
            "semanasGestacao": 12,
            "dum": "01/09/2025",
            "primeiraConsulta": true
        }))
        .unwrap();

        assert_eq!(triage.screening, Some(ScreeningType::Prenatal));
        assert_eq!(triage.pregnancy_weeks, Some(12));
        assert_eq!(triage.child_age_months, None);
    }

    #[test]
    fn triage_accepts_form_text() {
        let triage: TriageData = serde_json::from_value(json!({
            "tipo": "prenatal",
            "semanasGestacao": "12",
            "primeiraConsulta": "Não",
            "idadeMeses": ""
        }))
        .unwrap();

        assert_eq!(triage.pregnancy_weeks, Some(12));
        assert_eq!(triage.first_visit, Some(false));
        assert_eq!(triage.child_age_months, None);
    }

    #[test]
    fn unreadable_triage_does_not_reject_the_request() {
        let request: BookSlotRequest = serde_json::from_value(json!({
            "rowIndex": 2,
            "nome": "Ana Souza",
            "telefone": "48999990000",
            "data": "12/12/2025",
            "hora": "09:00",
            "triagem": { "tipo": "geriatria", "semanasGestacao": [12] }
        }))
        .unwrap();

        assert!(request.triage.is_none());
        assert_eq!(request.date.as_deref(), Some("12/12/2025"));
        assert_eq!(request.time.as_deref(), Some("09:00"));
    }

    #[test]
    fn confirmation_serializes_like_the_page_expects() {
        let body = serde_json::to_value(BookingConfirmation::booked("12/12/2025", "09:00")).unwrap();
        assert_eq!(
            body,
            json!({
                "sucesso": true,
                "mensagem": "Agendamento realizado com sucesso!",
                "data": "12/12/2025",
                "hora": "09:00"
            })
        );
    }

    #[test]
    fn conflict_surfaces_as_409() {
        let err: AppError = BookingError::Slot(SlotError::Conflict).into();
        assert_eq!(err.status_code().as_u16(), 409);
    }
}
