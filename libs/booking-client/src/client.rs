// libs/booking-client/src/client.rs
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use appointment_cell::{BookSlotRequest, BookingConfirmation};
use shared_utils::datetime::{parse_date, parse_time};
use slot_cell::AvailableSlot;

use crate::models::{BookingForm, BookingOutcome, ClientError, FieldError, FormField};
use crate::validation::validate_form;
use crate::whatsapp::{whatsapp_link, DEFAULT_WHATSAPP_DESTINATION};

/// Earliest first. Unreadable dates and times sort before everything else.
pub fn sort_slots(slots: &mut [AvailableSlot]) {
    slots.sort_by_key(|slot| (parse_date(&slot.date), parse_time(&slot.time)));
}

/// One instance per page load. Slots are fetched on first use and kept.
pub struct BookingClient {
    client: Client,
    api_url: String,
    whatsapp_destination: String,
    slots: OnceCell<Vec<AvailableSlot>>,
}

impl BookingClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim().to_string(),
            whatsapp_destination: DEFAULT_WHATSAPP_DESTINATION.to_string(),
            slots: OnceCell::new(),
        }
    }

    pub fn with_whatsapp_destination(mut self, destination: impl Into<String>) -> Self {
        self.whatsapp_destination = destination.into();
        self
    }

    fn endpoint(&self) -> Result<&str, ClientError> {
        if self.api_url.is_empty() {
            error!("Booking API URL is not configured");
            return Err(ClientError::NotConfigured);
        }
        Ok(&self.api_url)
    }

    /// Free slots, sorted. Only the first call goes to the network.
    pub async fn slots(&self) -> Result<&[AvailableSlot], ClientError> {
        let slots = self.slots.get_or_try_init(|| self.fetch_slots()).await?;
        Ok(slots.as_slice())
    }

    async fn fetch_slots(&self) -> Result<Vec<AvailableSlot>, ClientError> {
        let url = self.endpoint()?;
        debug!("Loading slots from {}", url);

        let response = self
            .client
            .get(url)
            .query(&[("action", "getSlots")])
            .send()
            .await?;
        let body = Self::success_body(response).await?;

        let mut slots: Vec<AvailableSlot> = match body {
            Value::Array(_) => serde_json::from_value(body)?,
            Value::Null => Vec::new(),
            other => return Err(ClientError::Api(Self::error_message(&other))),
        };
        sort_slots(&mut slots);

        info!("{} free slots loaded", slots.len());
        Ok(slots)
    }

    /// Books the slot at `index` of the sorted list. Nothing is sent when the
    /// form or the choice is invalid.
    pub async fn book(&self, index: usize, form: &BookingForm) -> Result<BookingOutcome, ClientError> {
        let mut errors = validate_form(form);
        let slot = self.slots().await?.get(index).cloned();
        if slot.is_none() {
            errors.insert(0, FieldError::new(FormField::Slot, "Horário inválido"));
        }
        let slot = match slot {
            Some(slot) if errors.is_empty() => slot,
            _ => return Err(ClientError::InvalidForm(errors)),
        };

        self.submit(&slot, form).await
    }

    pub async fn submit(&self, slot: &AvailableSlot, form: &BookingForm) -> Result<BookingOutcome, ClientError> {
        let url = self.endpoint()?;
        let request = BookSlotRequest {
            row_index: slot.row_index,
            name: form.name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            birth_date: form.birth_date.trim().to_string(),
            reason: form.reason.trim().to_string(),
            date: Some(slot.date.clone()),
            time: Some(slot.time.clone()),
            triage: None,
        };

        // text/plain keeps the browser from sending a CORS preflight
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(serde_json::to_string(&request)?)
            .send()
            .await?;
        let body = Self::success_body(response).await?;

        let confirmation: BookingConfirmation = serde_json::from_value(body)?;
        if !confirmation.success {
            return Err(ClientError::Api(confirmation.message));
        }

        info!("Booked {} {}", confirmation.date, confirmation.time);
        Ok(BookingOutcome {
            whatsapp_link: whatsapp_link(&self.whatsapp_destination, slot, &request.name),
            confirmation,
        })
    }

    async fn success_body(response: Response) -> Result<Value, ClientError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("Booking API error ({}): {}", status, text);
            let message = match status.as_u16() {
                404 => "Serviço de agendamento não encontrado".to_string(),
                _ => serde_json::from_str::<Value>(&text)
                    .map(|body| Self::error_message(&body))
                    .unwrap_or(text),
            };
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn error_message(body: &Value) -> String {
        body.get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string())
    }
}
