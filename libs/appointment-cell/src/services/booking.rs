// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Local;
use futures::future::join_all;
use tracing::{error, info, instrument};

use shared_database::{AppState, CellValue, TabularStore};
use slot_cell::SlotRegistry;

use crate::models::{BookSlotRequest, BookingConfirmation, BookingError, PatientDetails};
use crate::services::backfill::RosterBackfill;
use crate::services::side_effects::{
    spawn_best_effort, SideEffectError, SideEffectHandle, SideEffectOutcome,
};
use crate::services::triage::TriageLogger;

/// A committed booking plus the detached roster and triage writes it started.
#[derive(Debug)]
pub struct BookingReceipt {
    pub confirmation: BookingConfirmation,
    pub side_effects: Vec<SideEffectHandle>,
}

impl BookingReceipt {
    /// Waits for every side effect. Only tests and maintenance tooling need
    /// this; the HTTP handler drops the handles.
    pub async fn settle(self) -> Vec<Result<SideEffectOutcome, SideEffectError>> {
        join_all(self.side_effects)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    error!("Side effect task aborted: {}", err);
                    None
                }
            })
            .collect()
    }
}

pub struct BookingService {
    registry: SlotRegistry,
    appointments: Arc<dyn TabularStore>,
    appointments_sheet: String,
    backfill: RosterBackfill,
    triage: TriageLogger,
}

impl BookingService {
    pub fn new(
        registry: SlotRegistry,
        appointments: Arc<dyn TabularStore>,
        appointments_sheet: impl Into<String>,
        backfill: RosterBackfill,
        triage: TriageLogger,
    ) -> Self {
        Self {
            registry,
            appointments,
            appointments_sheet: appointments_sheet.into(),
            backfill,
            triage,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            SlotRegistry::from_state(state),
            state.workbooks.booking.clone(),
            &state.config.appointments_sheet,
            RosterBackfill::from_state(state),
            TriageLogger::new(state.workbooks.triage.clone(), &state.config.triage_sheet),
        )
    }

    fn validate(patient: &PatientDetails) -> Result<(), BookingError> {
        if patient.name.is_empty() {
            return Err(BookingError::Validation("Nome é obrigatório".to_string()));
        }
        if patient.phone.is_empty() {
            return Err(BookingError::Validation("Telefone é obrigatório".to_string()));
        }
        Ok(())
    }

    /// Consumes the slot and logs the appointment. Once the slot is gone the
    /// booking stands, whatever happens to the roster or triage writes.
    #[instrument(skip(self, request), fields(row_index = request.row_index))]
    pub async fn book(&self, request: BookSlotRequest) -> Result<BookingReceipt, BookingError> {
        let patient = request.patient();
        Self::validate(&patient)?;

        let slot = self
            .registry
            .consume(request.row_index, request.date.as_deref(), request.time.as_deref())
            .await?;

        let record = vec![
            CellValue::from(Local::now().naive_local()),
            CellValue::from(slot.date.as_str()),
            CellValue::from(slot.time.as_str()),
            CellValue::from(patient.name.as_str()),
            CellValue::from(patient.birth_date.as_str()),
            CellValue::from(patient.reason.as_str()),
            CellValue::from(patient.phone.as_str()),
        ];
        if let Err(err) = self
            .appointments
            .append_row(&self.appointments_sheet, record)
            .await
        {
            error!(
                "Slot {} {} consumed but appointment log write failed: {}",
                slot.date, slot.time, err
            );
            return Err(err.into());
        }
        info!("Appointment booked: {} {} ({})", slot.date, slot.time, slot.origin);

        let mut side_effects = Vec::with_capacity(2);

        let backfill = self.backfill.clone();
        let (date, time, origin) = (slot.date.clone(), slot.time.clone(), slot.origin);
        let booked = patient.clone();
        side_effects.push(spawn_best_effort("roster back-fill", async move {
            backfill.fill(&date, &time, origin, &booked).await
        }));

        if let Some(triage) = request.triage {
            let logger = self.triage.clone();
            let (date, time, origin) = (slot.date.clone(), slot.time.clone(), slot.origin);
            side_effects.push(spawn_best_effort("triage record", async move {
                logger.record(&triage, &patient, &date, &time, origin).await
            }));
        }

        Ok(BookingReceipt {
            confirmation: BookingConfirmation::booked(&slot.date, &slot.time),
            side_effects,
        })
    }
}
