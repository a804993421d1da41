// libs/appointment-cell/src/services/triage.rs
use std::sync::Arc;

use chrono::Local;
use tracing::{info, instrument};

use shared_database::{CellValue, Row, TabularStore};
use slot_cell::SlotOrigin;

use crate::models::{PatientDetails, ScreeningType, TriageData};
use crate::services::side_effects::{SideEffectError, SideEffectOutcome};

/// Appends intake screenings to the triage workbook.
#[derive(Clone)]
pub struct TriageLogger {
    store: Option<Arc<dyn TabularStore>>,
    sheet: String,
}

fn optional(value: &Option<String>) -> CellValue {
    value.as_deref().map(CellValue::from).unwrap_or_default()
}

fn number(value: Option<u32>) -> CellValue {
    value.map(|n| CellValue::text(n.to_string())).unwrap_or_default()
}

impl TriageLogger {
    pub fn new(store: Option<Arc<dyn TabularStore>>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
        }
    }

    /// One row per screening. Fields of the other screening type stay empty.
    pub fn build_row(
        triage: &TriageData,
        patient: &PatientDetails,
        date: &str,
        time: &str,
        origin: SlotOrigin,
    ) -> Row {
        let prenatal = triage.screening == Some(ScreeningType::Prenatal);
        let child = triage.screening == Some(ScreeningType::Puericultura);

        vec![
            CellValue::from(Local::now().naive_local()),
            triage
                .screening
                .map(|kind| CellValue::text(kind.as_str()))
                .unwrap_or_default(),
            CellValue::from(patient.name.as_str()),
            CellValue::from(patient.birth_date.as_str()),
            CellValue::from(patient.phone.as_str()),
            CellValue::from(date),
            CellValue::from(time),
            CellValue::text(origin.professional_role()),
            if prenatal { number(triage.pregnancy_weeks) } else { CellValue::Empty },
            if prenatal { optional(&triage.last_menstrual_period) } else { CellValue::Empty },
            if child { number(triage.child_age_months) } else { CellValue::Empty },
            if child { optional(&triage.guardian_name) } else { CellValue::Empty },
            triage
                .first_visit
                .map(|first| CellValue::text(if first { "Sim" } else { "Não" }))
                .unwrap_or_default(),
            optional(&triage.last_visit_date),
            optional(&triage.notes),
            CellValue::text(origin.as_str()),
        ]
    }

    #[instrument(skip(self, triage, patient))]
    pub async fn record(
        &self,
        triage: &TriageData,
        patient: &PatientDetails,
        date: &str,
        time: &str,
        origin: SlotOrigin,
    ) -> Result<SideEffectOutcome, SideEffectError> {
        let store = self
            .store
            .as_ref()
            .ok_or(SideEffectError::NotConfigured("triage workbook"))?;

        let row = Self::build_row(triage, patient, date, time, origin);
        let row = store.append_row(&self.sheet, row).await?;

        info!("Triage recorded at {} row {}", self.sheet, row);
        Ok(SideEffectOutcome::TriageRecorded { row })
    }
}
