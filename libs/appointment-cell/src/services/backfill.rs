// libs/appointment-cell/src/services/backfill.rs
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use roster_cell::services::scanner::find_marker_row;
use roster_cell::{RosterLayout, ShiftTabResolver, TabFilter};
use shared_config::AppConfig;
use shared_database::{AppState, CellValue, TabularStore};
use shared_utils::datetime::parse_date;
use slot_cell::SlotOrigin;

use crate::models::PatientDetails;
use crate::services::side_effects::{SideEffectError, SideEffectOutcome};

/// Writes a booked patient over the reserved marker on the roster.
#[derive(Clone)]
pub struct RosterBackfill {
    roster: Arc<dyn TabularStore>,
    filter: TabFilter,
    keyword: String,
}

impl RosterBackfill {
    pub fn new(config: &AppConfig, roster: Arc<dyn TabularStore>) -> Self {
        Self {
            roster,
            filter: TabFilter::from_config(config),
            keyword: config.reserved_keyword.clone(),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.config, state.workbooks.roster.clone())
    }

    #[instrument(skip(self, patient), fields(patient = %patient.name))]
    pub async fn fill(
        &self,
        date: &str,
        time: &str,
        origin: SlotOrigin,
        patient: &PatientDetails,
    ) -> Result<SideEffectOutcome, SideEffectError> {
        let day = parse_date(date).ok_or_else(|| SideEffectError::InvalidDate(date.to_string()))?;

        let resolver = ShiftTabResolver::new(self.roster.clone(), self.filter.clone());
        let Some(tab) = resolver.resolve(day).await? else {
            warn!("No roster tab covers {}", date);
            return Ok(SideEffectOutcome::RosterTabNotFound);
        };

        let layout = RosterLayout::for_origin(origin);
        let rows = self.roster.read_rows(&tab).await?;
        let Some(row) = find_marker_row(&rows, date, time, layout, &self.keyword) else {
            warn!("No reserved marker for {} {} ({:?}) in {}", date, time, layout, tab);
            return Ok(SideEffectOutcome::RosterMarkerNotFound { tab });
        };

        let columns = layout.columns();
        let mut writes = vec![
            (columns.marker, patient.name.as_str()),
            (columns.birth_date, patient.birth_date.as_str()),
            (columns.reason, patient.reason.as_str()),
        ];
        if let Some(tag_column) = columns.app_tag {
            writes.push((tag_column, roster_cell::models::APP_TAG));
        }

        for (column, value) in writes {
            self.roster
                .write_cell(&tab, row, column, CellValue::text(value))
                .await?;
            debug!("{}!R{}C{} <- {}", tab, row, column, value);
        }

        info!("Roster filled at {} row {}", tab, row);
        Ok(SideEffectOutcome::RosterFilled { tab, row })
    }
}
