// libs/slot-cell/src/services/registry.rs
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use shared_database::{cell_at, AppState, CellValue, Row, TabularStore};
use shared_utils::datetime::{dates_equal, normalize_date, normalize_time, parse_date, times_equal, weekday_name};

use crate::models::{
    AvailableSlot, RemoveOutcome, SlotError, SlotOrigin, SlotRow, SlotStatus, UpsertOutcome,
    ValidSlots, COL_DATE, COL_ORIGIN, COL_STATUS, COL_TIME, FIRST_DATA_ROW, STATUS_FREE,
};

/// CRUD over the free-slot sheet of the booking workbook.
pub struct SlotRegistry {
    store: Arc<dyn TabularStore>,
    sheet: String,
}

impl SlotRegistry {
    pub fn new(store: Arc<dyn TabularStore>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.workbooks.booking.clone(), &state.config.slots_sheet)
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Every data row that carries a date or a time.
    pub async fn rows(&self) -> Result<Vec<SlotRow>, SlotError> {
        let rows = self.store.read_rows(&self.sheet).await?;
        Ok(rows
            .iter()
            .enumerate()
            .skip(FIRST_DATA_ROW - 1)
            .filter_map(|(idx, row)| parse_row(idx + 1, row))
            .collect())
    }

    /// The row at `row_index`, if it is a data row.
    pub async fn get(&self, row_index: usize) -> Result<Option<SlotRow>, SlotError> {
        if row_index < FIRST_DATA_ROW {
            return Ok(None);
        }
        let row = self.store.read_row(&self.sheet, row_index).await?;
        Ok(row.and_then(|row| parse_row(row_index, &row)))
    }

    #[instrument(skip(self))]
    pub async fn list_free(&self) -> Result<Vec<AvailableSlot>, SlotError> {
        let slots: Vec<AvailableSlot> = self
            .rows()
            .await?
            .into_iter()
            .filter(|row| row.status.is_free())
            .map(|row| AvailableSlot {
                weekday: parse_date(&row.date)
                    .map(|date| weekday_name(date).to_string())
                    .unwrap_or_default(),
                row_index: row.row_index,
                date: row.date,
                time: row.time,
                origin: row.origin,
            })
            .collect();

        debug!("{} free slots in {}", slots.len(), self.sheet);
        Ok(slots)
    }

    /// Marks (date, time) free under `origin`, appending a row when none matches.
    #[instrument(skip(self))]
    pub async fn upsert_free(
        &self,
        date: &str,
        time: &str,
        origin: SlotOrigin,
    ) -> Result<UpsertOutcome, SlotError> {
        let existing = self
            .rows()
            .await?
            .into_iter()
            .find(|row| dates_equal(&row.date, date) && times_equal(&row.time, time));

        if let Some(row) = existing {
            self.store
                .write_cell(&self.sheet, row.row_index, COL_STATUS, CellValue::text(STATUS_FREE))
                .await?;
            self.store
                .write_cell(&self.sheet, row.row_index, COL_ORIGIN, CellValue::text(origin.as_str()))
                .await?;
            debug!("Slot {} {} refreshed at row {}", date, time, row.row_index);
            return Ok(UpsertOutcome::Refreshed { row_index: row.row_index });
        }

        let row_index = self
            .store
            .append_row(
                &self.sheet,
                vec![
                    CellValue::text(normalize_date(date)),
                    CellValue::text(normalize_time(time)),
                    CellValue::text(STATUS_FREE),
                    CellValue::text(origin.as_str()),
                ],
            )
            .await?;
        info!("Free slot created: {} {} ({}) at row {}", date, time, origin, row_index);
        Ok(UpsertOutcome::Created { row_index })
    }

    /// Deletes the last row matching (date, time) if it is still free.
    pub async fn remove_if_free(&self, date: &str, time: &str) -> Result<RemoveOutcome, SlotError> {
        self.remove_if_free_in(date, time, None).await
    }

    /// Like [`remove_if_free`](Self::remove_if_free), limited to rows of one origin.
    #[instrument(skip(self))]
    pub async fn remove_if_free_in(
        &self,
        date: &str,
        time: &str,
        origin: Option<SlotOrigin>,
    ) -> Result<RemoveOutcome, SlotError> {
        let rows = self.rows().await?;
        let Some(row) = rows.iter().rev().find(|row| {
            dates_equal(&row.date, date)
                && times_equal(&row.time, time)
                && origin.map_or(true, |origin| origin == row.origin)
        }) else {
            debug!("No slot row for {} {}", date, time);
            return Ok(RemoveOutcome::NotFound);
        };

        if let SlotStatus::Other(status) = &row.status {
            debug!("Slot {} {} is '{}', keeping row {}", date, time, status, row.row_index);
            return Ok(RemoveOutcome::Kept {
                row_index: row.row_index,
                status: status.clone(),
            });
        }

        if self.delete_if_unchanged(row).await? {
            info!("Free slot removed: {} {} (row {})", date, time, row.row_index);
            Ok(RemoveOutcome::Removed { row_index: row.row_index })
        } else {
            warn!("Slot row {} changed before it could be removed", row.row_index);
            Ok(RemoveOutcome::NotFound)
        }
    }

    /// Deletes every free row of `scope` (or of any origin) that `valid`
    /// does not contain. Rows are visited bottom-up so deletions never shift
    /// a row that is still to be examined.
    #[instrument(skip(self, valid), fields(valid = valid.len()))]
    pub async fn remove_orphans(
        &self,
        valid: &ValidSlots,
        scope: Option<SlotOrigin>,
    ) -> Result<Vec<SlotRow>, SlotError> {
        let rows = self.rows().await?;
        let mut removed = Vec::new();

        for row in rows.iter().rev() {
            if !row.status.is_free() {
                continue;
            }
            if scope.is_some_and(|origin| origin != row.origin) {
                continue;
            }
            if valid.contains(&row.date, &row.time, row.origin) {
                continue;
            }
            if self.delete_if_unchanged(row).await? {
                info!("Orphan slot removed: {} (row {})", row.key(), row.row_index);
                removed.push(row.clone());
            }
        }

        Ok(removed)
    }

    /// Consumes a free slot for booking. Fails with `Conflict` when the row
    /// is gone, was taken in the meantime, or no longer holds the date and
    /// time the caller picked. Rows shift up when one above them is deleted,
    /// so a bare row number is not enough to identify the slot.
    #[instrument(skip(self))]
    pub async fn consume(
        &self,
        row_index: usize,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<SlotRow, SlotError> {
        let row = match self.get(row_index).await? {
            Some(row) if row.status.is_free() => row,
            Some(row) => {
                warn!("Slot row {} is '{:?}', not free", row_index, row.status);
                return Err(SlotError::Conflict);
            }
            None => {
                warn!("Slot row {} does not exist", row_index);
                return Err(SlotError::Conflict);
            }
        };

        let same_date = date.map_or(true, |date| dates_equal(&row.date, date));
        let same_time = time.map_or(true, |time| times_equal(&row.time, time));
        if !(same_date && same_time) {
            warn!(
                "Slot row {} now holds {} {}, not the requested {:?} {:?}",
                row_index, row.date, row.time, date, time
            );
            return Err(SlotError::Conflict);
        }

        if !self.delete_if_unchanged(&row).await? {
            warn!("Slot row {} was taken before it could be consumed", row_index);
            return Err(SlotError::Conflict);
        }

        info!("Slot consumed: {} {} ({})", row.date, row.time, row.origin);
        Ok(row)
    }

    async fn delete_if_unchanged(&self, row: &SlotRow) -> Result<bool, SlotError> {
        let guard = [
            (COL_DATE, row.raw_date.as_str()),
            (COL_TIME, row.raw_time.as_str()),
            (COL_STATUS, STATUS_FREE),
        ];
        Ok(self.store.delete_row_if(&self.sheet, row.row_index, &guard).await?)
    }
}

fn parse_row(row_index: usize, row: &Row) -> Option<SlotRow> {
    let date_cell = cell_at(row, COL_DATE);
    let time_cell = cell_at(row, COL_TIME);
    if date_cell.is_empty() && time_cell.is_empty() {
        return None;
    }

    let origin_text = cell_at(row, COL_ORIGIN).display_value();
    let origin = SlotOrigin::from_cell(&origin_text).unwrap_or_else(|| {
        warn!("Unknown origin '{}' at slot row {}, reading as F", origin_text, row_index);
        SlotOrigin::F
    });

    Some(SlotRow {
        row_index,
        date: normalize_date(&date_cell.as_date_text()),
        time: normalize_time(&time_cell.as_time_text()),
        status: SlotStatus::from_cell(&cell_at(row, COL_STATUS).display_value()),
        origin,
        raw_date: date_cell.display_value(),
        raw_time: time_cell.display_value(),
    })
}
