// libs/roster-cell/src/services/reconciler.rs
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{AppState, Row, TabularStore};
use slot_cell::models::UpsertOutcome;
use slot_cell::{SlotKey, SlotRegistry, ValidSlots};

use crate::models::{
    CleanupReport, EditEvent, EditReport, MarkerAction, ReconcileError, RosterLayout, RowOutcome,
    SyncReport,
};
use crate::services::scanner::{date_for_row, is_keyword, marker_text, time_for_row, RosterScanner};
use crate::services::tabs::TabFilter;

/// Keeps the free-slot sheet in step with the reserved markers of the roster.
pub struct Reconciler {
    roster: Arc<dyn TabularStore>,
    registry: SlotRegistry,
    filter: TabFilter,
    keyword: String,
    remove_on_overwrite: bool,
}

impl Reconciler {
    pub fn new(config: &AppConfig, roster: Arc<dyn TabularStore>, registry: SlotRegistry) -> Self {
        Self {
            roster,
            registry,
            filter: TabFilter::from_config(config),
            keyword: config.reserved_keyword.clone(),
            remove_on_overwrite: config.remove_slot_on_marker_overwrite,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            &state.config,
            state.workbooks.roster.clone(),
            SlotRegistry::from_state(state),
        )
    }

    fn scanner(&self) -> RosterScanner {
        RosterScanner::new(self.roster.clone(), self.filter.clone(), self.keyword.clone())
    }

    /// Decides what a marker change means for the slot sheet. `old` is
    /// unknown for range edits.
    pub fn classify(&self, old: Option<&str>, new: &str) -> MarkerAction {
        let was_reserved = old.map(|value| is_keyword(value, &self.keyword));
        let now_reserved = is_keyword(new, &self.keyword);

        match (was_reserved, now_reserved) {
            (Some(true), true) => MarkerAction::None,
            (_, true) => MarkerAction::Upsert,
            (Some(false), false) => MarkerAction::None,
            (_, false) if new.trim().is_empty() => MarkerAction::RemoveIfFree,
            (_, false) if self.remove_on_overwrite => MarkerAction::RemoveIfFree,
            (_, false) => MarkerAction::KeepUntilSwept,
        }
    }

    /// Handles one edit notification. Failures are recorded in the report;
    /// nothing here fails the caller.
    #[instrument(skip(self, event), fields(sheet = %event.sheet, row = event.row, column = event.column))]
    pub async fn on_edit(&self, event: &EditEvent) -> EditReport {
        if let Some(source) = &event.source {
            if source != self.roster.workbook_id() {
                debug!("Edit from workbook {} ignored", source);
                return EditReport::ignored("edit comes from another workbook");
            }
        }
        if !self.filter.is_watched(&event.sheet) {
            return EditReport::ignored("tab is not a watched roster tab");
        }

        let mut report = EditReport {
            processed: true,
            ..EditReport::default()
        };

        // A date or time edit moves no marker but can leave a slot behind.
        let layouts = RosterLayout::touched_by(event.column, event.last_column());
        if layouts.is_empty() {
            for layout in RosterLayout::ALL {
                self.sweep(layout, &ValidSlots::new(), &mut report).await;
            }
            info!(
                "Edit on {} touched no marker, {} orphans removed",
                event.sheet, report.orphans_removed
            );
            return report;
        }

        let rows = match self.roster.read_rows(&event.sheet).await {
            Ok(rows) => rows,
            Err(err) => {
                error!("Failed to read roster tab {}: {}", event.sheet, err);
                report.errors.push(err.to_string());
                return report;
            }
        };

        // Rows past the end of the tab hold nothing to reconcile.
        let last_row = event.last_row().min(rows.len());
        for layout in layouts {
            let mut kept = ValidSlots::new();
            for row in event.row..=last_row {
                self.apply_row(event, &rows, row, layout, &mut kept, &mut report).await;
            }
            self.sweep(layout, &kept, &mut report).await;
        }

        info!(
            "Edit on {} reconciled: {} rows, {} orphans removed",
            event.sheet,
            report.rows.len(),
            report.orphans_removed
        );
        report
    }

    async fn apply_row(
        &self,
        event: &EditEvent,
        rows: &[Row],
        row: usize,
        layout: RosterLayout,
        kept: &mut ValidSlots,
        report: &mut EditReport,
    ) {
        let (old, new) = if event.is_single_cell() {
            let new = event
                .new_value
                .clone()
                .unwrap_or_else(|| marker_text(rows, row, layout));
            (event.old_value.as_deref(), new)
        } else {
            (None, marker_text(rows, row, layout))
        };

        let (Some(date), Some(time)) = (date_for_row(rows, row, layout), time_for_row(rows, row, layout)) else {
            warn!("Row {} of {} has no date or time, skipping", row, event.sheet);
            report.skipped_rows.push(row);
            return;
        };

        let action = self.classify(old, &new);
        let result = match action {
            MarkerAction::Upsert => self
                .registry
                .upsert_free(&date, &time, layout.origin())
                .await
                .map(|_| ()),
            MarkerAction::RemoveIfFree => self
                .registry
                .remove_if_free_in(&date, &time, Some(layout.origin()))
                .await
                .map(|_| ()),
            MarkerAction::KeepUntilSwept => {
                debug!("Marker at row {} overwritten, slot {} {} kept", row, date, time);
                kept.insert(SlotKey::new(&date, &time, layout.origin()));
                Ok(())
            }
            MarkerAction::None => Ok(()),
        };

        if let Err(err) = result {
            error!("Slot update for row {} failed: {}", row, err);
            report.errors.push(format!("row {}: {}", row, err));
        }

        report.rows.push(RowOutcome {
            row,
            layout,
            date,
            time,
            action,
        });
    }

    /// Removes free slots of `layout` left without a marker anywhere in the
    /// roster. Skipped when the roster could not be read in full.
    async fn sweep(&self, layout: RosterLayout, kept: &ValidSlots, report: &mut EditReport) {
        let scan = match self.scanner().scan().await {
            Ok(scan) if scan.is_complete() => scan,
            Ok(scan) => {
                warn!("Orphan sweep skipped, roster scan incomplete");
                report.errors.extend(scan.errors);
                return;
            }
            Err(err) => {
                warn!("Orphan sweep skipped: {}", err);
                report.errors.push(err.to_string());
                return;
            }
        };

        let mut valid = scan.valid_slots();
        for key in kept.iter() {
            valid.insert(key.clone());
        }

        match self.registry.remove_orphans(&valid, Some(layout.origin())).await {
            Ok(removed) => report.orphans_removed += removed.len(),
            Err(err) => {
                error!("Orphan sweep failed: {}", err);
                report.errors.push(err.to_string());
            }
        }
    }

    /// Upserts a free slot for every reserved marker on every watched tab.
    #[instrument(skip(self))]
    pub async fn full_sync(&self) -> Result<SyncReport, ReconcileError> {
        let scan = self.scanner().scan().await?;
        let mut report = SyncReport {
            tabs_scanned: scan.tabs.len(),
            markers_found: scan.markers.len(),
            errors: scan.errors.clone(),
            ..SyncReport::default()
        };

        for marker in &scan.markers {
            match self
                .registry
                .upsert_free(&marker.date, &marker.time, marker.layout.origin())
                .await
            {
                Ok(UpsertOutcome::Created { .. }) => report.slots_created += 1,
                Ok(UpsertOutcome::Refreshed { .. }) => report.slots_refreshed += 1,
                Err(err) => {
                    error!("Sync of {} row {} failed: {}", marker.tab, marker.row, err);
                    report.errors.push(format!("{} row {}: {}", marker.tab, marker.row, err));
                }
            }
        }

        info!(
            "Roster sync: {} markers, {} created, {} refreshed",
            report.markers_found, report.slots_created, report.slots_refreshed
        );
        Ok(report)
    }

    /// Removes every free slot, of either layout, with no marker behind it.
    #[instrument(skip(self))]
    pub async fn cleanup_orphans(&self) -> Result<CleanupReport, ReconcileError> {
        let scan = self.scanner().scan().await?;
        if !scan.is_complete() {
            return Err(ReconcileError::IncompleteScan(scan.errors));
        }

        let removed = self.registry.remove_orphans(&scan.valid_slots(), None).await?;
        info!("Orphan cleanup removed {} slots", removed.len());

        Ok(CleanupReport {
            markers_found: scan.markers.len(),
            orphans_removed: removed.iter().map(|row| row.key().to_string()).collect(),
        })
    }
}
