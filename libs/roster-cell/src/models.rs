// libs/roster-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use slot_cell::{SlotError, SlotKey, SlotOrigin};

/// First roster row holding shift data; row 1 is the header.
pub const FIRST_ROSTER_ROW: usize = 2;

// ==============================================================================
// ROSTER LAYOUTS
// ==============================================================================

/// 1-based column positions of one roster layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutColumns {
    pub date: usize,
    pub time: usize,
    pub marker: usize,
    pub birth_date: usize,
    pub reason: usize,
    /// Column that receives the "booked via app" tag, when the layout has one.
    pub app_tag: Option<usize>,
}

/// The two column arrangements that coexist on a roster tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RosterLayout {
    /// C date, E time, F name, G birth date, H reason
    F,
    /// C date, M app tag, N time, O name, P birth date, Q reason
    O,
}

const F_COLUMNS: LayoutColumns = LayoutColumns {
    date: 3,
    time: 5,
    marker: 6,
    birth_date: 7,
    reason: 8,
    app_tag: None,
};

const O_COLUMNS: LayoutColumns = LayoutColumns {
    date: 3,
    time: 14,
    marker: 15,
    birth_date: 16,
    reason: 17,
    app_tag: Some(13),
};

pub const APP_TAG: &str = "App";

impl RosterLayout {
    pub const ALL: [RosterLayout; 2] = [RosterLayout::F, RosterLayout::O];

    pub fn columns(&self) -> &'static LayoutColumns {
        match self {
            RosterLayout::F => &F_COLUMNS,
            RosterLayout::O => &O_COLUMNS,
        }
    }

    pub fn origin(&self) -> SlotOrigin {
        match self {
            RosterLayout::F => SlotOrigin::F,
            RosterLayout::O => SlotOrigin::O,
        }
    }

    pub fn for_origin(origin: SlotOrigin) -> Self {
        match origin {
            SlotOrigin::F => RosterLayout::F,
            SlotOrigin::O => RosterLayout::O,
        }
    }

    /// Layouts whose marker column falls inside `first..=last`.
    pub fn touched_by(first: usize, last: usize) -> Vec<RosterLayout> {
        Self::ALL
            .into_iter()
            .filter(|layout| (first..=last).contains(&layout.columns().marker))
            .collect()
    }
}

/// A reserved marker found on a roster tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterMarker {
    pub tab: String,
    pub row: usize,
    pub date: String,
    pub time: String,
    pub layout: RosterLayout,
}

impl RosterMarker {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(&self.date, &self.time, self.layout.origin())
    }
}

// ==============================================================================
// EDIT NOTIFICATIONS
// ==============================================================================

fn one() -> usize {
    1
}

/// An edit on the roster workbook, as reported by the spreadsheet host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    /// Workbook the edit happened in, when the host reports it.
    #[serde(default)]
    pub source: Option<String>,
    pub sheet: String,
    pub row: usize,
    pub column: usize,
    #[serde(default = "one")]
    pub num_rows: usize,
    #[serde(default = "one")]
    pub num_columns: usize,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
}

impl EditEvent {
    pub fn single(sheet: &str, row: usize, column: usize, old: Option<&str>, new: Option<&str>) -> Self {
        Self {
            source: None,
            sheet: sheet.to_string(),
            row,
            column,
            num_rows: 1,
            num_columns: 1,
            old_value: old.map(str::to_string),
            new_value: new.map(str::to_string),
        }
    }

    pub fn range(sheet: &str, row: usize, column: usize, num_rows: usize, num_columns: usize) -> Self {
        Self {
            source: None,
            sheet: sheet.to_string(),
            row,
            column,
            num_rows: num_rows.max(1),
            num_columns: num_columns.max(1),
            old_value: None,
            new_value: None,
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.num_rows <= 1 && self.num_columns <= 1
    }

    pub fn last_row(&self) -> usize {
        self.row.saturating_add(self.num_rows.max(1) - 1)
    }

    pub fn last_column(&self) -> usize {
        self.column.saturating_add(self.num_columns.max(1) - 1)
    }
}

/// What one roster row asks of the slot sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAction {
    /// The marker became the reserved keyword.
    Upsert,
    /// The marker was removed; a still-free slot goes away.
    RemoveIfFree,
    /// The marker was overwritten with patient data outside the booking
    /// flow; the slot stays until booked or swept.
    KeepUntilSwept,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub row: usize,
    pub layout: RosterLayout,
    pub date: String,
    pub time: String,
    pub action: MarkerAction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EditReport {
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_reason: Option<String>,
    pub rows: Vec<RowOutcome>,
    pub skipped_rows: Vec<usize>,
    pub orphans_removed: usize,
    pub errors: Vec<String>,
}

impl EditReport {
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            ignored_reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub tabs_scanned: usize,
    pub markers_found: usize,
    pub slots_created: usize,
    pub slots_refreshed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub markers_found: usize,
    pub orphans_removed: Vec<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Roster unavailable: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("Roster scan incomplete: {}", .0.join("; "))]
    IncompleteScan(Vec<String>),
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Slot(slot) => slot.into(),
            ReconcileError::Store(StoreError::SheetNotFound(sheet)) => {
                AppError::Configuration(format!("Roster tab not found: {}", sheet))
            }
            ReconcileError::Store(StoreError::NotConfigured(msg)) => AppError::Configuration(msg),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_table_matches_the_roster() {
        assert_eq!(RosterLayout::F.columns().time, 5);
        assert_eq!(RosterLayout::F.columns().marker, 6);
        assert_eq!(RosterLayout::O.columns().time, 14);
        assert_eq!(RosterLayout::O.columns().marker, 15);
        assert_eq!(RosterLayout::O.columns().app_tag, Some(13));
        assert_eq!(RosterLayout::F.columns().app_tag, None);
    }

    #[test]
    fn layouts_map_to_origins_both_ways() {
        for layout in RosterLayout::ALL {
            assert_eq!(RosterLayout::for_origin(layout.origin()), layout);
        }
    }

    #[test]
    fn touched_layouts_follow_the_edited_span() {
        assert_eq!(RosterLayout::touched_by(6, 6), vec![RosterLayout::F]);
        assert_eq!(RosterLayout::touched_by(15, 15), vec![RosterLayout::O]);
        assert_eq!(RosterLayout::touched_by(1, 20), vec![RosterLayout::F, RosterLayout::O]);
        assert!(RosterLayout::touched_by(7, 14).is_empty());
    }

    #[test]
    fn edit_event_defaults_to_one_cell() {
        let event: EditEvent = serde_json::from_value(serde_json::json!({
            "sheet": "783 (08/12 - 12/12) B",
            "row": 4,
            "column": 6,
            "newValue": "reservado"
        }))
        .unwrap();

        assert!(event.is_single_cell());
        assert_eq!(event.last_row(), 4);
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("reservado"));
    }

    #[test]
    fn oversized_ranges_saturate() {
        let event = EditEvent::range("783 (08/12 - 12/12) B", 2, 6, usize::MAX, usize::MAX);
        assert_eq!(event.last_row(), usize::MAX);
        assert_eq!(event.last_column(), usize::MAX);
    }
}
