// libs/roster-cell/src/services/scanner.rs
use std::sync::Arc;

use tracing::{debug, warn};

use shared_database::{cell_at, Row, TabularStore};
use shared_utils::datetime::{day_month, normalize_date, normalize_time, times_equal};
use slot_cell::ValidSlots;

use crate::models::{RosterLayout, RosterMarker, FIRST_ROSTER_ROW};
use crate::services::tabs::TabFilter;

/// Date of `row`, inherited from the nearest non-empty date cell above it
/// when the date cell is merged across several time rows.
pub fn date_for_row(rows: &[Row], row: usize, layout: RosterLayout) -> Option<String> {
    let column = layout.columns().date;
    (FIRST_ROSTER_ROW..=row)
        .rev()
        .filter_map(|r| rows.get(r - 1))
        .map(|cells| cell_at(cells, column).as_date_text())
        .find(|text| !text.is_empty())
}

pub fn time_for_row(rows: &[Row], row: usize, layout: RosterLayout) -> Option<String> {
    let text = rows
        .get(row.checked_sub(1)?)
        .map(|cells| cell_at(cells, layout.columns().time).as_time_text())?;
    (!text.is_empty()).then_some(text)
}

pub fn marker_text(rows: &[Row], row: usize, layout: RosterLayout) -> String {
    row.checked_sub(1)
        .and_then(|idx| rows.get(idx))
        .map(|cells| cell_at(cells, layout.columns().marker).display_value())
        .unwrap_or_default()
}

pub fn is_keyword(value: &str, keyword: &str) -> bool {
    value.trim().to_lowercase() == keyword.trim().to_lowercase()
}

/// Every reserved marker of one tab, under both layouts.
pub fn collect_markers(tab: &str, rows: &[Row], keyword: &str) -> Vec<RosterMarker> {
    let mut markers = Vec::new();
    let mut last_date = String::new();

    for (idx, cells) in rows.iter().enumerate().skip(FIRST_ROSTER_ROW - 1) {
        let date_text = cell_at(cells, RosterLayout::F.columns().date).as_date_text();
        if !date_text.is_empty() {
            last_date = date_text;
        }
        if last_date.is_empty() {
            continue;
        }

        for layout in RosterLayout::ALL {
            let columns = layout.columns();
            let time = cell_at(cells, columns.time).as_time_text();
            if time.is_empty() || !cell_at(cells, columns.marker).matches_token(keyword) {
                continue;
            }
            markers.push(RosterMarker {
                tab: tab.to_string(),
                row: idx + 1,
                date: normalize_date(&last_date),
                time: normalize_time(&time),
                layout,
            });
        }
    }

    markers
}

/// First row of `layout` still holding the reserved keyword at the given
/// date (`dd/mm/yyyy`, compared by day and month) and time.
pub fn find_marker_row(
    rows: &[Row],
    date: &str,
    time: &str,
    layout: RosterLayout,
    keyword: &str,
) -> Option<usize> {
    let target = day_month(date)?;
    let columns = layout.columns();
    let mut last_date = String::new();

    for (idx, cells) in rows.iter().enumerate() {
        let date_text = cell_at(cells, columns.date).as_date_text();
        if !date_text.is_empty() {
            last_date = date_text;
        }
        if !cell_at(cells, columns.marker).matches_token(keyword) {
            continue;
        }
        if !times_equal(&cell_at(cells, columns.time).as_time_text(), time) {
            continue;
        }
        if day_month(&last_date) == Some(target) {
            debug!("Marker for {} {} ({:?}) at row {}", date, time, layout, idx + 1);
            return Some(idx + 1);
        }
    }

    None
}

/// Markers across every watched tab of the roster.
#[derive(Debug, Default)]
pub struct RosterScan {
    pub tabs: Vec<String>,
    pub markers: Vec<RosterMarker>,
    pub errors: Vec<String>,
}

impl RosterScan {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn valid_slots(&self) -> ValidSlots {
        self.markers.iter().map(RosterMarker::key).collect()
    }
}

pub struct RosterScanner {
    store: Arc<dyn TabularStore>,
    filter: TabFilter,
    keyword: String,
}

impl RosterScanner {
    pub fn new(store: Arc<dyn TabularStore>, filter: TabFilter, keyword: impl Into<String>) -> Self {
        Self {
            store,
            filter,
            keyword: keyword.into(),
        }
    }

    /// Reads every watched tab. A tab that fails to load is recorded in
    /// `errors` and the rest are still scanned; listing the tabs failing is
    /// an error of its own.
    pub async fn scan(&self) -> Result<RosterScan, shared_database::StoreError> {
        let mut scan = RosterScan::default();

        for tab in self.store.sheet_names().await? {
            if !self.filter.is_watched(&tab) {
                debug!("Tab ignored: {}", tab);
                continue;
            }
            match self.store.read_rows(&tab).await {
                Ok(rows) => {
                    let found = collect_markers(&tab, &rows, &self.keyword);
                    debug!("{} reserved markers in {}", found.len(), tab);
                    scan.markers.extend(found);
                    scan.tabs.push(tab);
                }
                Err(err) => {
                    warn!("Failed to read roster tab {}: {}", tab, err);
                    scan.errors.push(format!("{}: {}", tab, err));
                }
            }
        }

        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::{roster_header, RosterRow};

    fn sample_tab() -> Vec<Row> {
        vec![
            roster_header(),
            RosterRow::new().date("12/12").f("08:00", "Maria").o("08:00", "reservado").build(),
            RosterRow::new().f("9:00", "reservado").build(),
            RosterRow::new().f("10:00", "RESERVADO ").build(),
            RosterRow::new().date("15/12").f("09:00", "reservado").build(),
            RosterRow::new().f("", "reservado").build(),
        ]
    }

    #[test]
    fn markers_inherit_merged_dates_and_keep_their_layout() {
        let markers = collect_markers("tab", &sample_tab(), "reservado");
        let summary: Vec<_> = markers
            .iter()
            .map(|m| (m.row, &m.date[..5], m.time.as_str(), m.layout))
            .collect();

        assert_eq!(
            summary,
            vec![
                (2, "12/12", "08:00", RosterLayout::O),
                (3, "12/12", "09:00", RosterLayout::F),
                (4, "12/12", "10:00", RosterLayout::F),
                (5, "15/12", "09:00", RosterLayout::F),
            ]
        );
    }

    #[test]
    fn template_header_row_is_not_scanned() {
        let rows = vec![RosterRow::new().date("01/01").f("08:00", "reservado").build()];
        assert!(collect_markers("tab", &rows, "reservado").is_empty());
    }

    #[test]
    fn date_walks_up_to_the_merged_cell() {
        let rows = sample_tab();
        assert_eq!(date_for_row(&rows, 4, RosterLayout::F).as_deref(), Some("12/12"));
        assert_eq!(date_for_row(&rows, 5, RosterLayout::F).as_deref(), Some("15/12"));
        assert_eq!(date_for_row(&rows, 1, RosterLayout::F), None);
        assert_eq!(time_for_row(&rows, 6, RosterLayout::F), None);
        assert_eq!(time_for_row(&rows, 3, RosterLayout::F).as_deref(), Some("9:00"));
    }

    #[test]
    fn marker_row_search_tolerates_leading_zeros() {
        let rows = sample_tab();
        assert_eq!(find_marker_row(&rows, "12/12/2025", "09:00", RosterLayout::F, "reservado"), Some(3));
        assert_eq!(find_marker_row(&rows, "12/12/2025", "8:00", RosterLayout::O, "reservado"), Some(2));
        // Row 2 of the F layout holds a patient, not the keyword.
        assert_eq!(find_marker_row(&rows, "12/12/2025", "08:00", RosterLayout::F, "reservado"), None);
        assert_eq!(find_marker_row(&rows, "13/12/2025", "09:00", RosterLayout::F, "reservado"), None);
    }
}
