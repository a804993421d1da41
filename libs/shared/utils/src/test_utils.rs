use std::sync::Arc;

use async_trait::async_trait;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{
    header_row, CellValue, MemoryStore, Row, StoreError, TabularStore, Workbooks,
    APPOINTMENTS_HEADER, SLOTS_HEADER, TRIAGE_HEADER,
};

pub struct TestConfig {
    pub team_token: String,
    pub tab_suffix: Option<String>,
    pub reserved_keyword: String,
    pub remove_slot_on_marker_overwrite: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            team_token: "783".to_string(),
            tab_suffix: Some("B".to_string()),
            reserved_keyword: "reservado".to_string(),
            remove_slot_on_marker_overwrite: false,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Memory,
            booking_workbook_id: "test-booking".to_string(),
            roster_workbook_id: "test-roster".to_string(),
            triage_workbook_id: "test-triage".to_string(),
            roster_team_token: self.team_token.clone(),
            roster_tab_suffix: self.tab_suffix.clone(),
            reserved_keyword: self.reserved_keyword.clone(),
            remove_slot_on_marker_overwrite: self.remove_slot_on_marker_overwrite,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// In-memory workbooks with handles to the concrete stores, so tests can
/// seed and inspect them.
pub struct TestWorkbooks {
    pub booking: Arc<MemoryStore>,
    pub roster: Arc<MemoryStore>,
    pub triage: Arc<MemoryStore>,
}

impl TestWorkbooks {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            booking: Arc::new(
                MemoryStore::new("test-booking")
                    .with_sheet(&config.slots_sheet, vec![header_row(&SLOTS_HEADER)])
                    .with_sheet(&config.appointments_sheet, vec![header_row(&APPOINTMENTS_HEADER)]),
            ),
            roster: Arc::new(MemoryStore::new("test-roster").with_sheet(
                format!("{} (modelo)", config.roster_team_token),
                vec![RosterRow::new().date("01/01").f("08:00", "reservado").build()],
            )),
            triage: Arc::new(
                MemoryStore::new("test-triage")
                    .with_sheet(&config.triage_sheet, vec![header_row(&TRIAGE_HEADER)]),
            ),
        }
    }

    pub fn workbooks(&self) -> Workbooks {
        Workbooks {
            booking: self.booking.clone(),
            roster: self.roster.clone(),
            triage: Some(self.triage.clone()),
        }
    }

    /// Same workbooks, but every roster call fails.
    pub fn workbooks_with_failing_roster(&self) -> Workbooks {
        Workbooks {
            booking: self.booking.clone(),
            roster: Arc::new(FailingStore::new("broken-roster")),
            triage: Some(self.triage.clone()),
        }
    }

    pub async fn seed_slot(&self, sheet: &str, date: &str, time: &str, status: &str, origin: &str) -> usize {
        self.booking
            .append_row(sheet, slot_row(date, time, status, origin))
            .await
            .expect("memory append")
    }
}

pub fn slot_row(date: &str, time: &str, status: &str, origin: &str) -> Row {
    vec![
        CellValue::text(date),
        CellValue::text(time),
        CellValue::text(status),
        CellValue::text(origin),
    ]
}

/// Roster tab name for the work week starting `monday` ("08/12").
pub fn roster_tab_name(team: &str, monday: &str, friday: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{} ({} - {}) {}", team, monday, friday, suffix),
        None => format!("{} ({} - {})", team, monday, friday),
    }
}

/// One roster line: date in C, F-layout time/marker in E/F,
/// O-layout time/marker in N/O.
#[derive(Default)]
pub struct RosterRow {
    cells: Vec<(usize, String)>,
}

impl RosterRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(mut self, date: &str) -> Self {
        self.cells.push((3, date.to_string()));
        self
    }

    pub fn f(mut self, time: &str, marker: &str) -> Self {
        self.cells.push((5, time.to_string()));
        self.cells.push((6, marker.to_string()));
        self
    }

    pub fn o(mut self, time: &str, marker: &str) -> Self {
        self.cells.push((14, time.to_string()));
        self.cells.push((15, marker.to_string()));
        self
    }

    pub fn cell(mut self, column: usize, value: &str) -> Self {
        self.cells.push((column, value.to_string()));
        self
    }

    pub fn build(self) -> Row {
        let width = self.cells.iter().map(|(col, _)| *col).max().unwrap_or(0);
        let mut row = vec![CellValue::Empty; width];
        for (column, value) in self.cells {
            row[column - 1] = CellValue::text(value);
        }
        row
    }
}

pub fn roster_header() -> Row {
    RosterRow::new()
        .cell(3, "Data")
        .cell(5, "Horário")
        .cell(6, "Paciente")
        .cell(13, "App")
        .cell(14, "Horário")
        .cell(15, "Paciente")
        .build()
}

/// A store that rejects every call.
pub struct FailingStore {
    id: String,
}

impl FailingStore {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        Err(StoreError::Request(format!("{}: forced failure", self.id)))
    }
}

#[async_trait]
impl TabularStore for FailingStore {
    fn workbook_id(&self) -> &str {
        &self.id
    }

    async fn sheet_names(&self) -> Result<Vec<String>, StoreError> {
        self.fail()
    }

    async fn read_rows(&self, _sheet: &str) -> Result<Vec<Row>, StoreError> {
        self.fail()
    }

    async fn write_cell(&self, _sheet: &str, _row: usize, _column: usize, _value: CellValue) -> Result<(), StoreError> {
        self.fail()
    }

    async fn append_row(&self, _sheet: &str, _values: Row) -> Result<usize, StoreError> {
        self.fail()
    }

    async fn delete_row(&self, _sheet: &str, _row: usize) -> Result<(), StoreError> {
        self.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.roster_team_token, "783");
        assert_eq!(config.reserved_keyword, "reservado");
    }

    #[test]
    fn roster_row_places_cells_by_column() {
        let row = RosterRow::new().date("12/12").f("09:00", "reservado").build();
        assert_eq!(row.len(), 6);
        assert_eq!(row[2], CellValue::text("12/12"));
        assert_eq!(row[4], CellValue::text("09:00"));
        assert_eq!(row[5], CellValue::text("reservado"));
        assert_eq!(row[3], CellValue::Empty);
    }

    #[test]
    fn roster_tab_names_follow_the_week_format() {
        assert_eq!(
            roster_tab_name("783", "08/12", "12/12", Some("B")),
            "783 (08/12 - 12/12) B"
        );
    }

    #[tokio::test]
    async fn failing_store_fails() {
        let store = FailingStore::new("x");
        assert!(store.read_rows("any").await.is_err());
        assert!(store.has_sheet("any").await.is_err());
    }
}
