use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Row = Vec<CellValue>;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A native date/time value held by a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temporal {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

/// Spreadsheet cells are loosely typed; everything that leaves the store is
/// one of these three shapes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Temporal(Temporal),
}

impl CellValue {
    /// Builds a cell from a formatted display string. Blank text is `Empty`.
    pub fn from_display(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::from_display(&value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Temporal(_) => false,
        }
    }

    /// What the spreadsheet UI would show for this cell.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Temporal(Temporal::Date(date)) => date.format("%d/%m/%Y").to_string(),
            CellValue::Temporal(Temporal::Time(time)) => time.format("%H:%M").to_string(),
            CellValue::Temporal(Temporal::DateTime(dt)) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        }
    }

    /// Date-flavoured reading: a date-time cell yields only its date.
    pub fn as_date_text(&self) -> String {
        match self {
            CellValue::Temporal(Temporal::DateTime(dt)) => dt.date().format("%d/%m/%Y").to_string(),
            other => other.display_value().trim().to_string(),
        }
    }

    /// Time-flavoured reading: a date-time cell yields only its time of day.
    pub fn as_time_text(&self) -> String {
        match self {
            CellValue::Temporal(Temporal::DateTime(dt)) => dt.time().format("%H:%M").to_string(),
            other => other.display_value().trim().to_string(),
        }
    }

    /// Case-insensitive comparison of the trimmed display value.
    pub fn matches_token(&self, token: &str) -> bool {
        self.display_value().trim().eq_ignore_ascii_case(token.trim())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_value())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::from_display(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from_display(&value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Temporal(Temporal::Date(value))
    }
}

impl From<NaiveTime> for CellValue {
    fn from(value: NaiveTime) -> Self {
        CellValue::Temporal(Temporal::Time(value))
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Temporal(Temporal::DateTime(value))
    }
}

/// 1-based column access; missing trailing cells read as `Empty`.
pub fn cell_at(row: &[CellValue], column: usize) -> &CellValue {
    if column == 0 {
        return &EMPTY_CELL;
    }
    row.get(column - 1).unwrap_or(&EMPTY_CELL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_empty() {
        assert_eq!(CellValue::from_display("   "), CellValue::Empty);
        assert!(CellValue::Text(" ".to_string()).is_empty());
    }

    #[test]
    fn temporal_cells_render_like_the_sheet() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 5).unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(CellValue::from(date).display_value(), "05/12/2025");
        assert_eq!(CellValue::from(time).display_value(), "09:00");

        let dt = date.and_time(time);
        assert_eq!(CellValue::from(dt).as_date_text(), "05/12/2025");
        assert_eq!(CellValue::from(dt).as_time_text(), "09:00");
    }

    #[test]
    fn cell_at_is_one_based_and_total() {
        let row = vec![CellValue::text("a"), CellValue::text("b")];
        assert_eq!(cell_at(&row, 1), &CellValue::text("a"));
        assert_eq!(cell_at(&row, 3), &CellValue::Empty);
        assert_eq!(cell_at(&row, 0), &CellValue::Empty);
    }

    #[test]
    fn token_matching_ignores_case_and_padding() {
        assert!(CellValue::text(" Livre ").matches_token("LIVRE"));
        assert!(!CellValue::text("ocupado").matches_token("LIVRE"));
    }
}
