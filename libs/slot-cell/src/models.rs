// libs/slot-cell/src/models.rs
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_utils::datetime::{dates_equal, normalize_date, normalize_time, times_equal};

/// Status text of a slot still waiting for a patient.
pub const STATUS_FREE: &str = "LIVRE";

// "Horarios" columns, 1-based. Data rows start below the header.
pub const COL_DATE: usize = 1;
pub const COL_TIME: usize = 2;
pub const COL_STATUS: usize = 3;
pub const COL_ORIGIN: usize = 4;
pub const FIRST_DATA_ROW: usize = 2;

// ==============================================================================
// ORIGIN
// ==============================================================================

/// Roster column layout a slot was derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotOrigin {
    /// Also what older rows without an origin belong to.
    #[default]
    F,
    O,
}

impl SlotOrigin {
    pub const ALL: [SlotOrigin; 2] = [SlotOrigin::F, SlotOrigin::O];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotOrigin::F => "F",
            SlotOrigin::O => "O",
        }
    }

    /// Reads an origin cell. Rows written before origins existed carry
    /// nothing and belong to the F layout.
    pub fn from_cell(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "F" => Some(SlotOrigin::F),
            "O" => Some(SlotOrigin::O),
            _ => None,
        }
    }

    /// Who attends slots of this layout.
    pub fn professional_role(&self) -> &'static str {
        match self {
            SlotOrigin::F => "médico",
            SlotOrigin::O => "enfermeira",
        }
    }
}

impl fmt::Display for SlotOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// SLOT ROWS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    Free,
    Other(String),
}

impl SlotStatus {
    pub fn from_cell(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case(STATUS_FREE) {
            SlotStatus::Free
        } else {
            SlotStatus::Other(raw.trim().to_string())
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, SlotStatus::Free)
    }
}

/// One data row of the slot sheet as it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRow {
    pub row_index: usize,
    /// Canonical `dd/mm/yyyy`, or the raw text when unparseable.
    pub date: String,
    /// Canonical `HH:mm`, or the raw text when unparseable.
    pub time: String,
    pub status: SlotStatus,
    pub origin: SlotOrigin,
    /// Cell text exactly as stored, used to guard conditional deletes.
    pub raw_date: String,
    pub raw_time: String,
}

impl SlotRow {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(&self.date, &self.time, self.origin)
    }
}

/// Wire shape of `GET ?action=getSlots`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlot {
    #[serde(rename = "rowIndex")]
    pub row_index: usize,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "diaSemana")]
    pub weekday: String,
    #[serde(rename = "origem", default)]
    pub origin: SlotOrigin,
}

// ==============================================================================
// SLOT KEYS
// ==============================================================================

/// A (date, time, origin) triple in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub date: String,
    pub time: String,
    pub origin: SlotOrigin,
}

impl SlotKey {
    pub fn new(date: &str, time: &str, origin: SlotOrigin) -> Self {
        Self {
            date: normalize_date(date),
            time: normalize_time(time),
            origin,
        }
    }

    /// Leading-zero tolerant match; origins never cross-match.
    pub fn matches(&self, date: &str, time: &str, origin: SlotOrigin) -> bool {
        self.origin == origin && dates_equal(&self.date, date) && times_equal(&self.time, time)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.date, self.time, self.origin)
    }
}

/// The set of slots the roster currently backs with a reserved marker.
#[derive(Debug, Clone, Default)]
pub struct ValidSlots {
    keys: Vec<SlotKey>,
}

impl ValidSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SlotKey) -> bool {
        if self.contains(&key.date, &key.time, key.origin) {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn contains(&self, date: &str, time: &str, origin: SlotOrigin) -> bool {
        self.keys.iter().any(|key| key.matches(date, time, origin))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotKey> {
        self.keys.iter()
    }
}

impl FromIterator<SlotKey> for ValidSlots {
    fn from_iter<I: IntoIterator<Item = SlotKey>>(iter: I) -> Self {
        let mut slots = ValidSlots::new();
        for key in iter {
            slots.insert(key);
        }
        slots
    }
}

// ==============================================================================
// OUTCOMES & ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { row_index: usize },
    Refreshed { row_index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed { row_index: usize },
    /// A matching row exists but is no longer free; it is left alone.
    Kept { row_index: usize, status: String },
    NotFound,
}

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Slot sheet unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Esse horário acabou de ser ocupado. Por favor, escolha outro.")]
    Conflict,
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::Conflict => AppError::Conflict(err.to_string()),
            SlotError::Store(StoreError::SheetNotFound(sheet)) => {
                AppError::Configuration(format!("A aba \"{}\" não foi encontrada na planilha.", sheet))
            }
            SlotError::Store(StoreError::NotConfigured(msg)) => AppError::Configuration(msg),
            SlotError::Store(other) => AppError::ExternalService(other.to_string()),
        }
    }
}
