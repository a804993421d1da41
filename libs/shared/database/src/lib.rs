//! Tabular store abstraction: workbooks of named sheets addressed by
//! 1-based row and column, as the clinic's spreadsheets are.

pub mod cell;
pub mod memory;
pub mod sheets;
pub mod state;
pub mod store;
pub mod workbooks;

pub use cell::{cell_at, CellValue, Row, Temporal};
pub use memory::MemoryStore;
pub use sheets::{SheetsClient, SheetsStore};
pub use state::AppState;
pub use store::{StoreError, TabularStore};
pub use workbooks::{header_row, Workbooks, APPOINTMENTS_HEADER, SLOTS_HEADER, TRIAGE_HEADER};
