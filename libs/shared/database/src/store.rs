use async_trait::async_trait;
use thiserror::Error;

use crate::cell::{cell_at, CellValue, Row};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Row {row} out of range in sheet {sheet}")]
    RowOutOfRange { sheet: String, row: usize },

    #[error("Store not configured: {0}")]
    NotConfigured(String),

    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Unexpected store response: {0}")]
    InvalidResponse(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Request(format!("{:#}", err))
    }
}

/// A workbook: named sheets of rows, rows and columns numbered from 1.
#[async_trait]
pub trait TabularStore: Send + Sync {
    fn workbook_id(&self) -> &str;

    /// Sheet names in workbook order.
    async fn sheet_names(&self) -> Result<Vec<String>, StoreError>;

    async fn has_sheet(&self, sheet: &str) -> Result<bool, StoreError> {
        Ok(self.sheet_names().await?.iter().any(|name| name == sheet))
    }

    /// Every row of the sheet, header included. Trailing empty cells may be absent.
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Row>, StoreError>;

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Option<Row>, StoreError> {
        if row == 0 {
            return Ok(None);
        }
        let rows = self.read_rows(sheet).await?;
        Ok(rows.into_iter().nth(row - 1))
    }

    async fn read_cell(&self, sheet: &str, row: usize, column: usize) -> Result<CellValue, StoreError> {
        Ok(self
            .read_row(sheet, row)
            .await?
            .map(|r| cell_at(&r, column).clone())
            .unwrap_or_default())
    }

    async fn write_cell(
        &self,
        sheet: &str,
        row: usize,
        column: usize,
        value: CellValue,
    ) -> Result<(), StoreError>;

    /// Appends after the last row and returns the new row number.
    async fn append_row(&self, sheet: &str, values: Row) -> Result<usize, StoreError>;

    /// Deletes the row; rows below shift up by one.
    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError>;

    /// Deletes `row` only while every `(column, expected)` guard still reads
    /// `expected` (trimmed, case-insensitive). Returns whether the row was deleted.
    async fn delete_row_if(
        &self,
        sheet: &str,
        row: usize,
        guard: &[(usize, &str)],
    ) -> Result<bool, StoreError> {
        let current = match self.read_row(sheet, row).await? {
            Some(current) => current,
            None => return Ok(false),
        };
        if !guard_holds(&current, guard) {
            return Ok(false);
        }
        self.delete_row(sheet, row).await?;
        Ok(true)
    }
}

pub fn guard_holds(row: &[CellValue], guard: &[(usize, &str)]) -> bool {
    guard
        .iter()
        .all(|(column, expected)| cell_at(row, *column).matches_token(expected))
}
