use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cell::{CellValue, Row};
use crate::store::{guard_holds, StoreError, TabularStore};

/// In-process workbook. Every mutation runs under one write lock, so
/// `delete_row_if` is a true compare-and-delete here.
pub struct MemoryStore {
    workbook_id: String,
    sheets: RwLock<Vec<(String, Vec<Row>)>>,
}

impl MemoryStore {
    pub fn new(workbook_id: impl Into<String>) -> Self {
        Self {
            workbook_id: workbook_id.into(),
            sheets: RwLock::new(Vec::new()),
        }
    }

    /// Builder used at setup time, before the store is shared.
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        let name = name.into();
        let sheets = self.sheets.get_mut();
        match sheets.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing_rows)) => *existing_rows = rows,
            None => sheets.push((name, rows)),
        }
        self
    }

    pub async fn add_sheet(&self, name: impl Into<String>, rows: Vec<Row>) {
        let name = name.into();
        let mut sheets = self.sheets.write().await;
        match sheets.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing_rows)) => *existing_rows = rows,
            None => sheets.push((name, rows)),
        }
    }

    pub async fn remove_sheet(&self, name: &str) {
        self.sheets.write().await.retain(|(existing, _)| existing != name);
    }

    pub async fn row_count(&self, sheet: &str) -> usize {
        self.sheets
            .read()
            .await
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, rows)| rows.len())
            .unwrap_or(0)
    }
}

fn sheet_mut<'a>(
    sheets: &'a mut [(String, Vec<Row>)],
    sheet: &str,
) -> Result<&'a mut Vec<Row>, StoreError> {
    sheets
        .iter_mut()
        .find(|(name, _)| name == sheet)
        .map(|(_, rows)| rows)
        .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))
}

#[async_trait]
impl TabularStore for MemoryStore {
    fn workbook_id(&self) -> &str {
        &self.workbook_id
    }

    async fn sheet_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.sheets.read().await.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn has_sheet(&self, sheet: &str) -> Result<bool, StoreError> {
        Ok(self.sheets.read().await.iter().any(|(name, _)| name == sheet))
    }

    async fn read_rows(&self, sheet: &str) -> Result<Vec<Row>, StoreError> {
        self.sheets
            .read()
            .await
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))
    }

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Option<Row>, StoreError> {
        let sheets = self.sheets.read().await;
        let rows = sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, rows)| rows)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))?;
        Ok(row.checked_sub(1).and_then(|idx| rows.get(idx)).cloned())
    }

    async fn write_cell(
        &self,
        sheet: &str,
        row: usize,
        column: usize,
        value: CellValue,
    ) -> Result<(), StoreError> {
        if row == 0 || column == 0 {
            return Err(StoreError::RowOutOfRange { sheet: sheet.to_string(), row });
        }
        let mut sheets = self.sheets.write().await;
        let rows = sheet_mut(&mut sheets, sheet)?;
        if rows.len() < row {
            rows.resize_with(row, Vec::new);
        }
        let target = &mut rows[row - 1];
        if target.len() < column {
            target.resize_with(column, CellValue::default);
        }
        target[column - 1] = value;
        debug!("[{}] {}!R{}C{} written", self.workbook_id, sheet, row, column);
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Row) -> Result<usize, StoreError> {
        let mut sheets = self.sheets.write().await;
        let rows = sheet_mut(&mut sheets, sheet)?;
        rows.push(values);
        Ok(rows.len())
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError> {
        let mut sheets = self.sheets.write().await;
        let rows = sheet_mut(&mut sheets, sheet)?;
        if row == 0 || row > rows.len() {
            return Err(StoreError::RowOutOfRange { sheet: sheet.to_string(), row });
        }
        rows.remove(row - 1);
        debug!("[{}] {} row {} deleted", self.workbook_id, sheet, row);
        Ok(())
    }

    async fn delete_row_if(
        &self,
        sheet: &str,
        row: usize,
        guard: &[(usize, &str)],
    ) -> Result<bool, StoreError> {
        let mut sheets = self.sheets.write().await;
        let rows = sheet_mut(&mut sheets, sheet)?;
        let still_matches = row
            .checked_sub(1)
            .and_then(|idx| rows.get(idx))
            .map(|r| guard_holds(r, guard))
            .unwrap_or(false);
        if !still_matches {
            return Ok(false);
        }
        rows.remove(row - 1);
        Ok(true)
    }
}
