use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::cell::{CellValue, Row};
use crate::store::{StoreError, TabularStore};

/// Thin REST client for the Google Sheets v4 API.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SheetsClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.sheets_api_base_url, &config.sheets_api_token)
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !self.token.is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.token))?,
            );
        }
        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url).headers(self.get_headers()?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Sheets API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

/// Column number to A1 letters (1 -> A, 27 -> AA).
pub fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn quoted_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Row number out of an A1 range such as `'Horarios'!A5:D5`.
fn first_row_of_range(range: &str) -> Option<usize> {
    let cells = range.rsplit('!').next()?;
    let first = cells.split(':').next()?;
    first
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$')
        .parse()
        .ok()
}

/// One spreadsheet reached through [`SheetsClient`].
pub struct SheetsStore {
    client: Arc<SheetsClient>,
    spreadsheet_id: String,
    sheet_ids: RwLock<HashMap<String, i64>>,
}

impl SheetsStore {
    pub fn new(client: Arc<SheetsClient>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_ids: RwLock::new(HashMap::new()),
        }
    }

    fn values_path(&self, range: &str) -> String {
        format!(
            "/v4/spreadsheets/{}/values/{}",
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    fn ensure_configured(&self) -> Result<(), StoreError> {
        if self.spreadsheet_id.is_empty() {
            return Err(StoreError::NotConfigured("spreadsheet id is empty".to_string()));
        }
        Ok(())
    }

    async fn refresh_sheet_ids(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_configured()?;
        let path = format!(
            "/v4/spreadsheets/{}?fields=sheets.properties(sheetId,title)",
            self.spreadsheet_id
        );
        let response: Value = self.client.request(Method::GET, &path, None).await?;

        let sheets = response["sheets"]
            .as_array()
            .ok_or_else(|| StoreError::InvalidResponse("missing sheets array".to_string()))?;

        let mut names = Vec::with_capacity(sheets.len());
        let mut ids = HashMap::with_capacity(sheets.len());
        for sheet in sheets {
            let props = &sheet["properties"];
            let title = props["title"]
                .as_str()
                .ok_or_else(|| StoreError::InvalidResponse("sheet without title".to_string()))?;
            ids.insert(title.to_string(), props["sheetId"].as_i64().unwrap_or_default());
            names.push(title.to_string());
        }

        *self.sheet_ids.write().await = ids;
        Ok(names)
    }

    async fn sheet_id(&self, sheet: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.sheet_ids.read().await.get(sheet) {
            return Ok(*id);
        }
        self.refresh_sheet_ids().await?;
        self.sheet_ids
            .read()
            .await
            .get(sheet)
            .copied()
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))
    }

    fn parse_rows(response: &Value) -> Vec<Row> {
        response["values"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| cells.iter().map(json_to_cell).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::String(text) => CellValue::from_display(text),
        other => CellValue::from_display(&other.to_string()),
    }
}

#[async_trait]
impl TabularStore for SheetsStore {
    fn workbook_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn sheet_names(&self) -> Result<Vec<String>, StoreError> {
        self.refresh_sheet_ids().await
    }

    async fn read_rows(&self, sheet: &str) -> Result<Vec<Row>, StoreError> {
        self.sheet_id(sheet).await?;
        let path = format!(
            "{}?valueRenderOption=FORMATTED_VALUE",
            self.values_path(&quoted_sheet(sheet))
        );
        let response: Value = self.client.request(Method::GET, &path, None).await?;
        Ok(Self::parse_rows(&response))
    }

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Option<Row>, StoreError> {
        if row == 0 {
            return Ok(None);
        }
        self.sheet_id(sheet).await?;
        let range = format!("{}!{}:{}", quoted_sheet(sheet), row, row);
        let path = format!("{}?valueRenderOption=FORMATTED_VALUE", self.values_path(&range));
        let response: Value = self.client.request(Method::GET, &path, None).await?;
        Ok(Self::parse_rows(&response).into_iter().next())
    }

    async fn write_cell(
        &self,
        sheet: &str,
        row: usize,
        column: usize,
        value: CellValue,
    ) -> Result<(), StoreError> {
        self.ensure_configured()?;
        let range = format!("{}!{}{}", quoted_sheet(sheet), column_letters(column), row);
        let path = format!("{}?valueInputOption=USER_ENTERED", self.values_path(&range));
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value.display_value()]]
        });
        let _: Value = self.client.request(Method::PUT, &path, Some(body)).await?;
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Row) -> Result<usize, StoreError> {
        self.ensure_configured()?;
        let range = format!("{}!A1", quoted_sheet(sheet));
        let path = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_path(&range)
        );
        let cells: Vec<String> = values.iter().map(CellValue::display_value).collect();
        let body = json!({ "majorDimension": "ROWS", "values": [cells] });

        let response: Value = self.client.request(Method::POST, &path, Some(body)).await?;
        response["updates"]["updatedRange"]
            .as_str()
            .and_then(first_row_of_range)
            .ok_or_else(|| StoreError::InvalidResponse("append without updatedRange".to_string()))
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError> {
        if row == 0 {
            return Err(StoreError::RowOutOfRange { sheet: sheet.to_string(), row });
        }
        let sheet_id = self.sheet_id(sheet).await?;
        let path = format!("/v4/spreadsheets/{}:batchUpdate", self.spreadsheet_id);
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row
                    }
                }
            }]
        });
        let _: Value = self.client.request(Method::POST, &path, Some(body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_cover_double_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(6), "F");
        assert_eq!(column_letters(15), "O");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
    }

    #[test]
    fn updated_range_row_is_extracted() {
        assert_eq!(first_row_of_range("'Horarios'!A5:D5"), Some(5));
        assert_eq!(first_row_of_range("Horarios!A12"), Some(12));
        assert_eq!(first_row_of_range("garbage"), None);
    }

    #[test]
    fn sheet_names_are_quoted_for_a1() {
        assert_eq!(quoted_sheet("783 (08/12 - 12/12) B"), "'783 (08/12 - 12/12) B'");
        assert_eq!(quoted_sheet("it's"), "'it''s'");
    }
}
