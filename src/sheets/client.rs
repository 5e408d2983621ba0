use crate::tabular::{column_name, read_csv_bytes, table_from_values, Table};
use crate::utils::{Result, SheetsConfig, TranslatorError};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Header occupies row 1; translated data starts on row 2.
pub const DATA_START_ROW: u32 = 2;

/// A single cell write, addressed with 1-based row and column numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellUpdate {
    pub row: u32,
    pub col: u32,
    pub value: String,
}

/// Maps result `i` to `(start_row + i, target_index + 1)`.
pub fn cell_updates(results: &[String], target_index: usize, start_row: u32) -> Vec<CellUpdate> {
    let col = target_index as u32 + 1;
    results
        .iter()
        .enumerate()
        .map(|(i, value)| CellUpdate {
            row: start_row + i as u32,
            col,
            value: value.clone(),
        })
        .collect()
}

/// A1 reference of one cell on a named worksheet, e.g. `'Sheet 1'!E2`.
pub fn a1_cell(worksheet: &str, row: u32, col: u32) -> String {
    format!(
        "{}!{}{}",
        quote_worksheet(worksheet),
        column_name(col.saturating_sub(1) as usize),
        row
    )
}

fn quote_worksheet(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

#[derive(Debug, Clone)]
pub struct RemoteSheet {
    pub sheet_id: String,
    /// Resolved worksheet title; `None` for a public CSV export.
    pub worksheet: Option<String>,
    pub table: Table,
}

impl RemoteSheet {
    pub fn is_writable(&self) -> bool {
        self.worksheet.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest<'a> {
    value_input_option: &'a str,
    data: Vec<RangeValues>,
}

#[derive(Debug, Serialize)]
struct RangeValues {
    range: String,
    values: Vec<Vec<String>>,
}

#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    api_base: String,
    export_base: String,
    access_token: Option<String>,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            export_base: config.export_base.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Whether results can be written back to the sheet.
    pub fn can_write(&self) -> bool {
        self.access_token.is_some()
    }

    /// Loads a sheet: through the Sheets API when a token is configured, otherwise from the
    /// public CSV export (read-only).
    pub async fn open(&self, sheet_id: &str, worksheet: Option<&str>) -> Result<RemoteSheet> {
        match &self.access_token {
            Some(token) => {
                let title = match worksheet {
                    Some(name) => name.to_string(),
                    None => self.first_worksheet_title(sheet_id, token).await?,
                };
                let values = self.fetch_values(sheet_id, &title, token).await?;
                info!(sheet_id, worksheet = %title, rows = values.len(), "Loaded sheet via API");
                Ok(RemoteSheet {
                    sheet_id: sheet_id.to_string(),
                    worksheet: Some(title),
                    table: table_from_values(values),
                })
            }
            None => {
                if let Some(name) = worksheet {
                    warn!(worksheet = name, "No access token; public export always reads the first worksheet");
                }
                let table = self.fetch_public_csv(sheet_id).await?;
                info!(sheet_id, rows = table.row_count(), "Loaded public sheet export");
                Ok(RemoteSheet {
                    sheet_id: sheet_id.to_string(),
                    worksheet: None,
                    table,
                })
            }
        }
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| TranslatorError::ConfigError(format!("invalid sheets api base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| TranslatorError::ConfigError("sheets api base cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn first_worksheet_title(&self, sheet_id: &str, token: &str) -> Result<String> {
        let url = self.api_url(&["v4", "spreadsheets", sheet_id])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .map_err(source_unreachable)?;

        let metadata: SpreadsheetMetadata = read_json(response).await.map_err(source_unreachable)?;
        metadata
            .sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| TranslatorError::SourceUnreachable("spreadsheet has no worksheets".to_string()))
    }

    async fn fetch_values(&self, sheet_id: &str, worksheet: &str, token: &str) -> Result<Vec<Vec<String>>> {
        let range = quote_worksheet(worksheet);
        let url = self.api_url(&["v4", "spreadsheets", sheet_id, "values", &range])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(source_unreachable)?;

        let range: ValueRange = read_json(response).await.map_err(source_unreachable)?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(json_cell).collect())
            .collect())
    }

    async fn fetch_public_csv(&self, sheet_id: &str) -> Result<Table> {
        let url = format!("{}/spreadsheets/d/{}/export?format=csv", self.export_base, sheet_id);
        let response = self.client.get(&url).send().await.map_err(source_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslatorError::SourceUnreachable(format!(
                "export returned {}; is the sheet shared with anyone who has the link?",
                status
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            return Err(TranslatorError::SourceUnreachable(
                "export returned a web page instead of CSV; the sheet is probably private".to_string(),
            ));
        }

        let bytes = response.bytes().await.map_err(source_unreachable)?;
        read_csv_bytes(&bytes).map_err(source_unreachable)
    }

    /// Writes all updates with a single `values:batchUpdate` call.
    pub async fn write_cells(&self, sheet_id: &str, worksheet: &str, updates: &[CellUpdate]) -> Result<()> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| TranslatorError::SinkWriteFailure("no access token configured".to_string()))?;

        if updates.is_empty() {
            return Ok(());
        }

        let request = BatchUpdateRequest {
            value_input_option: "RAW",
            data: updates
                .iter()
                .map(|u| RangeValues {
                    range: a1_cell(worksheet, u.row, u.col),
                    values: vec![vec![u.value.clone()]],
                })
                .collect(),
        };

        let url = self
            .api_url(&["v4", "spreadsheets", sheet_id, "values:batchUpdate"])
            .map_err(sink_failure)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(sink_failure)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslatorError::SinkWriteFailure(format!(
                "batchUpdate returned {}: {}",
                status, body
            )));
        }

        info!(sheet_id, worksheet, cells = updates.len(), "Wrote translations back to sheet");
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(TranslatorError::ApiError(format!("API returned {}: {}", status, body)));
    }
    Ok(response.json().await?)
}

fn json_cell(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn source_unreachable(e: impl Into<TranslatorError>) -> TranslatorError {
    match e.into() {
        err @ TranslatorError::SourceUnreachable(_) => err,
        err => TranslatorError::SourceUnreachable(err.to_string()),
    }
}

fn sink_failure(e: impl Into<TranslatorError>) -> TranslatorError {
    match e.into() {
        err @ TranslatorError::SinkWriteFailure(_) => err,
        err => TranslatorError::SinkWriteFailure(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer, token: Option<&str>) -> SheetsClient {
        let config = SheetsConfig {
            api_base: server.base_url(),
            export_base: server.base_url(),
            ..SheetsConfig::default()
        };
        SheetsClient::new(&config, token.map(str::to_string), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn updates_are_addressed_from_row_two() {
        let results = vec!["안녕".to_string(), String::new(), "세상".to_string()];
        let updates = cell_updates(&results, 4, DATA_START_ROW);

        assert_eq!(updates.len(), 3);
        for (i, update) in updates.iter().enumerate() {
            assert_eq!(update.row, 2 + i as u32);
            assert_eq!(update.col, 5);
            assert_eq!(update.value, results[i]);
        }
    }

    #[test]
    fn a1_cells_quote_worksheet_names() {
        assert_eq!(a1_cell("Sheet1", 2, 5), "'Sheet1'!E2");
        assert_eq!(a1_cell("Bob's data", 10, 27), "'Bob''s data'!AA10");
    }

    #[tokio::test]
    async fn public_sheets_load_from_csv_export() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/spreadsheets/d/abc123/export")
                    .query_param("format", "csv");
                then.status(200)
                    .header("content-type", "text/csv")
                    .body("id,en\n1,Hello\n2,World\n");
            })
            .await;

        let sheet = client(&server, None).open("abc123", None).await.unwrap();
        assert!(!sheet.is_writable());
        assert_eq!(sheet.table.column(1), vec!["Hello", "World"]);
    }

    #[tokio::test]
    async fn private_export_is_source_unreachable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/spreadsheets/d/secret/export");
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body("<html>Sign in</html>");
            })
            .await;

        let err = client(&server, None).open("secret", None).await.unwrap_err();
        assert!(matches!(err, TranslatorError::SourceUnreachable(_)));
    }

    #[tokio::test]
    async fn authenticated_open_resolves_first_worksheet() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/abc123")
                    .header("authorization", "Bearer tok");
                then.status(200).json_body(serde_json::json!({
                    "sheets": [{"properties": {"title": "Lessons"}}, {"properties": {"title": "Other"}}]
                }));
            })
            .await;
        let values = server
            .mock_async(|when, then| {
                when.method(GET).path("/v4/spreadsheets/abc123/values/'Lessons'");
                then.status(200).json_body(serde_json::json!({
                    "range": "Lessons!A1:B3",
                    "values": [["id", "en"], ["1", "Hello"], [2]]
                }));
            })
            .await;

        let sheet = client(&server, Some("tok")).open("abc123", None).await.unwrap();
        values.assert_async().await;
        assert_eq!(sheet.worksheet.as_deref(), Some("Lessons"));
        assert_eq!(sheet.table.rows()[1], vec!["2", ""]);
    }

    #[tokio::test]
    async fn write_cells_sends_one_batch_update() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v4/spreadsheets/abc123/values:batchUpdate")
                    .header("authorization", "Bearer tok")
                    .json_body(serde_json::json!({
                        "valueInputOption": "RAW",
                        "data": [
                            {"range": "'Sheet1'!E2", "values": [["안녕"]]},
                            {"range": "'Sheet1'!E3", "values": [[""]]}
                        ]
                    }));
                then.status(200).json_body(serde_json::json!({"totalUpdatedCells": 2}));
            })
            .await;

        let updates = cell_updates(&["안녕".to_string(), String::new()], 4, DATA_START_ROW);
        client(&server, Some("tok"))
            .write_cells("abc123", "Sheet1", &updates)
            .await
            .unwrap();

        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn rejected_write_is_a_sink_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(403).body("The caller does not have permission");
            })
            .await;

        let updates = cell_updates(&["x".to_string()], 0, DATA_START_ROW);
        let err = client(&server, Some("tok"))
            .write_cells("abc123", "Sheet1", &updates)
            .await
            .unwrap_err();

        assert!(matches!(err, TranslatorError::SinkWriteFailure(ref m) if m.contains("403")));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn writing_without_token_fails() {
        let server = MockServer::start_async().await;
        let err = client(&server, None)
            .write_cells("abc123", "Sheet1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TranslatorError::SinkWriteFailure(_)));
    }
}
