//! Google Sheets v4 REST client
//!
//! The document store is only reached through [`SheetsApi`], so the service
//! can be exercised against an in-memory document in tests.

use crate::config::SheetsConfig;
use crate::error::{Error, Result};
use crate::requests::Request;
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote spreadsheet operations the service needs.
pub trait SheetsApi {
    /// Apply `requests` atomically in one `batchUpdate` call.
    fn batch_update(&self, spreadsheet_id: &str, requests: &[Request]) -> Result<()>;

    /// Read the formatted values of an A1 range, row by row.
    fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;
}

#[derive(Serialize)]
struct BatchUpdateBody<'a> {
    requests: &'a [Request],
}

#[derive(Deserialize, Default)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Cells come back as strings, except when the sheet stores raw numbers.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client(timeout_secs: u64) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::RemoteApi(format!("failed to build http client: {}", e)))
    })
}

/// [`SheetsApi`] over HTTPS with a bearer OAuth access token.
pub struct HttpSheetsClient {
    client: &'static Client,
    api_base: String,
    access_token: String,
}

impl HttpSheetsClient {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        if config.access_token.is_empty() {
            return Err(Error::Config(
                "sheets.access_token is empty (set SHEETS_ACCESS_TOKEN)".to_string(),
            ));
        }
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> String {
        format!("{}/v4/spreadsheets/{}", self.api_base, spreadsheet_id)
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(Error::RemoteApi(format!("http {}: {}", status, body)))
}

impl SheetsApi for HttpSheetsClient {
    fn batch_update(&self, spreadsheet_id: &str, requests: &[Request]) -> Result<()> {
        let url = format!("{}:batchUpdate", self.spreadsheet_url(spreadsheet_id));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&BatchUpdateBody { requests })
            .send()?;
        check_status(response)?;
        Ok(())
    }

    fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!("{}/values/{}", self.spreadsheet_url(spreadsheet_id), range);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()?;
        let body: ValueRange = check_status(response)?.json()?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}
