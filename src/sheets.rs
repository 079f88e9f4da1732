//! Spreadsheet ingestion: the Google Sheets v4 values endpoint and local CSV
//! exports, both flattened into [`FollowerRecord`] tables.
//!
//! Column 0 is the date; every other header cell names an account. Blank or
//! non-numeric cells become missing observations, never zero.

use std::env;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::timeseries::{normalize_date, FollowerRecord};

pub const DEFAULT_CLIENTS_RANGE: &str = "clients!A:Z";
pub const DEFAULT_COMPETITORS_RANGE: &str = "competitors!A:Z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub api_key: String,
    pub clients_range: String,
    pub competitors_range: String,
}

impl SheetsConfig {
    pub fn from_env() -> Result<Self, SheetsError> {
        Ok(Self {
            spreadsheet_id: require_env("FLOCKBOARD_SHEET_ID")?,
            api_key: require_env("FLOCKBOARD_SHEETS_API_KEY")?,
            clients_range: env::var("FLOCKBOARD_CLIENTS_RANGE")
                .unwrap_or_else(|_| DEFAULT_CLIENTS_RANGE.to_string()),
            competitors_range: env::var("FLOCKBOARD_COMPETITORS_RANGE")
                .unwrap_or_else(|_| DEFAULT_COMPETITORS_RANGE.to_string()),
        })
    }
}

fn require_env(key: &'static str) -> Result<String, SheetsError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SheetsError::MissingEnv(key)),
    }
}

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("sheets request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheets request for {range} returned status {status}")]
    Status { range: String, status: u16 },
    #[error("no data rows in table {0}")]
    EmptyTable(String),
    #[error("header row has no date column")]
    MissingDateColumn,
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Fetches one range from the spreadsheet and parses it into records. A
/// failure here is fatal for the current refresh cycle only; the previous
/// snapshot file stays in place.
pub fn fetch_table(cfg: &SheetsConfig, range: &str) -> Result<Vec<FollowerRecord>, SheetsError> {
    let url = format!(
        "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
        cfg.spreadsheet_id, range
    );

    let client = reqwest::blocking::Client::new();
    let response = client
        .get(&url)
        .query(&[("key", cfg.api_key.as_str())])
        .send()?;

    if !response.status().is_success() {
        return Err(SheetsError::Status {
            range: range.to_string(),
            status: response.status().as_u16(),
        });
    }

    let value_range: ValueRange = response.json()?;
    let rows: Vec<Vec<String>> = value_range
        .values
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    info!(
        component = "sheets",
        event = "sheets.range_fetched",
        range = range,
        rows = rows.len()
    );

    records_from_rows(&rows, range)
}

/// Same table shape loaded from a local CSV export.
pub fn records_from_csv_path(path: &Path) -> Result<Vec<FollowerRecord>, SheetsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    records_from_rows(&rows, &path.display().to_string())
}

/// Header row plus data rows into records. Header cells that are blank are
/// skipped entirely so a ragged export cannot invent an unnamed account.
pub fn records_from_rows(
    rows: &[Vec<String>],
    table: &str,
) -> Result<Vec<FollowerRecord>, SheetsError> {
    let (header, data_rows) = rows
        .split_first()
        .ok_or_else(|| SheetsError::EmptyTable(table.to_string()))?;
    if header.is_empty() {
        return Err(SheetsError::MissingDateColumn);
    }
    if data_rows.is_empty() {
        return Err(SheetsError::EmptyTable(table.to_string()));
    }

    let accounts: Vec<Option<String>> = header
        .iter()
        .skip(1)
        .map(|cell| {
            let name = cell.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect();

    let mut records = Vec::with_capacity(data_rows.len());
    for row in data_rows {
        let raw_date = row.first().map(String::as_str).unwrap_or("");
        let mut record = FollowerRecord::new(normalize_date(raw_date));

        for (idx, account) in accounts.iter().enumerate() {
            let Some(account) = account else {
                continue;
            };
            let cell = row.get(idx + 1).map(String::as_str).unwrap_or("");
            record.values.insert(account.clone(), parse_cell(cell));
        }

        records.push(record);
    }

    Ok(records)
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn cell_text(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
