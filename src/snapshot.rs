//! Snapshot wire format shared by the refresh step and the dashboard.
//!
//! The JSON file written here is the contract between `sheets_sync` and the
//! dashboard server; field names (`Date`, `performers.best.account`,
//! `performanceHistory.bestPerformer`, `lastUpdated`, ...) must stay stable.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::timeseries::{
    build_history, entity_names, rank_performers, sort_records, FollowerRecord,
    PerformanceHistory, Performers,
};

/// Computed output for one table (clients or competitors).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub data: Vec<FollowerRecord>,
    pub performers: Performers,
    #[serde(rename = "performanceHistory")]
    pub performance_history: PerformanceHistory,
}

/// The persisted snapshot: both tables plus the refresh timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSnapshot {
    pub clients: TableSummary,
    pub competitors: TableSummary,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sorts the table and derives latest-pair performers plus the full
/// performance history. Fewer than two periods is a legitimate steady state:
/// performers stay `None` and the history stays empty.
pub fn summarize_table(records: Vec<FollowerRecord>) -> TableSummary {
    let mut data = records;
    sort_records(&mut data);

    let performers = match data.len() {
        0 | 1 => Performers::default(),
        len => rank_performers(&data[len - 1], &data[len - 2]),
    };
    let performance_history = build_history(&data);

    info!(
        component = "snapshot",
        event = "refresh.table_summarized",
        periods = data.len(),
        accounts = entity_names(&data).len(),
        has_best = performers.best.is_some(),
        has_worst = performers.worst.is_some()
    );

    TableSummary {
        data,
        performers,
        performance_history,
    }
}

pub fn write_snapshot(path: &Path, snapshot: &CombinedSnapshot) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<CombinedSnapshot, SnapshotError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
