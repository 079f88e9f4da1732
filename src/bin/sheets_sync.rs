//! One-shot refresh: pull both tables from the spreadsheet, compute the
//! analytics summaries, and write the snapshot file the dashboard serves.

use std::path::Path;

use chrono::Utc;
use flockboard::{
    fetch_table, init_logging, log_app_start, log_refresh_complete, log_refresh_start,
    logging_config_from_env, summarize_table, write_snapshot, CombinedSnapshot, SheetsConfig,
};

const DEFAULT_SNAPSHOT_PATH: &str = "data/followers.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("sheets_sync", &logging_cfg);

    let cfg = SheetsConfig::from_env()?;
    log_refresh_start(&cfg.spreadsheet_id);

    let clients = fetch_table(&cfg, &cfg.clients_range)?;
    let competitors = fetch_table(&cfg, &cfg.competitors_range)?;

    let snapshot = CombinedSnapshot {
        clients: summarize_table(clients),
        competitors: summarize_table(competitors),
        last_updated: Utc::now().to_rfc3339(),
    };

    let path = std::env::var("FLOCKBOARD_SNAPSHOT_PATH")
        .unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string());
    write_snapshot(Path::new(&path), &snapshot)?;

    log_refresh_complete(
        &path,
        snapshot.clients.data.len(),
        snapshot.competitors.data.len(),
    );

    Ok(())
}
