//! Flockboard core crate.
//!
//! Implemented scope:
//! - follower time-series analytics (growth, ranking, performance history)
//! - snapshot wire format shared by the refresh step and the dashboard
//! - spreadsheet ingestion (Sheets values endpoint and local CSV exports)
//! - axum dashboard routes with pluggable snapshot sources

mod dashboard;
mod observability;
mod sheets;
mod snapshot;
mod timeseries;

pub use dashboard::{
    dashboard_router, demo_snapshot, render_dashboard_html, DashboardOptions, FileSnapshotSource,
    InMemorySnapshotSource, SnapshotSource, DEFAULT_DASHBOARD_PASSWORD,
};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_refresh_complete, log_refresh_start,
    log_source_selected, logging_config_from_env, LogFormat, LoggingConfig, LoggingInitError,
};
pub use sheets::{
    fetch_table, records_from_csv_path, records_from_rows, SheetsConfig, SheetsError,
    DEFAULT_CLIENTS_RANGE, DEFAULT_COMPETITORS_RANGE,
};
pub use snapshot::{
    read_snapshot, summarize_table, write_snapshot, CombinedSnapshot, SnapshotError, TableSummary,
};
pub use timeseries::{
    absolute_change, average_growth, build_history, entity_names, group_by_month, group_by_week,
    growth_between, growth_series, market_share, normalize_date, parse_date, rank_performers,
    sort_records, trend, FollowerRecord, PerformanceHistory, Performer, Performers,
};
