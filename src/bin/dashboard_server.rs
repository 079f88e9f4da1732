use std::{net::SocketAddr, sync::Arc};

use flockboard::{
    dashboard_router, init_logging, log_app_bind, log_app_start, log_source_selected,
    logging_config_from_env, DashboardOptions, FileSnapshotSource, InMemorySnapshotSource,
    SnapshotSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("dashboard_server", &logging_cfg);

    let addr: SocketAddr = std::env::var("FLOCKBOARD_DASHBOARD_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let source = source_from_env()?;
    let app = dashboard_router(source, DashboardOptions::from_env());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn source_from_env() -> Result<Arc<dyn SnapshotSource>, Box<dyn std::error::Error>> {
    match std::env::var("FLOCKBOARD_SNAPSHOT_PATH") {
        Ok(path) if !path.trim().is_empty() => {
            let source = FileSnapshotSource::load(path.trim())?;
            log_source_selected("snapshot_file", None, Some(path.trim()));
            Ok(Arc::new(source))
        }
        _ => {
            log_source_selected("demo", Some("FLOCKBOARD_SNAPSHOT_PATH unset"), None);
            Ok(Arc::new(InMemorySnapshotSource::demo()))
        }
    }
}
