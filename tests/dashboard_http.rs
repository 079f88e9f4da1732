use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use flockboard::{
    dashboard_router, demo_snapshot, write_snapshot, DashboardOptions, FileSnapshotSource,
    InMemorySnapshotSource,
};
use tower::util::ServiceExt;

#[tokio::test]
async fn dashboard_page_serves_gated_html() {
    let source = Arc::new(InMemorySnapshotSource::demo());
    let app = dashboard_router(source, DashboardOptions::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("<table"));
    assert!(text.contains("login-overlay"));
    assert!(text.contains("flockboardAuth"));
    assert!(text.contains("tab-clients"));
    assert!(text.contains("tab-competitors"));
    assert!(text.contains("Best Performer"));
    assert!(text.contains("Needs Attention"));
    assert!(text.contains("Market Share"));
}

#[tokio::test]
async fn dashboard_page_embeds_the_configured_password() {
    let source = Arc::new(InMemorySnapshotSource::demo());
    let options = DashboardOptions {
        password: "swordfish".to_string(),
    };
    let app = dashboard_router(source, options);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("\"swordfish\""));
}

#[tokio::test]
async fn snapshot_endpoint_returns_the_full_wire_shape() {
    let source = Arc::new(InMemorySnapshotSource::demo());
    let app = dashboard_router(source, DashboardOptions::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["clients"]["data"].as_array().unwrap().len(), 6);
    assert!(json["clients"]["performers"]["best"]["account"].is_string());
    assert!(json["clients"]["performanceHistory"]["bestPerformer"].is_object());
    assert!(json["competitors"]["performers"]["worst"]["currentFollowers"].is_number());
    assert!(json["lastUpdated"].is_string());
    assert!(json["clients"]["data"][0]["Date"].is_string());
}

#[tokio::test]
async fn replaced_snapshot_is_visible_on_the_next_request() {
    let source = Arc::new(InMemorySnapshotSource::demo());
    let app = dashboard_router(source.clone(), DashboardOptions::default());

    let mut replacement = demo_snapshot();
    replacement.last_updated = "2030-01-01T00:00:00+00:00".to_string();
    source.replace_snapshot(replacement);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["lastUpdated"], "2030-01-01T00:00:00+00:00");
}

#[tokio::test]
async fn file_source_serves_last_good_snapshot_after_the_file_vanishes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("followers.json");

    let mut snapshot = demo_snapshot();
    snapshot.last_updated = "2024-06-01T00:00:00+00:00".to_string();
    write_snapshot(&path, &snapshot).unwrap();

    let source = Arc::new(FileSnapshotSource::load(&path).unwrap());
    std::fs::remove_file(&path).unwrap();

    let app = dashboard_router(source, DashboardOptions::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["lastUpdated"], "2024-06-01T00:00:00+00:00");
}
