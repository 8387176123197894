//! Health, status and gate reset endpoints.

use crate::harness::Harness;
use axum::http::StatusCode;

const UPPER_BREACH: &str = "time,TC-01\n0,150\n";
const LOWER_BREACH: &str = "time,TC-01,TC-02\n0,20,5\n";

#[tokio::test]
async fn health_reports_version() {
    let h = Harness::new().await;

    let (status, body) = h.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn status_reflects_emissions() {
    let h = Harness::new().await;
    h.add_file("1", "moose_1.csv", UPPER_BREACH).await;
    h.notify_file("1").await;

    let (status, body) = h.get("/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gate"]["upper"], "fired");
    assert_eq!(body["gate"]["lower"], "idle");
    assert_eq!(body["next_sequence"], 2);
    assert_eq!(body["reset_policy"], "never");
    assert_eq!(body["cached_roles"], serde_json::json!(["primary"]));
}

#[tokio::test]
async fn reset_rearms_one_track() {
    let h = Harness::new().await;
    h.add_file("u", "moose_u.csv", UPPER_BREACH).await;
    h.add_file("l", "moose_l.csv", LOWER_BREACH).await;
    h.notify_file("u").await;
    h.notify_file("l").await;

    let (status, body) = h
        .post(
            "/api/v1/gate/reset",
            Some("application/json"),
            r#"{"kind":"upper"}"#.to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["rearmed"], serde_json::json!(["upper"]));
    assert_eq!(body["gate"]["upper"], "idle");
    assert_eq!(body["gate"]["lower"], "fired");

    // the next breach fires again with a fresh sequence number
    h.notify_file("u").await;
    assert_eq!(h.platform.imports().await.len(), 3);
    assert!(h.artifacts()[2].ends_with("control_request_3.txt"));
}

#[tokio::test]
async fn empty_reset_rearms_both_tracks() {
    let h = Harness::new().await;
    h.add_file("u", "moose_u.csv", UPPER_BREACH).await;
    h.notify_file("u").await;

    let (status, body) = h.post("/api/v1/gate/reset", None, String::new()).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["rearmed"], serde_json::json!(["upper"]));
    assert_eq!(body["gate"], serde_json::json!({"upper": "idle", "lower": "idle"}));
}

#[tokio::test]
async fn reset_with_unknown_kind_is_rejected() {
    let h = Harness::new().await;

    let (status, _) = h
        .post(
            "/api/v1/gate/reset",
            Some("application/json"),
            r#"{"kind":"sideways"}"#.to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
