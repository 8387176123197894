//! End-to-end notification scenarios through the webhook.

use crate::harness::{received, Harness};
use axum::http::StatusCode;
use supctl_core::ControlRequest;

const UPPER_BREACH: &str = "time,TC-01,TC-02\n0,20,30\n1,40,50\n2,150,60\n";
const IN_BAND: &str = "time,TC-01,TC-02\n0,20,30\n1,40,50\n2,90,60\n";

#[tokio::test]
async fn primary_file_with_upper_breach_emits_one_control_request() {
    let h = Harness::new().await;
    h.add_file("101", "moose_run1.csv", UPPER_BREACH).await;

    let (status, body) = h.notify_file("101").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, received());

    // one artifact carrying the first sequence number
    let artifacts = h.artifacts();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].ends_with("control_request_1.txt"));
    assert_eq!(std::fs::read_to_string(&artifacts[0]).unwrap(), "80");

    // one manual import
    let imports = h.platform.imports().await;
    assert_eq!(imports.len(), 1);
    let request = &imports[0][0];
    assert_eq!(request.name, "upper limit");
    assert_eq!(request.threshold, 100.0);
    assert_eq!(request.value, 150.0);
    assert_eq!(request.primary_text, "TC-01");
    assert_eq!(request.event_date, "2.0");
    assert_eq!(request.file_name, "moose_run1.csv");

    // one report on the shared mount
    let reports = h.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].ends_with("Supervisory_Control_2.0.json"));
    let written: Vec<ControlRequest> =
        serde_json::from_slice(&std::fs::read(&reports[0]).unwrap()).unwrap();
    assert_eq!(written, vec![request.clone()]);

    // cached under the primary role
    assert!(h.config.files.primary_cache.exists());
    assert!(!h.config.files.secondary_cache.exists());
}

#[tokio::test]
async fn repeated_breach_is_acknowledged_but_not_emitted_again() {
    let h = Harness::new().await;
    h.add_file("101", "moose_run1.csv", UPPER_BREACH).await;

    assert_eq!(h.notify_file("101").await, (StatusCode::OK, received()));
    assert_eq!(h.notify_file("101").await, (StatusCode::OK, received()));

    assert_eq!(h.artifacts().len(), 1);
    assert_eq!(h.platform.imports().await.len(), 1);
    assert_eq!(h.reports().len(), 1);
}

#[tokio::test]
async fn non_tabular_file_is_ignored() {
    let h = Harness::new().await;
    h.add_file("102", "moose_notes.txt", UPPER_BREACH).await;

    assert_eq!(h.notify_file("102").await, (StatusCode::OK, received()));

    assert!(!h.config.files.primary_cache.exists());
    assert!(h.artifacts().is_empty());
    assert!(h.reports().is_empty());
    assert!(h.platform.imports().await.is_empty());
}

#[tokio::test]
async fn notification_without_file_reference_is_acknowledged() {
    let h = Harness::new().await;

    let (status, body) = h
        .notify(serde_json::json!({ "query": { "containerID": "12" } }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&body).unwrap(), received());
    assert!(h.platform.imports().await.is_empty());
}

#[tokio::test]
async fn values_within_band_emit_nothing() {
    let h = Harness::new().await;
    h.add_file("103", "moose_run2.csv", IN_BAND).await;

    assert_eq!(h.notify_file("103").await, (StatusCode::OK, received()));

    assert!(h.artifacts().is_empty());
    assert!(h.reports().is_empty());
    assert!(h.platform.imports().await.is_empty());

    let (_, status) = h.get("/api/v1/status").await;
    assert_eq!(status["gate"]["upper"], "idle");
    assert_eq!(status["gate"]["lower"], "idle");
    assert_eq!(status["next_sequence"], 1);
}

#[tokio::test]
async fn unrecognized_csv_is_ignored() {
    let h = Harness::new().await;
    h.add_file("104", "inventory.csv", UPPER_BREACH).await;

    assert_eq!(h.notify_file("104").await, (StatusCode::OK, received()));
    assert!(!h.config.files.primary_cache.exists());
    assert!(!h.config.files.secondary_cache.exists());
    assert!(h.artifacts().is_empty());
}

#[tokio::test]
async fn secondary_file_does_not_overwrite_primary_cache() {
    let h = Harness::new().await;
    h.add_file("1", "moose_run1.csv", IN_BAND).await;
    h.add_file("2", "ml_pred_run1.csv", "time,TC-01,TC-02\n0,1,30\n").await;

    h.notify_file("1").await;
    let primary = std::fs::read(&h.config.files.primary_cache).unwrap();

    h.notify_file("2").await;
    assert_eq!(std::fs::read(&h.config.files.primary_cache).unwrap(), primary);
    assert!(h.config.files.secondary_cache.exists());

    let (_, status) = h.get("/api/v1/status").await;
    assert_eq!(status["cached_roles"], serde_json::json!(["primary", "secondary"]));
}

#[tokio::test]
async fn non_json_content_type_is_rejected_with_plain_text() {
    let h = Harness::new().await;

    let (status, body) = h
        .post(
            "/supervisorycontrol",
            Some("text/plain"),
            r#"{"query":{"fileID":"1"}}"#.to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Unsupported Content Type. Please use application/json"
    );

    let (status, _) = h.post("/supervisorycontrol", None, "{}".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn charset_suffix_is_accepted() {
    let h = Harness::new().await;

    let (status, _) = h
        .post(
            "/supervisorycontrol",
            Some("application/json; charset=utf-8"),
            "{}".to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let h = Harness::new().await;

    let (status, _) = h
        .post("/supervisorycontrol", Some("application/json"), "{not json".to_string())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn retrieval_failure_is_acknowledged() {
    let h = Harness::new().await;

    assert_eq!(h.notify_file("does-not-exist").await, (StatusCode::OK, received()));
    assert!(h.artifacts().is_empty());
}

#[tokio::test]
async fn rejected_import_still_fires_the_gate() {
    let h = Harness::new().await;
    h.platform.set_fail_imports(true);
    h.add_file("101", "moose_run1.csv", UPPER_BREACH).await;

    assert_eq!(h.notify_file("101").await, (StatusCode::OK, received()));
    assert_eq!(h.artifacts().len(), 1);
    assert_eq!(h.reports().len(), 1);

    // no retry once the platform recovers
    h.platform.set_fail_imports(false);
    h.notify_file("101").await;
    assert!(h.platform.imports().await.is_empty());
    assert_eq!(h.artifacts().len(), 1);
}

#[tokio::test]
async fn non_numeric_selected_column_surfaces_as_server_error() {
    let h = Harness::new().await;
    h.add_file("105", "moose_bad.csv", "time,TC-01,status\n0,20,ok\n").await;

    let (status, body) = h.notify(serde_json::json!({ "query": { "fileID": "105" } })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "SCAN_ERROR");
    assert_eq!(error["details"]["column"], "status");
    assert!(h.artifacts().is_empty());

    // the daemon keeps serving
    let (status, _) = h.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
}
