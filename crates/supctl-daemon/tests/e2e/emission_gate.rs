//! One-shot emission across notifications, concurrent deliveries and the
//! re-arm policies.

use crate::harness::{received, Harness};
use axum::http::StatusCode;
use supctl_core::GateResetPolicy;

const UPPER_BREACH: &str = "time,TC-01,TC-02\n0,20,30\n1,40,50\n2,150,60\n";
const LOWER_BREACH: &str = "time,TC-01,TC-02\n0,20,30\n1,40,5\n";
const BOTH_BREACH: &str = "time,TC-01,TC-02\n0,20,5\n1,140,30\n";
const IN_BAND: &str = "time,TC-01,TC-02\n0,20,30\n";

#[tokio::test]
async fn lower_track_fires_independently_of_upper() {
    let h = Harness::new().await;
    h.add_file("u", "moose_u.csv", UPPER_BREACH).await;
    h.add_file("l", "moose_l.csv", LOWER_BREACH).await;

    h.notify_file("u").await;
    h.notify_file("l").await;
    h.notify_file("l").await;

    let imports = h.platform.imports().await;
    let names: Vec<&str> = imports.iter().map(|batch| batch[0].name.as_str()).collect();
    assert_eq!(names, vec!["upper limit", "lower limit"]);

    let lower = &imports[1][0];
    assert_eq!(lower.threshold, 10.0);
    assert_eq!(lower.value, 5.0);
    assert_eq!(lower.primary_text, "TC-02");
    assert!(lower.instruction.starts_with("Lower limit 10 threshold exceeded. Raise power to 80"));

    let artifacts = h.artifacts();
    assert_eq!(artifacts.len(), 2);
    assert!(artifacts[0].ends_with("control_request_1.txt"));
    assert!(artifacts[1].ends_with("control_request_2.txt"));
}

#[tokio::test]
async fn upper_breach_masks_lower_breach_in_same_file() {
    let h = Harness::new().await;
    h.add_file("b", "moose_b.csv", BOTH_BREACH).await;

    h.notify_file("b").await;

    let imports = h.platform.imports().await;
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0][0].name, "upper limit");

    let (_, status) = h.get("/api/v1/status").await;
    assert_eq!(status["gate"]["upper"], "fired");
    assert_eq!(status["gate"]["lower"], "idle");
}

#[tokio::test]
async fn concurrent_notifications_fire_once() {
    let h = Harness::new().await;
    h.add_file("101", "moose_run1.csv", UPPER_BREACH).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = h.router.clone();
        handles.push(tokio::spawn(async move {
            use tower::ServiceExt;
            let request = axum::http::Request::builder()
                .method("POST")
                .uri("/supervisorycontrol")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(r#"{"query":{"fileID":"101"}}"#))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(h.artifacts().len(), 1);
    assert_eq!(h.platform.imports().await.len(), 1);
    assert_eq!(h.reports().len(), 1);
}

#[tokio::test]
async fn never_policy_stays_fired_after_clearing() {
    let h = Harness::new().await;
    h.add_file("hot", "moose_hot.csv", UPPER_BREACH).await;
    h.add_file("ok", "moose_ok.csv", IN_BAND).await;

    h.notify_file("hot").await;
    h.notify_file("ok").await;
    h.notify_file("hot").await;

    assert_eq!(h.platform.imports().await.len(), 1);
}

#[tokio::test]
async fn on_clear_policy_realerts_after_recovery() {
    let h = Harness::with_policy(GateResetPolicy::OnClear).await;
    h.add_file("hot", "moose_hot.csv", UPPER_BREACH).await;
    h.add_file("ok", "moose_ok.csv", IN_BAND).await;

    assert_eq!(h.notify_file("hot").await, (StatusCode::OK, received()));
    h.notify_file("hot").await;
    assert_eq!(h.platform.imports().await.len(), 1);

    h.notify_file("ok").await;
    h.notify_file("hot").await;

    assert_eq!(h.platform.imports().await.len(), 2);
    let artifacts = h.artifacts();
    assert!(artifacts[1].ends_with("control_request_2.txt"));
}
