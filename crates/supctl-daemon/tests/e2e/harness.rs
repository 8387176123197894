//! Shared fixture: a daemon router over an in-memory platform and
//! temporary output directories.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use supctl_core::GateResetPolicy;
use supctl_daemon::server::prepare_directories;
use supctl_daemon::{DaemonConfig, Server};
use supctl_platform::{InMemoryPlatform, PlatformSession, RetrievedFile};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct Harness {
    pub dir: TempDir,
    pub config: DaemonConfig,
    pub platform: Arc<InMemoryPlatform>,
    pub router: Router,
}

pub fn config(root: &Path, policy: GateResetPolicy) -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.files.primary_pattern = "moose_".to_string();
    config.files.secondary_pattern = "ml_pred".to_string();
    config.files.primary_cache = root.join("cache/primary.csv");
    config.files.secondary_cache = root.join("cache/secondary.csv");
    config.columns.time = vec!["time".to_string()];
    config.columns.upper_skip = vec!["time".to_string()];
    config.columns.lower_include = vec!["TC-02".to_string()];
    config.limits.upper = 100.0;
    config.limits.lower = 10.0;
    config.control.adjustment = "80".to_string();
    config.control.mount_dir = root.join("mount");
    config.control.report_dir = root.join("reports");
    config.control.reset_policy = policy;
    config.platform.download_dir = root.join("downloads");
    config.registration.enabled = false;
    config
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_policy(GateResetPolicy::Never).await
    }

    pub async fn with_policy(policy: GateResetPolicy) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), policy);
        config.validate().unwrap();
        prepare_directories(&config).unwrap();

        let platform = Arc::new(InMemoryPlatform::new(PlatformSession {
            container_id: "12".to_string(),
            data_source_id: "34".to_string(),
        }));
        let server = Server::with_platform(config.clone(), platform.clone()).unwrap();
        let router = server.router();

        Self {
            dir,
            config,
            platform,
            router,
        }
    }

    /// Register a file on the platform, stored under the temp directory
    pub async fn add_file(&self, file_id: &str, name: &str, csv: &str) {
        let incoming = self.dir.path().join("incoming");
        std::fs::create_dir_all(&incoming).unwrap();
        let local_path = incoming.join(name);
        std::fs::write(&local_path, csv).unwrap();

        self.platform
            .add_file(
                file_id,
                RetrievedFile {
                    platform_path: format!("/adapter/{name}"),
                    local_path,
                    file_name: name.to_string(),
                },
            )
            .await;
    }

    /// POST a JSON notification to the webhook
    pub async fn notify(&self, payload: serde_json::Value) -> (StatusCode, Vec<u8>) {
        self.post(
            "/supervisorycontrol",
            Some("application/json"),
            payload.to_string(),
        )
        .await
    }

    /// POST a notification referencing `file_id`
    pub async fn notify_file(&self, file_id: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self
            .notify(serde_json::json!({
                "query": { "fileID": file_id },
                "containerID": "12"
            }))
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn post(
        &self,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Instruction artifacts written so far, sorted by name
    pub fn artifacts(&self) -> Vec<PathBuf> {
        list(&self.config.control.mount_dir)
    }

    /// Control request reports written so far, sorted by name
    pub fn reports(&self) -> Vec<PathBuf> {
        list(&self.config.control.report_dir)
    }
}

pub fn received() -> serde_json::Value {
    serde_json::json!({ "received": true })
}

fn list(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    paths
}
