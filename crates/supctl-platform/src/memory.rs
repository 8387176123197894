//! In-memory platform for development and testing

use crate::client::PlatformApi;
use crate::error::{PlatformError, PlatformResult};
use crate::types::{DataSource, EventAction, ImportResult, PlatformSession, RetrievedFile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use supctl_core::ControlRequest;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Platform double that serves registered files and records imports
#[derive(Debug)]
pub struct InMemoryPlatform {
    session: PlatformSession,
    files: RwLock<HashMap<String, RetrievedFile>>,
    imports: RwLock<Vec<Vec<ControlRequest>>>,
    data_sources: RwLock<Vec<DataSource>>,
    actions: RwLock<Vec<EventAction>>,
    fail_imports: AtomicBool,
}

impl InMemoryPlatform {
    /// Create an empty platform
    pub fn new(session: PlatformSession) -> Self {
        Self {
            session,
            files: RwLock::new(HashMap::new()),
            imports: RwLock::new(Vec::new()),
            data_sources: RwLock::new(Vec::new()),
            actions: RwLock::new(Vec::new()),
            fail_imports: AtomicBool::new(false),
        }
    }

    /// Make `file` retrievable under `file_id`
    pub async fn add_file(&self, file_id: &str, file: RetrievedFile) {
        self.files.write().await.insert(file_id.to_string(), file);
    }

    /// Add a data source to the container
    pub async fn add_data_source(&self, name: &str) -> DataSource {
        let source = DataSource {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            container_id: Some(self.session.container_id.clone()),
        };
        self.data_sources.write().await.push(source.clone());
        source
    }

    /// Make subsequent imports fail
    pub fn set_fail_imports(&self, fail: bool) {
        self.fail_imports.store(fail, Ordering::SeqCst);
    }

    /// Every accepted import batch, oldest first
    pub async fn imports(&self) -> Vec<Vec<ControlRequest>> {
        self.imports.read().await.clone()
    }

    /// Registered event actions
    pub async fn event_actions(&self) -> Vec<EventAction> {
        self.actions.read().await.clone()
    }
}

#[async_trait]
impl PlatformApi for InMemoryPlatform {
    fn session(&self) -> &PlatformSession {
        &self.session
    }

    async fn retrieve_file(&self, file_id: &str) -> PlatformResult<RetrievedFile> {
        self.files
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("file {file_id}")))
    }

    async fn create_manual_import(&self, records: &[ControlRequest]) -> PlatformResult<ImportResult> {
        if self.fail_imports.load(Ordering::SeqCst) {
            return Err(PlatformError::Status {
                status: 503,
                body: "import service unavailable".to_string(),
            });
        }

        self.imports.write().await.push(records.to_vec());
        Ok(ImportResult {
            reference: Some(Uuid::new_v4().to_string()),
        })
    }

    async fn list_data_sources(&self) -> PlatformResult<Vec<DataSource>> {
        Ok(self.data_sources.read().await.clone())
    }

    async fn list_event_actions(&self) -> PlatformResult<Vec<EventAction>> {
        Ok(self.actions.read().await.clone())
    }

    async fn create_event_action(&self, action: &EventAction) -> PlatformResult<EventAction> {
        let mut created = action.clone();
        created.id = Some(Uuid::new_v4().to_string());
        self.actions.write().await.push(created.clone());
        Ok(created)
    }
}
