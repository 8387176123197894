//! DeepLynx wire types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Standard DeepLynx response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "isError", default)]
    pub is_error: bool,
    pub value: Option<T>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Container summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
}

/// Data source summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub container_id: Option<String>,
}

/// Data source creation body
#[derive(Debug, Clone, Serialize)]
pub struct CreateDataSource {
    pub name: String,
    pub adapter_type: String,
    pub active: bool,
}

/// File metadata as returned by the platform
#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub adapter_file_path: Option<String>,
    pub file_name: String,
}

/// Event action registered on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub container_id: Option<String>,
    pub data_source_id: Option<String>,
    pub event_type: String,
    pub action_type: String,
    #[serde(default)]
    pub action_value: Option<serde_json::Value>,
    pub destination: Option<String>,
    #[serde(default)]
    pub destination_data_source_id: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl EventAction {
    /// Whether `other` targets the same destination for the same event
    pub fn same_subscription(&self, other: &EventAction) -> bool {
        self.destination == other.destination
            && self.event_type == other.event_type
            && self.data_source_id == other.data_source_id
    }
}

/// Identifiers resolved at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSession {
    pub container_id: String,
    pub data_source_id: String,
}

/// A retrieved file ready to be read
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedFile {
    /// Path as reported by the platform; used for classification
    pub platform_path: String,
    /// Local path the content can be read from
    pub local_path: PathBuf,
    /// Original file name
    pub file_name: String,
}

/// Outcome of a manual import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportResult {
    pub reference: Option<String>,
}

impl ImportResult {
    /// Pull an import id out of a platform response value
    pub fn from_value(value: &serde_json::Value) -> Self {
        let id = match value {
            serde_json::Value::Array(items) => items.first().and_then(|v| v.get("id")),
            other => other.get("id"),
        };
        let reference = id.map(|id| match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Self { reference }
    }
}
