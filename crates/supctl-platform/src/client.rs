//! Platform API trait and the DeepLynx REST client

use crate::error::{PlatformError, PlatformResult};
use crate::retry::RetryPolicy;
use crate::types::{
    Container, CreateDataSource, DataSource, Envelope, EventAction, FileMetadata, ImportResult,
    PlatformSession, RetrievedFile,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use supctl_core::ControlRequest;

/// Operations the supervisory daemon needs from the platform
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Identifiers of the container and own data source
    fn session(&self) -> &PlatformSession;

    /// Locate a file and make its content readable locally
    async fn retrieve_file(&self, file_id: &str) -> PlatformResult<RetrievedFile>;

    /// Submit records as a manual import into the own data source
    async fn create_manual_import(&self, records: &[ControlRequest]) -> PlatformResult<ImportResult>;

    /// Data sources of the container
    async fn list_data_sources(&self) -> PlatformResult<Vec<DataSource>>;

    /// All registered event actions
    async fn list_event_actions(&self) -> PlatformResult<Vec<EventAction>>;

    /// Register a new event action
    async fn create_event_action(&self, action: &EventAction) -> PlatformResult<EventAction>;
}

/// Connection settings for the DeepLynx client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Platform base URL
    pub base_url: String,

    /// API key; token authentication is used only when this is non-empty
    #[serde(default)]
    pub api_key: Option<String>,

    /// API secret
    #[serde(default)]
    pub api_secret: Option<String>,

    /// Requested token lifetime
    #[serde(default = "default_token_expiry")]
    pub token_expiry: String,

    /// Container to operate in
    pub container_name: String,

    /// Own data source, created when missing
    pub data_source_name: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retry policy for idempotent calls; manual imports are sent once
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Where files not visible on the local filesystem are downloaded
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_token_expiry() -> String {
    "12h".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            api_key: None,
            api_secret: None,
            token_expiry: default_token_expiry(),
            container_name: String::new(),
            data_source_name: String::new(),
            request_timeout_secs: default_request_timeout(),
            retry: RetryPolicy::default(),
            download_dir: default_download_dir(),
        }
    }
}

/// DeepLynx REST client bound to one container and data source
#[derive(Debug, Clone)]
pub struct DeepLynxClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    retry: RetryPolicy,
    download_dir: PathBuf,
    session: PlatformSession,
}

impl DeepLynxClient {
    /// Authenticate, then resolve the container and data source by name.
    pub async fn connect(config: &ClientConfig) -> PlatformResult<Self> {
        url::Url::parse(&config.base_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let mut client = Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
            retry: config.retry.clone(),
            download_dir: config.download_dir.clone(),
            session: PlatformSession {
                container_id: String::new(),
                data_source_id: String::new(),
            },
        };

        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let secret = config.api_secret.as_deref().unwrap_or_default();
            client.token = Some(client.authenticate(key, secret, &config.token_expiry).await?);
            tracing::info!("Authenticated with platform");
        }

        let container = client.find_container(&config.container_name).await?;
        client.session.container_id = container.id;

        let data_source = client.find_or_create_data_source(&config.data_source_name).await?;
        client.session.data_source_id = data_source.id;

        tracing::info!(
            container_id = %client.session.container_id,
            data_source_id = %client.session.data_source_id,
            "Connected to platform"
        );
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn authenticate(&self, key: &str, secret: &str, expiry: &str) -> PlatformResult<String> {
        let url = self.url("/oauth/token");
        let text = self
            .retry
            .run("authenticate", || async {
                let resp = self
                    .http
                    .get(&url)
                    .header("x-api-key", key)
                    .header("x-api-secret", secret)
                    .header("x-api-expiry", expiry)
                    .send()
                    .await?;
                read_body(resp).await
            })
            .await?;

        let text = String::from_utf8_lossy(&text);
        Ok(serde_json::from_str::<String>(&text).unwrap_or_else(|_| text.trim().to_string()))
    }

    /// Send a request built by `build`, retrying per policy, and unwrap the
    /// response envelope.
    async fn call<T, F>(&self, operation: &str, build: F) -> PlatformResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let body = self
            .retry
            .run(operation, || async {
                let resp = self.with_auth(build()).send().await?;
                read_body(resp).await
            })
            .await?;
        unwrap_envelope(operation, &body)
    }

    /// Send a request exactly once. Used for non-idempotent submissions,
    /// where a timed out attempt may already have been accepted.
    async fn call_once<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> PlatformResult<T> {
        let resp = self.with_auth(request).send().await?;
        let body = read_body(resp).await?;
        unwrap_envelope(operation, &body)
    }

    async fn find_container(&self, name: &str) -> PlatformResult<Container> {
        let url = self.url("/containers");
        let containers: Vec<Container> = self.call("list_containers", || self.http.get(&url)).await?;
        containers
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PlatformError::NotFound(format!("container '{name}'")))
    }

    async fn find_or_create_data_source(&self, name: &str) -> PlatformResult<DataSource> {
        if let Some(existing) = self
            .list_data_sources()
            .await?
            .into_iter()
            .find(|ds| ds.name == name)
        {
            return Ok(existing);
        }

        tracing::info!(data_source = name, "Creating data source");
        let url = self.datasources_url();
        let body = CreateDataSource {
            name: name.to_string(),
            adapter_type: "standard".to_string(),
            active: true,
        };
        self.call("create_data_source", || self.http.post(&url).json(&body))
            .await
    }

    fn datasources_url(&self) -> String {
        self.url(&format!(
            "/containers/{}/import/datasources",
            self.session.container_id
        ))
    }

    /// Fetch file content into `download_dir/<file_id>/<base name>`
    async fn download(&self, file_id: &str, file_name: &str) -> PlatformResult<PathBuf> {
        let id_dir = plain_component(file_id)
            .ok_or_else(|| PlatformError::Decode(format!("unusable file id '{file_id}'")))?;
        let base_name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| PlatformError::Decode(format!("unusable file name '{file_name}'")))?;

        let url = self.url(&format!(
            "/containers/{}/files/{}/download",
            self.session.container_id, file_id
        ));
        let bytes = self
            .retry
            .run("download_file", || async {
                let resp = self.with_auth(self.http.get(&url)).send().await?;
                read_body(resp).await
            })
            .await?;

        let dir = self.download_dir.join(id_dir);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(base_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// `s` when it is a single normal path component
fn plain_component(s: &str) -> Option<&str> {
    let mut components = Path::new(s).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(s),
        _ => None,
    }
}

#[async_trait]
impl PlatformApi for DeepLynxClient {
    fn session(&self) -> &PlatformSession {
        &self.session
    }

    async fn retrieve_file(&self, file_id: &str) -> PlatformResult<RetrievedFile> {
        let url = self.url(&format!(
            "/containers/{}/files/{}",
            self.session.container_id, file_id
        ));
        let meta: FileMetadata = self.call("retrieve_file", || self.http.get(&url)).await?;

        let platform_path = format!(
            "{}{}",
            meta.adapter_file_path.as_deref().unwrap_or_default(),
            meta.file_name
        );

        let local_path = if Path::new(&platform_path).is_file() {
            PathBuf::from(&platform_path)
        } else {
            tracing::debug!(file_id, path = %platform_path, "File not visible locally, downloading");
            self.download(file_id, &meta.file_name).await?
        };

        Ok(RetrievedFile {
            platform_path,
            local_path,
            file_name: meta.file_name,
        })
    }

    async fn create_manual_import(&self, records: &[ControlRequest]) -> PlatformResult<ImportResult> {
        let url = self.url(&format!(
            "/containers/{}/import/datasources/{}/imports",
            self.session.container_id, self.session.data_source_id
        ));
        let value: serde_json::Value = self
            .call_once("create_manual_import", self.http.post(&url).json(records))
            .await?;
        Ok(ImportResult::from_value(&value))
    }

    async fn list_data_sources(&self) -> PlatformResult<Vec<DataSource>> {
        let url = self.datasources_url();
        self.call("list_data_sources", || self.http.get(&url)).await
    }

    async fn list_event_actions(&self) -> PlatformResult<Vec<EventAction>> {
        let url = self.url("/event_actions");
        self.call("list_event_actions", || self.http.get(&url)).await
    }

    async fn create_event_action(&self, action: &EventAction) -> PlatformResult<EventAction> {
        let url = self.url("/event_actions");
        self.call("create_event_action", || self.http.post(&url).json(action))
            .await
    }
}

fn unwrap_envelope<T: DeserializeOwned>(operation: &str, body: &[u8]) -> PlatformResult<T> {
    let envelope: Envelope<T> =
        serde_json::from_slice(body).map_err(|e| PlatformError::Decode(e.to_string()))?;

    if envelope.is_error {
        let detail = envelope
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unspecified error".to_string());
        return Err(PlatformError::Platform(format!("{operation}: {detail}")));
    }

    envelope
        .value
        .ok_or_else(|| PlatformError::Decode(format!("{operation}: response has no value")))
}

async fn read_body(resp: reqwest::Response) -> PlatformResult<Vec<u8>> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PlatformError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.bytes().await?.to_vec())
}
