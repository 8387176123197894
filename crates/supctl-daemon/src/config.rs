//! Configuration for supctl-daemon

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use supctl_core::{
    ColumnSelection, ControlSettings, FileClassifier, GateResetPolicy, Limits, SeriesPaths,
};
use supctl_platform::{ClientConfig, RegistrationSettings};

/// Keys whose environment values are comma separated lists
const LIST_KEYS: [&str; 5] = [
    "columns.time",
    "columns.upper_skip",
    "columns.lower_include",
    "files.extensions",
    "registration.data_sources",
];

/// Main daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Platform connection
    #[serde(default)]
    pub platform: ClientConfig,

    /// Event registration
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// File classification and role caches
    #[serde(default)]
    pub files: FilesConfig,

    /// Column selection rules
    #[serde(default = "default_columns")]
    pub columns: ColumnSelection,

    /// Operating band
    #[serde(default = "default_limits")]
    pub limits: Limits,

    /// Control request output
    #[serde(default)]
    pub control: ControlConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            platform: ClientConfig::default(),
            registration: RegistrationConfig::default(),
            files: FilesConfig::default(),
            columns: default_columns(),
            limits: default_limits(),
            control: ControlConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Path the platform posts notifications to
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            webhook_path: default_webhook_path(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Event registration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Run registration at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Data source names to subscribe to
    #[serde(default)]
    pub data_sources: Vec<String>,

    /// Webhook URL given to the platform; derived from the listen address
    /// and webhook path when unset
    #[serde(default)]
    pub callback_url: Option<String>,

    /// Seconds between attempts
    #[serde(default = "default_register_wait")]
    pub wait_secs: u64,

    /// Maximum number of attempts
    #[serde(default = "default_register_iterations")]
    pub iterations: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_sources: Vec::new(),
            callback_url: None,
            wait_secs: default_register_wait(),
            iterations: default_register_iterations(),
        }
    }
}

/// File classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Regular expression for primary series files, tested first
    #[serde(default = "default_primary_pattern")]
    pub primary_pattern: String,

    /// Regular expression for secondary series files
    #[serde(default = "default_secondary_pattern")]
    pub secondary_pattern: String,

    /// Local cache of the latest primary file
    #[serde(default = "default_primary_cache")]
    pub primary_cache: PathBuf,

    /// Local cache of the latest secondary file
    #[serde(default = "default_secondary_cache")]
    pub secondary_cache: PathBuf,

    /// Accepted tabular extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            primary_pattern: default_primary_pattern(),
            secondary_pattern: default_secondary_pattern(),
            primary_cache: default_primary_cache(),
            secondary_cache: default_secondary_cache(),
            extensions: default_extensions(),
        }
    }
}

/// Control request output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Adjustment written into artifacts and instructions
    #[serde(default)]
    pub adjustment: String,

    /// Artifact base name
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Directory for instruction artifacts
    #[serde(default = "default_mount_dir")]
    pub mount_dir: PathBuf,

    /// Directory for control request reports
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// When fired gate tracks re-arm
    #[serde(default)]
    pub reset_policy: GateResetPolicy,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            adjustment: String::new(),
            output_file: default_output_file(),
            mount_dir: default_mount_dir(),
            report_dir: default_report_dir(),
            reset_policy: GateResetPolicy::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_webhook_path() -> String {
    "/supervisorycontrol".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_register_wait() -> u64 {
    30
}

fn default_register_iterations() -> u32 {
    30
}

fn default_primary_pattern() -> String {
    "moose".to_string()
}

fn default_secondary_pattern() -> String {
    "ml".to_string()
}

fn default_primary_cache() -> PathBuf {
    PathBuf::from("cache/primary.csv")
}

fn default_secondary_cache() -> PathBuf {
    PathBuf::from("cache/secondary.csv")
}

fn default_extensions() -> Vec<String> {
    vec!["csv".to_string()]
}

fn default_columns() -> ColumnSelection {
    ColumnSelection {
        time: vec!["time".to_string()],
        upper_skip: vec!["time".to_string()],
        lower_include: Vec::new(),
    }
}

fn default_limits() -> Limits {
    Limits {
        upper: 100.0,
        lower: 0.0,
    }
}

fn default_output_file() -> String {
    "control_request.txt".to_string()
}

fn default_mount_dir() -> PathBuf {
    PathBuf::from("mount")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and `SUPCTL_`
    /// environment variables, in that order.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables, e.g. SUPCTL_LIMITS__UPPER=100
        let mut environment = config::Environment::with_prefix("SUPCTL")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .try_parsing(true);
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }
        builder = builder.add_source(environment);

        builder.build()?.try_deserialize()
    }

    /// Reject configurations the daemon cannot run with
    pub fn validate(&self) -> Result<(), String> {
        self.classifier()
            .map_err(|e| format!("invalid file pattern: {e}"))?;

        if self.files.extensions.is_empty() {
            return Err("files.extensions must not be empty".to_string());
        }
        if !self.limits.upper.is_finite() || !self.limits.lower.is_finite() {
            return Err("limits must be finite numbers".to_string());
        }
        if self.columns.time.is_empty() {
            return Err("columns.time must name at least one column".to_string());
        }
        if self.control.adjustment.trim().is_empty() {
            return Err("control.adjustment must be set".to_string());
        }
        if self.control.output_file.is_empty() {
            return Err("control.output_file must be set".to_string());
        }
        for (name, path) in [
            ("control.mount_dir", &self.control.mount_dir),
            ("control.report_dir", &self.control.report_dir),
            ("files.primary_cache", &self.files.primary_cache),
            ("files.secondary_cache", &self.files.secondary_cache),
        ] {
            if path.as_os_str().is_empty() {
                return Err(format!("{name} must be set"));
            }
        }
        if self.files.primary_cache == self.files.secondary_cache {
            return Err("primary and secondary caches must differ".to_string());
        }
        if !self.server.webhook_path.starts_with('/') {
            return Err("server.webhook_path must start with '/'".to_string());
        }
        if self.registration.enabled && self.registration.iterations == 0 {
            return Err("registration.iterations must be at least 1".to_string());
        }

        Ok(())
    }

    /// Compiled file classifier
    pub fn classifier(&self) -> Result<FileClassifier, regex::Error> {
        FileClassifier::new(
            &self.files.primary_pattern,
            &self.files.secondary_pattern,
            self.files.extensions.clone(),
        )
    }

    /// Role cache paths
    pub fn series_paths(&self) -> SeriesPaths {
        SeriesPaths {
            primary: self.files.primary_cache.clone(),
            secondary: self.files.secondary_cache.clone(),
        }
    }

    /// Emitter settings
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            limits: self.limits,
            adjustment: self.control.adjustment.clone(),
            output_file: self.control.output_file.clone(),
            mount_dir: self.control.mount_dir.clone(),
            report_dir: self.control.report_dir.clone(),
            reset_policy: self.control.reset_policy,
        }
    }

    /// Webhook URL handed to the platform
    pub fn callback_url(&self) -> String {
        self.registration.callback_url.clone().unwrap_or_else(|| {
            format!(
                "http://{}{}",
                self.server.listen_addr, self.server.webhook_path
            )
        })
    }

    /// Registration settings
    pub fn registration_settings(&self) -> RegistrationSettings {
        RegistrationSettings {
            data_sources: self.registration.data_sources.clone(),
            callback_url: self.callback_url(),
            wait: Duration::from_secs(self.registration.wait_secs),
            iterations: self.registration.iterations,
        }
    }

    /// Directories the daemon writes into
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.control.mount_dir.clone(),
            self.control.report_dir.clone(),
            self.platform.download_dir.clone(),
        ];
        for cache in [&self.files.primary_cache, &self.files.secondary_cache] {
            if let Some(parent) = cache.parent().filter(|p| !p.as_os_str().is_empty()) {
                dirs.push(parent.to_path_buf());
            }
        }
        dirs.dedup();
        dirs
    }
}
