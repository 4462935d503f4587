//! Configuration module for the drive.

use serde::Deserialize;
use std::path::Path;

use crate::{DriveError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body ceiling in bytes, enforced before any handler runs.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
    /// Public base URL used when generating external login links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_content_length() -> u64 {
    2 * 1024 * 1024 * 1024 // 2GB
}

fn default_public_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_content_length: default_max_content_length(),
            public_url: default_public_url(),
        }
    }
}

/// Object store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible service (Wasabi, AWS, MinIO).
    S3,
    /// Process-local store, contents are lost on restart.
    Memory,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend to use.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// S3 endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Signing region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Shared bucket holding every tenant root.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: String,
    /// Use path-style addressing (`endpoint/bucket/key`).
    #[serde(default = "default_force_path_style")]
    pub force_path_style: bool,
}

fn default_backend() -> StorageBackend {
    StorageBackend::S3
}

fn default_endpoint() -> String {
    "https://s3.wasabisys.com".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "linkm".to_string()
}

fn default_force_path_style() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: default_endpoint(),
            region: default_region(),
            bucket: default_bucket(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            force_path_style: default_force_path_style(),
        }
    }
}

/// Session and login token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Key used to sign the session cookie.
    #[serde(default)]
    pub secret: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_max_age")]
    pub max_age_secs: u64,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Shared symmetric key for login tokens.
    #[serde(default)]
    pub app_key: String,
}

fn default_session_max_age() -> u64 {
    12 * 60 * 60 // 12 hours
}

fn default_cookie_name() -> String {
    "drive_session".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            max_age_secs: default_session_max_age(),
            cookie_name: default_cookie_name(),
            app_key: String::new(),
        }
    }
}

/// Drive presentation and layout configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    /// Folder created under internal roots for client sharing.
    #[serde(default = "default_client_area_folder")]
    pub client_area_folder: String,
    /// Names longer than this are truncated in listings.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

fn default_client_area_folder() -> String {
    "Área_do_Cliente".to_string()
}

fn default_max_name_length() -> usize {
    64
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            client_area_folder: default_client_area_folder(),
            max_name_length: default_max_name_length(),
        }
    }
}

/// Web UI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Path to the page templates directory.
    #[serde(default = "default_templates_path")]
    pub templates_path: String,
    /// Whether to serve static files under `/static`.
    #[serde(default = "default_serve_static")]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_templates_path() -> String {
    "templates".to_string()
}

fn default_serve_static() -> bool {
    true
}

fn default_static_path() -> String {
    "static".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            templates_path: default_templates_path(),
            serve_static: default_serve_static(),
            static_path: default_static_path(),
        }
    }
}

/// Document preview configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// LibreOffice executable.
    #[serde(default = "default_soffice_path")]
    pub soffice_path: String,
    /// Conversion timeout in seconds.
    #[serde(default = "default_preview_timeout")]
    pub timeout_secs: u64,
}

fn default_soffice_path() -> String {
    "soffice".to_string()
}

fn default_preview_timeout() -> u64 {
    60
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            soffice_path: default_soffice_path(),
            timeout_secs: default_preview_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/drive.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Drive configuration.
    #[serde(default)]
    pub drive: DriveConfig,
    /// Web UI configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Preview configuration.
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DriveError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DriveError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DRIVE_SESSION_SECRET`: session cookie signing key
    /// - `DRIVE_APP_KEY`: login token key
    /// - `DRIVE_S3_ACCESS_KEY_ID` / `DRIVE_S3_SECRET_ACCESS_KEY`: storage credentials
    /// - `DRIVE_MAX_CONTENT_LENGTH`: request body ceiling in bytes
    pub fn apply_env_overrides(&mut self) {
        fn non_empty(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        if let Some(secret) = non_empty("DRIVE_SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Some(key) = non_empty("DRIVE_APP_KEY") {
            self.session.app_key = key;
        }
        if let Some(id) = non_empty("DRIVE_S3_ACCESS_KEY_ID") {
            self.storage.access_key_id = id;
        }
        if let Some(secret) = non_empty("DRIVE_S3_SECRET_ACCESS_KEY") {
            self.storage.secret_access_key = secret;
        }
        if let Some(limit) = non_empty("DRIVE_MAX_CONTENT_LENGTH") {
            match limit.parse() {
                Ok(limit) => self.server.max_content_length = limit,
                Err(_) => tracing::warn!(value = %limit, "Ignoring invalid DRIVE_MAX_CONTENT_LENGTH"),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the session secret or the login token key is not set
    /// - the S3 backend is selected without credentials
    pub fn validate(&self) -> Result<()> {
        if self.session.secret.is_empty() {
            return Err(DriveError::Config(
                "session.secret is not set. \
                 Set it in config.toml or via DRIVE_SESSION_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.session.app_key.is_empty() {
            return Err(DriveError::Config(
                "session.app_key is not set. \
                 Set it in config.toml or via DRIVE_APP_KEY environment variable."
                    .to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::S3
            && (self.storage.access_key_id.is_empty() || self.storage.secret_access_key.is_empty())
        {
            return Err(DriveError::Config(
                "S3 backend selected but storage credentials are missing".to_string(),
            ));
        }
        Ok(())
    }
}
