//! Configuration module for drive.

use serde::Deserialize;
use std::path::Path;

use crate::storage::BackendKind;
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
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Secret used to verify bearer tokens (must be set).
    #[serde(default)]
    pub jwt_secret: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend kind (only "local" is recognized).
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Root directory for the local backend.
    ///
    /// Defaults to `data/drive` under the working directory.
    #[serde(default)]
    pub root: Option<String>,
}

fn default_backend() -> String {
    "local".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: None,
        }
    }
}

/// Upload limits configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum size of one uploaded file in megabytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u64,
    /// Maximum number of files in one upload request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_max_file_size() -> u64 {
    100
}

fn default_max_files() -> usize {
    100
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size(),
            max_files: default_max_files(),
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
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload configuration.
    #[serde(default)]
    pub upload: UploadConfig,
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

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DriveError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DRIVE_JWT_SECRET`: Override the JWT secret key
    /// - `DRIVE_STORAGE`: Override the storage backend kind
    /// - `DRIVE_STORAGE_PATH`: Override the local storage root
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = non_empty_env("DRIVE_JWT_SECRET") {
            self.server.jwt_secret = secret;
        }
        if let Some(backend) = non_empty_env("DRIVE_STORAGE") {
            self.storage.backend = backend;
        }
        if let Some(root) = non_empty_env("DRIVE_STORAGE_PATH") {
            self.storage.root = Some(root);
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The JWT secret is not set
    /// - The storage backend kind is not recognized
    /// - An upload limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.server.jwt_secret.is_empty() {
            return Err(DriveError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via DRIVE_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }

        self.storage.backend.parse::<BackendKind>()?;

        if self.upload.max_file_size_mb == 0 || self.upload.max_files == 0 {
            return Err(DriveError::Config(
                "upload limits must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
