//! Configuration module for Filedrop.

use serde::Deserialize;
use std::path::Path;

use crate::{FiledropError, Result};

/// Default maximum request body size (10 GiB).
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 10 * 1024 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory that holds every uploaded file.
    #[serde(default = "default_upload_folder")]
    pub upload_folder: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
    /// File extensions accepted for upload and download (case-insensitive).
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_upload_folder() -> String {
    "uploads".to_string()
}

fn default_max_content_length() -> u64 {
    DEFAULT_MAX_CONTENT_LENGTH
}

fn default_allowed_extensions() -> Vec<String> {
    [
        "png", "jpg", "jpeg", "gif", "pdf", "txt", "csv", "zip", "json", "xlsx", "mp3", "mp4",
        "avi", "mkv", "mov", "doc", "docx", "ppt", "pptx",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_folder: default_upload_folder(),
            max_content_length: default_max_content_length(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign the flash-notice cookie.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
}

fn default_secret_key() -> String {
    "dev-secret-key".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
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
    "logs/filedrop.log".to_string()
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
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledropError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledropError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PORT`: listen port
    /// - `UPLOAD_FOLDER`: storage root directory
    /// - `MAX_CONTENT_LENGTH`: maximum request body size in bytes
    /// - `SECRET_KEY`: flash cookie signing secret
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(port) = var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| FiledropError::Config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(folder) = var("UPLOAD_FOLDER") {
            self.storage.upload_folder = folder;
        }
        if let Some(limit) = var("MAX_CONTENT_LENGTH") {
            self.storage.max_content_length = limit.parse().map_err(|_| {
                FiledropError::Config(format!("MAX_CONTENT_LENGTH is not a number: {limit}"))
            })?;
        }
        if let Some(secret) = var("SECRET_KEY") {
            self.session.secret_key = secret;
        }
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - No allowed extension is configured
    /// - The maximum content length is zero
    pub fn validate(&self) -> Result<()> {
        if self
            .storage
            .allowed_extensions
            .iter()
            .all(|e| e.trim().is_empty())
        {
            return Err(FiledropError::Config(
                "storage.allowed_extensions must contain at least one extension".to_string(),
            ));
        }
        if self.storage.max_content_length == 0 {
            return Err(FiledropError::Config(
                "storage.max_content_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
