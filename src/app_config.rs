use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;
use url::Url;

use crate::caption_tracks::TrackSelection;

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Which caption tracks to download
    #[serde(default)]
    pub subtitles: SubtitlesConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Key-value store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Track selection and persistence settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SubtitlesConfig {
    /// Preferred language code; all tracks are fetched when unset
    #[serde(default)]
    pub language: Option<String>,

    /// Prefer speech-recognition tracks over human-authored ones
    #[serde(default)]
    pub prefer_auto_generated: bool,

    /// Store every converted track in the key-value store
    #[serde(default)]
    pub save_to_kvs: bool,
}

impl SubtitlesConfig {
    // @returns: Track selection policy for these settings
    pub fn selection(&self) -> TrackSelection {
        TrackSelection {
            language: self.language.clone(),
            prefer_auto_generated: self.prefer_auto_generated,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// User agent sent with caption requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// Key-value store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one JSON file per stored record
    #[serde(default = "default_storage_directory")]
    pub directory: PathBuf,

    /// Base URL under which stored records are published.
    /// Defaults to the `file://` URL of `directory`.
    #[serde(default)]
    pub public_url_base: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
            public_url_base: None,
        }
    }
}

impl StorageConfig {
    /// Resolve the base URL records are published under
    pub fn resolved_public_url_base(&self) -> Result<Url> {
        let mut base = match &self.public_url_base {
            Some(base) => Url::parse(base)
                .map_err(|e| anyhow!("Invalid public URL base '{}': {}", base, e))?,
            None => {
                let absolute = if self.directory.is_absolute() {
                    self.directory.clone()
                } else {
                    std::env::current_dir()?.join(&self.directory)
                };
                Url::from_directory_path(&absolute)
                    .map_err(|_| anyhow!("Cannot build a file URL for {}", absolute.display()))?
            }
        };

        // Url::join replaces the last path segment unless the base ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(base)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Largest accepted `http.retry_count`
pub const MAX_RETRY_COUNT: u32 = 10;

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!("capgrab/{}", env!("CARGO_PKG_VERSION"))
}

fn default_storage_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("capgrab")
        .join("kvs")
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if let Some(language) = &self.subtitles.language {
            if language.trim().is_empty() {
                return Err(anyhow!("Preferred subtitle language must not be empty; omit it to fetch all tracks"));
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(anyhow!("HTTP timeout must be greater than zero"));
        }

        if self.http.retry_count > MAX_RETRY_COUNT {
            return Err(anyhow!(
                "HTTP retry count must be at most {}, got {}",
                MAX_RETRY_COUNT, self.http.retry_count
            ));
        }

        if self.http.user_agent.trim().is_empty() {
            return Err(anyhow!("HTTP user agent must not be empty"));
        }

        if let Some(base) = &self.storage.public_url_base {
            Url::parse(base).map_err(|e| anyhow!("Invalid public URL base '{}': {}", base, e))?;
        }

        Ok(())
    }
}
