/*!
 * Error types for the capgrab library.
 *
 * Each stage of the caption pipeline has its own error enum, defined with
 * the thiserror crate. Fetch and conversion errors are recoverable and are
 * contained per track; `ConfigError` signals a caller bug.
 */

use thiserror::Error;

/// Errors that can occur while fetching a caption track over HTTP
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the connection failed
    #[error("Caption request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status
    #[error("Caption server responded with {status_code} for {url}")]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Requested URL
        url: String,
    },

    /// The track URL could not be parsed
    #[error("Invalid caption URL '{url}': {reason}")]
    InvalidUrl {
        url: String,
        reason: String,
    },

    /// The response body was not valid JSON
    #[error("Failed to parse caption response: {0}")]
    ParseError(String),

    /// The request did not complete in time
    #[error("Caption request timed out: {0}")]
    Timeout(String),
}

impl FetchError {
    /// Whether retrying the same request can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::Timeout(_) => true,
            Self::HttpStatus { status_code, .. } => *status_code >= 500,
            Self::InvalidUrl { .. } | Self::ParseError(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::HttpStatus {
                status_code: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors locating the caption-track list inside a page script
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The script has no `captionTracks` key, or there was no script at all
    #[error("No caption track list found")]
    NotFound,

    /// The `captionTracks` value is not a valid track array
    #[error("Malformed caption track list: {0}")]
    Malformed(String),
}

/// Errors that can occur while converting a caption document to SRT
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The document has no `events` array
    #[error("Caption document has no events list")]
    MissingEvents,

    /// The document does not match the timed-text schema
    #[error("Invalid caption document: {0}")]
    InvalidDocument(String),
}

/// Programmer or configuration errors; these are never contained per track
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A subtitle kind other than `auto_generated` or `user_generated`
    #[error("Unknown subtitles type {0}")]
    UnknownSubtitleKind(String),

    /// A configuration value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by key-value store implementations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be serialized
    #[error("Failed to serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record id cannot be used as a key
    #[error("Invalid record id: {0}")]
    InvalidKey(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error fetching a caption track
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error extracting the caption track list
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error converting a caption document
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the key-value store
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
