//! Error types for Photoset.
//!
//! Errors are organized by layer: configuration, the upload/output stores,
//! and the upstream vision API. The HTTP layer maps these onto status codes.

use thiserror::Error;

/// Top-level error type for Photoset operations.
#[derive(Error, Debug)]
pub enum PhotosetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Upload or output store errors
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Vision API errors
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors from the flat-file upload and output stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The caller supplied something the store refuses to accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The named file does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to a vision API.
///
/// Every variant carries the provider name so per-file error messages in a
/// generation result say which dialect was spoken.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport-level failure (DNS, connection refused, TLS, ...)
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// No response within the configured timeout
    #[error("{provider} request timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// Non-2xx HTTP status
    #[error("{provider} HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// Body was not JSON or lacked the expected field path
    #[error("Unexpected {provider} response: {message}")]
    Response { provider: String, message: String },
}

impl UpstreamError {
    /// HTTP status code returned by the upstream, if the call got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience type alias for Photoset results.
pub type Result<T> = std::result::Result<T, PhotosetError>;

/// Convenience type alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
