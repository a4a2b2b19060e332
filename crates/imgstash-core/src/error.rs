//! Error types and handling for imgstash-core operations.
//!
//! Errors surface from the edges of the pipeline: opening the store, writing
//! entries, fetching bytes, decoding images and loading configuration. The
//! preload worker catches every one of them per URL, so nothing here ever
//! reaches the scheduler. Hosts see these errors only when they call the
//! building blocks directly.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: File system operations behind the disk store
//! - **Network Errors**: HTTP requests and non-success status codes
//! - **Decode Errors**: Image bytes that could not be decoded
//! - **Storage Errors**: Store manifest and entry management
//! - **Configuration Errors**: Invalid settings or config files
//!
//! ```rust
//! use imgstash_core::Error;
//!
//! let err = Error::HttpStatus {
//!     url: "https://example.com/a.jpg".to_string(),
//!     status: 503,
//! };
//! assert_eq!(err.category(), "http_status");
//! assert!(err.is_recoverable());
//! ```

use thiserror::Error;

/// The main error type for imgstash-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers the disk store's directory creation, entry writes and reads.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Connection, TLS and body read failures from `reqwest`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for '{url}'")]
    HttpStatus {
        /// URL that was requested.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// Image bytes could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Storage operation failed.
    ///
    /// ## Common Causes
    ///
    /// - Store root is not a directory or is not writable
    /// - Manifest written by an incompatible store version
    /// - Entry commit (rename) failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A preload was not waited on past its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl Error {
    /// Check if the error is likely transient.
    ///
    /// The pipeline never retries, but the flag is logged with each failure so
    /// that a cache miss caused by a flaky network can be told apart from a
    /// permanent one.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a static string identifier.
    ///
    /// Used as a structured field in log events.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::HttpStatus { .. } => "http_status",
            Self::Decode(_) => "decode",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Timeout(_) => "timeout",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
