//! Catalog-Ripple: a resumable catalog specification harvester
//!
//! This crate walks a hierarchical product catalog (category -> series -> item),
//! records every discovered node in a durable state store, and extracts the
//! labeled specification table of each item into an append-only CSV log.
//! Interrupted runs resume from the state store without re-fetching items
//! that already succeeded.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation to {url} failed after {attempts} attempt(s): {message}")]
    Navigation {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Blocked sub-resource request: {url}")]
    Blocked { url: String },

    #[error("Expected element `{selector}` missing on {url}")]
    MissingElement { url: String, selector: String },

    #[error("Invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("Session credential error: {0}")]
    Session(String),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RippleError {
    /// Returns true if a navigation that produced this error is worth retrying
    ///
    /// Timeouts, connection failures, 5xx responses and 429 are transient.
    /// Everything else (4xx, blocked resources, bad URLs) fails immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty link href")]
    EmptyHref,
}

/// Result type alias for Catalog-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::OutcomeStatus;
pub use crate::url::{resolve_href, ResourceKind};
