//! Site-Mirror: an offline website mirroring engine
//!
//! This crate mirrors a website for offline browsing. Starting from a seed URL it
//! discovers same-host resources level by level, fetches them under a byte-rate
//! budget, stores them under a directory tree that mirrors the site's paths, and
//! optionally rewrites in-content references into relative paths.

pub mod config;
pub mod crawler;
pub mod download;
pub mod output;
pub mod rewrite;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Site-Mirror operations
///
/// Only fatal conditions surface as a `MirrorError` from [`crawler::mirror`]:
/// per-resource failures are logged and swallowed by the orchestrator.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid rate limit: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Per-resource fetch failures
///
/// These are recoverable: the orchestrator logs them and abandons the URL
/// for the rest of the run without retrying.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Failed to fetch {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Failed to save {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Fetch task for {url} aborted: {message}")]
    Aborted { url: String, message: String },
}

/// Rate-limit specification errors
#[derive(Debug, Error, PartialEq)]
pub enum RateLimitError {
    #[error("empty rate limit")]
    Empty,

    #[error("no number found in rate limit '{0}'")]
    MissingNumber(String),

    #[error("invalid number in rate limit '{0}'")]
    InvalidNumber(String),

    #[error("unknown unit '{unit}' in rate limit '{spec}'")]
    UnknownUnit { spec: String, unit: String },

    #[error("rate limit must be positive, got '{0}'")]
    NonPositive(String),
}

/// Result type alias for Site-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{DownloadConfig, MirrorConfig};
pub use crawler::{mirror, Mirror};
pub use output::MirrorSummary;
pub use state::{CrawlState, ResourceState};
pub use crate::url::{local_path, ResourceKind};
