use crate::crawler::CasePolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of depth levels processed
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Default cap on saved files
pub const DEFAULT_MAX_FILES: usize = 1000;

/// Default number of concurrent fetches within a level
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Top-level structure of a configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub mirror: MirrorConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

/// Mirror run configuration, immutable for the run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Substrings that drop a URL, matched case-insensitively
    pub reject: Vec<String>,

    /// Substrings that drop a URL, matched per `case_policy`
    pub exclude: Vec<String>,

    /// Rewrite same-host references to relative paths after the crawl
    #[serde(rename = "convert-links")]
    pub convert_links: bool,

    /// Mirror root; the seed URL's host when unset
    #[serde(rename = "output-path")]
    pub output_path: Option<PathBuf>,

    /// Byte rate such as `200k` or `1.5M`; empty means unlimited
    #[serde(rename = "rate-limit")]
    pub rate_limit: String,

    /// Number of depth levels processed, the seed being level 0
    #[serde(rename = "max-depth")]
    pub max_depth: usize,

    /// Maximum number of files saved
    #[serde(rename = "max-files")]
    pub max_files: usize,

    /// Maximum concurrent fetches within a level
    pub concurrency: usize,

    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "case-policy")]
    pub case_policy: CasePolicy,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            reject: Vec::new(),
            exclude: Vec::new(),
            convert_links: false,
            output_path: None,
            rate_limit: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_files: DEFAULT_MAX_FILES,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: crate::crawler::DEFAULT_USER_AGENT.to_string(),
            case_policy: CasePolicy::default(),
        }
    }
}

impl MirrorConfig {
    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Single-file and batch download configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// File name to save as; derived from the URL when unset
    #[serde(rename = "output-name")]
    pub output_name: Option<String>,

    /// Directory to save into; the current directory when unset
    #[serde(rename = "output-path")]
    pub output_path: Option<PathBuf>,

    #[serde(rename = "rate-limit")]
    pub rate_limit: String,

    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Draw a live progress line on stderr
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_name: None,
            output_path: None,
            rate_limit: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: crate::crawler::DEFAULT_USER_AGENT.to_string(),
            show_progress: false,
        }
    }
}

impl DownloadConfig {
    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
