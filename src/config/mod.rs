//! Configuration module for Site-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key is optional; command-line flags override file values.
//!
//! # Example
//!
//! ```no_run
//! use site_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirror will use max depth: {}", config.mirror.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    DownloadConfig, FileConfig, MirrorConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_FILES, DEFAULT_REQUEST_TIMEOUT_SECS,
};

// Re-export parser and validation functions
pub use parser::{expand_home, load_config, parse_config, split_list};
pub use validation::{validate, validate_download_config, validate_mirror_config, MAX_CONCURRENCY};
