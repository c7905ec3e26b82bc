//! Crawler module for mirroring a site
//!
//! This module contains the core mirroring logic, including:
//! - Resource extraction from markup and stylesheets
//! - Reject/exclude filtering
//! - Byte-rate limiting
//! - HTTP fetching and local persistence
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod filter;
mod limiter;
mod parser;

pub use coordinator::{mirror, Mirror};
pub use fetcher::{build_http_client, FetchedResource, Fetcher, DEFAULT_USER_AGENT};
pub use filter::{filter_resources, CasePolicy, FilterVerdict, ResourceFilter};
pub use limiter::{limiter_from_config, parse_rate, ByteRateLimiter};
pub use parser::{
    extract_from_markup, extract_from_stylesheet, scan_content, scan_markup, scan_stylesheet,
    Resource,
};

pub(crate) use fetcher::{classify_error, create_file, stream_body};
