//! State module for tracking mirror progress
//!
//! This module provides the bookkeeping for one mirror run.
//!
//! # Components
//!
//! - `ResourceState`: Lifecycle of a single URL (unseen, queued, dispatched, saved, failed)
//! - `CrawlState`: Visited set, frontier, downloaded map and the file counter

mod crawl_state;
mod resource_state;

// Re-export main types
pub use crawl_state::{Claim, CrawlState, DownloadedFile};
pub use resource_state::ResourceState;
