//! Mirror coordinator - main crawl orchestration logic
//!
//! This module contains the level loop that coordinates all aspects of a
//! mirror run, including:
//! - Validating the seed and creating the output root
//! - Processing the frontier one depth level at a time
//! - Dispatching bounded waves of concurrent fetches within a level
//! - Recording outcomes and enqueueing discovered same-host URLs
//! - Running link conversion and reporting the summary
//!
//! The coordinator is the only writer of [`CrawlState`]. Claims are made in
//! discovery order before a wave is spawned, and outcomes are recorded in the
//! same order after the wave is joined, so with a concurrency of 1 the run is
//! exactly the sequential breadth-first traversal.

use crate::config::{expand_home, validate_mirror_config, MirrorConfig};
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::filter::ResourceFilter;
use crate::crawler::limiter::limiter_from_config;
use crate::crawler::parser::scan_content;
use crate::output::{MirrorSummary, StopReason};
use crate::rewrite::convert_links;
use crate::state::{Claim, CrawlState};
use crate::url::{parse_http_url, ResourceKind};
use crate::{FetchError, MirrorError};
use futures::future::join_all;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// What a fetch task hands back to the coordinator
#[derive(Debug)]
struct TaskOutcome {
    local_path: PathBuf,
    kind: ResourceKind,
    discovered: Vec<Url>,
}

/// Main mirror coordinator structure
pub struct Mirror {
    config: MirrorConfig,
    seed: Url,
    output_dir: Arc<PathBuf>,
    fetcher: Arc<Fetcher>,
    filter: Arc<ResourceFilter>,
    state: CrawlState,
    levels_processed: usize,
}

impl Mirror {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `seed` - The URL the mirror starts from
    /// * `config` - The mirror configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Mirror)` - Ready to run
    /// * `Err(MirrorError)` - Invalid seed or configuration
    pub fn new(seed: &str, config: MirrorConfig) -> Result<Self, MirrorError> {
        validate_mirror_config(&config)?;

        let seed_url = parse_http_url(seed).map_err(|e| MirrorError::InvalidSeed {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;
        let state = CrawlState::new(&seed_url, config.max_files)?;

        let output_dir = match &config.output_path {
            Some(path) => expand_home(path),
            None => PathBuf::from(state.base_host()),
        };

        let limiter = limiter_from_config(&config.rate_limit);
        let client = build_http_client(&config.user_agent, config.request_timeout())?;
        let filter = ResourceFilter::new(&config.reject, &config.exclude, config.case_policy);

        Ok(Self {
            seed: seed_url,
            output_dir: Arc::new(output_dir),
            fetcher: Arc::new(Fetcher::new(client, limiter)),
            filter: Arc::new(filter),
            state,
            levels_processed: 0,
            config,
        })
    }

    /// Root directory of the mirror
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Crawl bookkeeping, for inspection before or during a run
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the mirror to completion
    ///
    /// Termination, checked before each level:
    /// 1. the file cap is reached
    /// 2. the frontier is empty
    /// 3. the next level would be at or beyond the maximum depth
    ///
    /// The file cap also stops a level part-way through.
    pub async fn run(mut self) -> Result<MirrorSummary, MirrorError> {
        let started = Instant::now();
        tracing::info!(
            "Mirroring {} into {}",
            self.seed,
            self.output_dir.display()
        );

        tokio::fs::create_dir_all(self.output_dir.as_path())
            .await
            .map_err(|source| MirrorError::OutputDir {
                path: self.output_dir.to_path_buf(),
                source,
            })?;

        let mut depth = 0;
        let stop_reason = loop {
            if self.state.limit_reached() {
                tracing::info!("Reached maximum file limit ({})", self.config.max_files);
                break StopReason::FileLimit;
            }

            if self.state.pending_is_empty() {
                break StopReason::Completed;
            }

            if depth >= self.config.max_depth {
                tracing::info!(
                    "Reached maximum depth ({}), stopping recursion",
                    self.config.max_depth
                );
                break StopReason::DepthLimit;
            }

            let level = self.state.take_pending();
            tracing::debug!("Processing depth {} ({} URLs)", depth, level.len());
            self.process_level(level).await;

            self.levels_processed += 1;
            depth += 1;
        };

        let files_downloaded = self.state.file_count();
        let Mirror {
            config,
            output_dir,
            state,
            levels_processed,
            ..
        } = self;
        let (base_host, downloaded, failed) = state.into_results();

        let converted_files = if config.convert_links {
            let root = Arc::clone(&output_dir);
            match tokio::task::spawn_blocking(move || convert_links(&downloaded, &base_host, &root))
                .await
            {
                Ok(report) => report.converted,
                Err(e) => {
                    tracing::warn!("Link conversion aborted: {}", e);
                    0
                }
            }
        } else {
            0
        };

        tracing::info!(
            "Website mirroring completed! Downloaded {} files to {}",
            files_downloaded,
            output_dir.display()
        );

        Ok(MirrorSummary {
            files_downloaded,
            failed: failed.into_iter().collect(),
            levels_processed,
            output_dir: output_dir.to_path_buf(),
            converted_files,
            stop_reason,
            elapsed: started.elapsed(),
        })
    }

    /// Processes one depth level in waves of at most `concurrency` fetches
    async fn process_level(&mut self, level: Vec<Url>) {
        let mut queue: VecDeque<Url> = level.into();

        while !queue.is_empty() {
            let mut wave = Vec::with_capacity(self.config.concurrency);

            while wave.len() < self.config.concurrency {
                let Some(url) = queue.pop_front() else {
                    break;
                };

                match self.state.claim(&url) {
                    Claim::Dispatched => wave.push(url),
                    Claim::AlreadyVisited => {
                        tracing::debug!("Skipping already visited {}", url);
                    }
                    Claim::Saturated => {
                        queue.push_front(url);
                        break;
                    }
                    Claim::LimitReached => {
                        queue.clear();
                        break;
                    }
                }
            }

            if wave.is_empty() {
                break;
            }

            self.run_wave(wave).await;
        }
    }

    /// Fetches a claimed wave concurrently and records outcomes in claim order
    async fn run_wave(&mut self, wave: Vec<Url>) {
        let handles: Vec<_> = wave
            .iter()
            .cloned()
            .map(|url| {
                let fetcher = Arc::clone(&self.fetcher);
                let filter = Arc::clone(&self.filter);
                let output_dir = Arc::clone(&self.output_dir);
                tokio::spawn(async move {
                    fetch_and_extract(&fetcher, &filter, &output_dir, url).await
                })
            })
            .collect();

        let results = join_all(handles).await;

        for (url, joined) in wave.into_iter().zip(results) {
            let outcome = joined.unwrap_or_else(|e| {
                Err(FetchError::Aborted {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            });

            match outcome {
                Ok(outcome) => {
                    tracing::info!("Downloaded: {} -> {}", url, outcome.local_path.display());
                    self.state.record_saved(&url, outcome.local_path, outcome.kind);

                    for discovered in outcome.discovered {
                        let shown = discovered.to_string();
                        if !self.state.enqueue(discovered) {
                            tracing::trace!("Not enqueueing {}", shown);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to download {}: {}", url, e);
                    self.state.record_failed(&url);
                }
            }
        }
    }
}

/// Fetch task body: save the resource, then scan and filter its references
async fn fetch_and_extract(
    fetcher: &Fetcher,
    filter: &ResourceFilter,
    output_dir: &Path,
    url: Url,
) -> Result<TaskOutcome, FetchError> {
    let fetched = fetcher.fetch_and_save(&url, output_dir).await?;

    let discovered = match &fetched.content {
        Some(content) => filter
            .apply(scan_content(content, fetched.kind, &url))
            .into_iter()
            .map(|resource| resource.url)
            .collect(),
        None => Vec::new(),
    };

    Ok(TaskOutcome {
        local_path: fetched.local_path,
        kind: fetched.kind,
        discovered,
    })
}

/// Runs a complete mirror operation
///
/// This is the main entry point for mirroring a site. It will:
/// 1. Validate the configuration and the seed URL
/// 2. Create the output root
/// 3. Crawl level by level within the depth and file limits
/// 4. Convert links if requested
/// 5. Return a summary of the run
///
/// # Arguments
///
/// * `seed` - The URL to start from
/// * `config` - The mirror configuration
///
/// # Returns
///
/// * `Ok(MirrorSummary)` - The run finished; per-URL failures are listed in it
/// * `Err(MirrorError)` - A fatal condition stopped the run
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::MirrorConfig;
/// use site_mirror::crawler::mirror;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MirrorConfig {
///     convert_links: true,
///     ..MirrorConfig::default()
/// };
/// let summary = mirror("https://example.com/", config).await?;
/// println!("{} files", summary.files_downloaded);
/// # Ok(())
/// # }
/// ```
pub async fn mirror(seed: &str, config: MirrorConfig) -> Result<MirrorSummary, MirrorError> {
    Mirror::new(seed, config)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> MirrorConfig {
        MirrorConfig {
            output_path: Some(dir.path().to_path_buf()),
            ..MirrorConfig::default()
        }
    }

    #[test]
    fn test_invalid_seed_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = Mirror::new("not a url", test_config(&dir));
        assert!(matches!(result, Err(MirrorError::InvalidSeed { .. })));

        let result = Mirror::new("ftp://ex.com/file", test_config(&dir));
        assert!(matches!(result, Err(MirrorError::InvalidSeed { .. })));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = MirrorConfig {
            concurrency: 0,
            ..test_config(&dir)
        };
        let result = Mirror::new("http://ex.com/", config);
        assert!(matches!(result, Err(MirrorError::Config(_))));
    }

    #[test]
    fn test_output_defaults_to_seed_host() {
        let mirror = Mirror::new("http://ex.com/a/", MirrorConfig::default()).unwrap();
        assert_eq!(mirror.output_dir(), Path::new("ex.com"));
        assert_eq!(mirror.state().pending_len(), 1);
    }

    #[test]
    fn test_bad_rate_limit_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let config = MirrorConfig {
            rate_limit: "fast".to_string(),
            ..test_config(&dir)
        };
        assert!(Mirror::new("http://ex.com/", config).is_ok());
    }

    #[tokio::test]
    async fn test_unwritable_output_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let config = MirrorConfig {
            output_path: Some(blocker.join("mirror")),
            ..MirrorConfig::default()
        };
        let result = mirror("http://127.0.0.1:9/", config).await;
        assert!(matches!(result, Err(MirrorError::OutputDir { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_seed_completes_with_failure() {
        let dir = TempDir::new().unwrap();
        let config = MirrorConfig {
            request_timeout_secs: 2,
            ..test_config(&dir)
        };

        // Port 9 (discard) is closed on test hosts
        let summary = mirror("http://127.0.0.1:9/", config).await.unwrap();
        assert_eq!(summary.files_downloaded, 0);
        assert_eq!(summary.failed, vec!["http://127.0.0.1:9/".to_string()]);
        assert_eq!(summary.stop_reason, StopReason::Completed);
        assert_eq!(summary.levels_processed, 1);
    }
}
