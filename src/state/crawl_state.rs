//! Shared crawl bookkeeping for one mirror run
//!
//! `CrawlState` is owned by the orchestrator, which is its only writer. Fetch
//! tasks never touch it: the orchestrator claims URLs before spawning them and
//! records their outcomes after joining them.
//!
//! The file cap is enforced with in-flight reservations. A claim reserves one
//! slot; a save converts the reservation into a file, a failure releases it.
//! `file_count + reserved` therefore never exceeds the cap, so the cap cannot
//! be overshot however many fetches run at once.

use crate::state::ResourceState;
use crate::url::{host_key, is_same_host, ResourceKind};
use crate::MirrorError;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use url::Url;

/// Where a saved URL lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub local_path: PathBuf,
    pub kind: ResourceKind,
}

/// Outcome of trying to dispatch a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Marked visited with a reserved file slot; the caller must fetch it
    Dispatched,
    /// Already dispatched earlier in the run
    AlreadyVisited,
    /// Every remaining slot is reserved by in-flight fetches; retry later
    Saturated,
    /// The file cap has been reached
    LimitReached,
}

/// Mutable state of one mirror run
#[derive(Debug)]
pub struct CrawlState {
    base_host: String,
    max_files: usize,
    visited: HashSet<String>,
    pending: Vec<Url>,
    queued: HashSet<String>,
    downloaded: BTreeMap<String, DownloadedFile>,
    failed: BTreeSet<String>,
    file_count: usize,
    reserved: usize,
}

/// Dedup key: the URL without its fragment
fn key_of(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}

impl CrawlState {
    /// Creates the state for a run seeded at `seed`, with the seed queued
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::InvalidSeed`] if the seed has no host.
    pub fn new(seed: &Url, max_files: usize) -> Result<Self, MirrorError> {
        let base_host = host_key(seed).ok_or_else(|| MirrorError::InvalidSeed {
            url: seed.to_string(),
            reason: "URL has no host".to_string(),
        })?;

        let mut seed = seed.clone();
        seed.set_fragment(None);

        let mut state = Self {
            base_host,
            max_files,
            visited: HashSet::new(),
            pending: Vec::new(),
            queued: HashSet::new(),
            downloaded: BTreeMap::new(),
            failed: BTreeSet::new(),
            file_count: 0,
            reserved: 0,
        };
        state.queued.insert(key_of(&seed));
        state.pending.push(seed);

        Ok(state)
    }

    /// Host (with non-default port) of the seed URL
    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    /// Configured file cap
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Number of successful saves so far
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Number of dispatched fetches not yet recorded
    pub fn in_flight(&self) -> usize {
        self.reserved
    }

    /// Returns true once the file cap is reached
    pub fn limit_reached(&self) -> bool {
        self.file_count >= self.max_files
    }

    /// Number of URLs dispatched so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&key_of(url))
    }

    /// Returns true if the frontier for the next level is empty
    pub fn pending_is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of URLs waiting for the next level
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Saved URLs and where they live, ordered by URL
    pub fn downloaded(&self) -> &BTreeMap<String, DownloadedFile> {
        &self.downloaded
    }

    /// URLs whose fetch failed, ordered
    pub fn failed(&self) -> &BTreeSet<String> {
        &self.failed
    }

    /// Adds a discovered URL to the next level's frontier
    ///
    /// Returns false (and does nothing) for other hosts, URLs already
    /// dispatched, and URLs already queued.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if !is_same_host(&url, &self.base_host) {
            return false;
        }

        let key = key_of(&url);
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }

        self.queued.insert(key);
        self.pending.push(url);
        true
    }

    /// Moves the whole frontier out, leaving it empty for the next level
    pub fn take_pending(&mut self) -> Vec<Url> {
        self.queued.clear();
        std::mem::take(&mut self.pending)
    }

    /// Tries to dispatch `url`, marking it visited and reserving a file slot
    ///
    /// The cap is checked before the visited set, so once the limit is
    /// reached every further claim reports [`Claim::LimitReached`].
    pub fn claim(&mut self, url: &Url) -> Claim {
        if self.limit_reached() {
            return Claim::LimitReached;
        }

        let key = key_of(url);
        if self.visited.contains(&key) {
            return Claim::AlreadyVisited;
        }

        if self.file_count + self.reserved >= self.max_files {
            return Claim::Saturated;
        }

        self.debug_check_transition(url, ResourceState::Dispatched);

        // A URL rediscovered during this level may also sit in the next
        // frontier; once dispatched it must not stay there.
        if self.queued.remove(&key) {
            self.pending.retain(|queued| key_of(queued) != key);
        }

        self.visited.insert(key);
        self.reserved += 1;
        Claim::Dispatched
    }

    /// Records a successful save of a dispatched URL
    pub fn record_saved(&mut self, url: &Url, local_path: PathBuf, kind: ResourceKind) {
        self.debug_check_transition(url, ResourceState::Saved);
        let key = key_of(url);

        self.reserved = self.reserved.saturating_sub(1);
        self.file_count += 1;
        self.downloaded
            .insert(key, DownloadedFile { local_path, kind });
    }

    /// Records a failed fetch of a dispatched URL, releasing its slot
    pub fn record_failed(&mut self, url: &Url) {
        self.debug_check_transition(url, ResourceState::Failed);
        let key = key_of(url);

        self.reserved = self.reserved.saturating_sub(1);
        self.failed.insert(key);
    }

    /// Current lifecycle state of `url`
    pub fn state_of(&self, url: &Url) -> ResourceState {
        let key = key_of(url);
        if self.downloaded.contains_key(&key) {
            ResourceState::Saved
        } else if self.failed.contains(&key) {
            ResourceState::Failed
        } else if self.visited.contains(&key) {
            ResourceState::Dispatched
        } else if self.queued.contains(&key) {
            ResourceState::Queued
        } else {
            ResourceState::Unseen
        }
    }

    fn debug_check_transition(&self, url: &Url, next: ResourceState) {
        let current = self.state_of(url);
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {} -> {} for {}",
            current,
            next,
            url
        );
    }

    /// Consumes the state, keeping what the link rewriter needs
    pub fn into_results(self) -> (String, BTreeMap<String, DownloadedFile>, BTreeSet<String>) {
        (self.base_host, self.downloaded, self.failed)
    }
}
