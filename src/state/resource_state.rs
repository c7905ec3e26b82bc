/// Resource state definitions for tracking mirror progress
///
/// This module defines every state a discovered URL can be in during one run.
use std::fmt;

/// Represents the current state of a URL in the mirror run
///
/// Transitions only move forward:
/// `Unseen → Queued → Dispatched → {Saved | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    // ===== Active States =====
    /// Never discovered, or discovered and discarded (cross-host, filtered)
    Unseen,

    /// Waiting in the frontier for the next level
    Queued,

    /// Claimed for fetching; never dispatched again
    Dispatched,

    // ===== Terminal States =====
    /// Fetched and written to disk
    Saved,

    /// Fetch or write failed; not retried within the run
    Failed,
}

impl ResourceState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Saved | Self::Failed)
    }

    /// Returns true if this URL has passed the dedup gate
    pub fn is_visited(&self) -> bool {
        matches!(self, Self::Dispatched | Self::Saved | Self::Failed)
    }

    /// Returns true if this represents a successful save
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Returns true if `next` is a legal forward transition from this state
    pub fn can_transition_to(&self, next: ResourceState) -> bool {
        matches!(
            (self, next),
            (Self::Unseen, Self::Queued)
                | (Self::Unseen, Self::Dispatched)
                | (Self::Queued, Self::Dispatched)
                | (Self::Dispatched, Self::Saved)
                | (Self::Dispatched, Self::Failed)
        )
    }

    /// Lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::Queued => "queued",
            Self::Dispatched => "dispatched",
            Self::Saved => "saved",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
