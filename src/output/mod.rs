//! Output module for reporting mirror results
//!
//! This module handles:
//! - The summary returned by a mirror run
//! - Printing that summary for the command line

use indicatif::HumanDuration;
use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

/// Why the level loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The frontier ran dry
    Completed,
    /// The next level would have been at or beyond the maximum depth
    DepthLimit,
    /// The file cap was reached
    FileLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Completed => "completed",
            Self::DepthLimit => "maximum depth reached",
            Self::FileLimit => "maximum file count reached",
        };
        f.write_str(text)
    }
}

/// Result of one mirror run
#[derive(Debug, Clone)]
pub struct MirrorSummary {
    /// Files saved under `output_dir`
    pub files_downloaded: usize,

    /// URLs whose fetch or write failed
    pub failed: Vec<String>,

    /// Number of depth levels that were processed
    pub levels_processed: usize,

    /// Root of the mirror
    pub output_dir: PathBuf,

    /// Files modified by link conversion (zero when conversion is off)
    pub converted_files: usize,

    pub stop_reason: StopReason,

    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

/// Renders a summary as the multi-line report printed after a mirror run
pub fn render_summary(summary: &MirrorSummary) -> String {
    let mut out = String::from("=== Mirror Summary ===\n\n");

    let _ = writeln!(out, "  Output directory: {}", summary.output_dir.display());
    let _ = writeln!(out, "  Files downloaded: {}", summary.files_downloaded);
    let _ = writeln!(out, "  Failed: {}", summary.failed.len());
    let _ = writeln!(out, "  Levels processed: {}", summary.levels_processed);
    if summary.converted_files > 0 {
        let _ = writeln!(out, "  Files with converted links: {}", summary.converted_files);
    }
    let _ = writeln!(out, "  Stopped: {}", summary.stop_reason);
    let _ = writeln!(out, "  Elapsed: {}", HumanDuration(summary.elapsed));

    if !summary.failed.is_empty() {
        let _ = writeln!(out, "\nFailed URLs ({}):", summary.failed.len());
        for url in &summary.failed {
            let _ = writeln!(out, "  - {}", url);
        }
    }

    out
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &MirrorSummary) {
    print!("{}", render_summary(summary));
}
