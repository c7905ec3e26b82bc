//! Live progress line for single-file downloads

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Redraws per second; one every 100ms
pub const REDRAW_HZ: u8 = 10;

/// Template of the progress line: `downloaded / total [====   ] pct speed eta`
pub const PROGRESS_TEMPLATE: &str =
    " {bytes} / {total_bytes} [{bar:50}] {percent}% {bytes_per_sec} {eta}";

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Tracks bytes received and draws a one-line progress bar on stderr
///
/// Nothing is drawn when disabled or when the server did not declare a size.
#[derive(Debug)]
pub struct ProgressTracker {
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>, enabled: bool) -> Self {
        let bar = total
            .filter(|total| *total > 0 && enabled)
            .map(|total| {
                ProgressBar::with_draw_target(
                    Some(total),
                    ProgressDrawTarget::stderr_with_hz(REDRAW_HZ),
                )
                .with_style(progress_style())
            });

        Self { bar }
    }

    fn is_drawing(&self) -> bool {
        self.bar.is_some()
    }

    /// Records the running byte count
    pub fn update(&mut self, downloaded: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(downloaded);
        }
    }

    /// Draws the final state and ends the line
    pub fn finish(&mut self, downloaded: u64) {
        if let Some(bar) = self.bar.take() {
            bar.set_position(downloaded);
            bar.finish();
        }
    }
}
