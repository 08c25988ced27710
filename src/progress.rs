//! Progress reporting utilities using indicatif.
//!
//! The hashing engine never draws anything; it emits events. This module
//! provides the [`ProgressCallback`] trait those events are forwarded to and
//! [`Progress`], a terminal progress bar implementing it.

use std::path::Path;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::duplicates::ScanSummary;

/// Receives progress of a single scan.
///
/// Implement this trait to display or record scan progress.
pub trait ProgressCallback: Send + Sync {
    /// Enumeration finished; `total` files will be processed.
    fn on_scan_start(&self, total: usize);

    /// The `count`-th file (1-based) was processed.
    fn on_file_processed(&self, count: usize, path: &Path);

    /// The scan reached a terminal state.
    fn on_scan_end(&self, _summary: &ScanSummary) {}
}

/// A callback that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_scan_start(&self, _total: usize) {}

    fn on_file_processed(&self, _count: usize, _path: &Path) {}
}

/// Terminal progress bar for the hashing pass.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupescan::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, total: usize) {
        if self.quiet {
            return;
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::style());
        bar.set_message("Hashing");
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_file_processed(&self, count: usize, path: &Path) {
        self.with_bar(|bar| {
            bar.set_position(count as u64);
            bar.set_message(truncate_path(&path.to_string_lossy(), 30));
        });
    }

    fn on_scan_end(&self, summary: &ScanSummary) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        if let Some(bar) = guard.take() {
            if summary.is_cancelled() {
                bar.abandon_with_message("Cancelled");
            } else {
                bar.finish_with_message("Hashing complete");
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
