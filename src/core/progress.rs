//! Progress reporting for file analysis using indicatif.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar style for file processing.
fn file_progress() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// A thread-safe progress tracker fed by analysis progress callbacks.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Create a visible tracker when stderr is a terminal, hidden otherwise.
    pub fn for_terminal(message: &str) -> Self {
        if std::io::stderr().is_terminal() {
            Self::new(message)
        } else {
            Self::hidden()
        }
    }

    /// Create a visible progress tracker.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(file_progress());
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Create a hidden progress tracker (for non-TTY output).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update position and length from a `(current, total)` callback.
    pub fn update(&self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish and clear the progress bar.
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
