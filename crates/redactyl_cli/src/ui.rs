//! Terminal styling, progress, and exit codes.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Process exit codes.
///
/// `0` means the scan completed and the fail gate stayed quiet, `1` means
/// the gate tripped, `2` means the scan itself could not run. CI relies on
/// the distinction.
pub mod exit {
    /// Scan completed; gate did not trigger.
    pub const SUCCESS: i32 = 0;
    /// Scan completed; gate triggered on findings.
    pub const FINDINGS: i32 = 1;
    /// Operational error: missing binary, bad config, I/O failure.
    pub const ERROR: i32 = 2;
}

/// Shared styles for terminal output.
pub mod colors {
    use super::Style;

    /// Style for errors and high-severity findings.
    #[must_use]
    pub fn error() -> Style {
        Style::new().red().bold()
    }

    /// Style for warnings and medium-severity findings.
    #[must_use]
    pub fn warning() -> Style {
        Style::new().yellow()
    }

    /// Style for success markers.
    #[must_use]
    pub fn success() -> Style {
        Style::new().green()
    }

    /// Style for paths and identifiers.
    #[must_use]
    pub fn accent() -> Style {
        Style::new().cyan()
    }

    /// Style for de-emphasised detail.
    #[must_use]
    pub fn dim() -> Style {
        Style::new().dim()
    }
}

/// Prints an error line to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {message}", colors::error().apply_to("error:"));
}

/// Creates the scan progress bar over `total` units.
#[must_use]
pub fn create_scan_progress(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} scanning [{bar:30.cyan/dim}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}
