//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! status-prefixed messages and errors to the user. The global flags
//! (`--quiet`, `--json`, `-v`) are applied once at startup and read by
//! every command.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);
static VERBOSITY: AtomicU8 = AtomicU8::new(0);

/// Global output settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Machine-readable output
    pub json: bool,
    /// Verbosity level (-v count)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create output settings from the global flags
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Make these settings visible to every command
    pub fn apply_global(self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
        VERBOSITY.store(self.verbose, Ordering::Relaxed);
    }

    /// Tracing filter directive matching the verbosity
    pub fn log_level(self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

/// Whether `--quiet` is in effect
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether `--json` is in effect
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Current verbosity level
pub fn verbosity() -> u8 {
    VERBOSITY.load(Ordering::Relaxed)
}

fn suppressed() -> bool {
    is_quiet() || is_json()
}

/// Print a success message
pub fn print_success(message: &str) {
    if !suppressed() {
        println!("{} {message}", status::SUCCESS);
    }
}

/// Print an informational message
pub fn print_info(message: &str) {
    if !suppressed() {
        println!("{} {message}", status::INFO);
    }
}

/// Print a warning to stderr
pub fn print_warning(message: &str) {
    if !suppressed() {
        eprintln!("{} {message}", status::WARNING);
    }
}

/// Print an error to stderr (never suppressed)
pub fn print_error(message: &str) {
    eprintln!("{} {message}", status::ERROR);
}

/// Print an indented detail line under the previous message
pub fn print_detail(message: &str) {
    if !suppressed() {
        println!("  {message}");
    }
}

/// Display an error and its cause chain
pub fn display_error(error: &anyhow::Error) {
    if is_json() {
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        let value = serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "causes": causes,
        });
        eprintln!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        return;
    }

    print_error(&error.to_string());
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    if suppressed() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Create a progress bar for build steps
pub fn create_build_bar(total: u64) -> ProgressBar {
    if suppressed() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} packages ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
