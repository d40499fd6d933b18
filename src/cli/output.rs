//! Terminal output formatting.
//!
//! Human-readable output uses colored symbols. `--json` switches every
//! helper to one JSON object per line (`{"type": ..., "payload": ...}`) for
//! scripting, and `--quiet` suppresses everything except warnings, alerts
//! and errors.

use std::fmt::Display;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parking_lot::RwLock;
use serde_json::{json, Value};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal).
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }

    /// Whether lines that are not warnings, alerts or errors are dropped.
    const fn hides_regular(self) -> bool {
        !self.json && self.quiet
    }
}

static OUTPUT: RwLock<OutputConfig> = parking_lot::const_rwlock(OutputConfig::new(false, false, 0));

fn current() -> OutputConfig {
    *OUTPUT.read()
}

fn emit(kind: &str, payload: Value) {
    println!("{}", json!({ "type": kind, "payload": payload }));
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    *OUTPUT.write() = config;
}

/// Whether `--json` is active.
#[must_use]
pub fn is_json() -> bool {
    current().json
}

/// Verbosity from repeated `-v` flags.
#[must_use]
pub fn verbosity() -> u8 {
    current().verbose
}

/// One-line status notices printed between sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A check passed.
    Success,
    /// Something degraded but the command carries on. Shown in quiet mode.
    Warning,
    /// A suggestion for the operator.
    Hint,
}

impl Notice {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Hint => "hint",
        }
    }
}

/// Print a status notice.
pub fn notice(kind: Notice, message: &str) {
    let config = current();
    if config.json {
        emit(kind.as_str(), json!({ "message": message }));
        return;
    }
    if kind != Notice::Warning && config.hides_regular() {
        return;
    }

    match kind {
        Notice::Success => println!("  {} {}", "✓".green(), message),
        Notice::Warning => println!("  {} {}", "⚠".yellow(), message),
        Notice::Hint => println!("  {}: {}", "hint".cyan().dimmed(), message.dimmed()),
    }
}

/// Print the banner shown when a long-running command starts.
pub fn header(version: &str) {
    let config = current();
    if config.json {
        emit("header", json!({ "app": "linkwatch", "version": version }));
        return;
    }
    if config.hides_regular() {
        return;
    }

    println!("{} {}", "linkwatch".bold(), version.dimmed());
    println!();
}

/// Print a bold section title.
pub fn section(title: &str) {
    let config = current();
    if config.json {
        emit("section", json!({ "title": title }));
        return;
    }
    if config.hides_regular() {
        return;
    }

    println!();
    println!("{}", title.bold());
}

/// Print a labeled value under the current section.
pub fn field(label: &str, value: impl Display) {
    let config = current();
    let value = value.to_string();
    if config.json {
        emit("field", json!({ "label": label, "value": value }));
        return;
    }
    if config.hides_regular() {
        return;
    }

    println!("  {:<14} {}", label.dimmed(), value);
}

/// Print a timestamped manager event.
pub fn event(timestamp: &str, label: &str, message: &str) {
    let config = current();
    if config.json {
        emit(
            "event",
            json!({ "timestamp": timestamp, "label": label, "message": message }),
        );
        return;
    }
    if config.hides_regular() {
        return;
    }

    println!("  {} {} {}", timestamp.dimmed(), label.cyan(), message);
}

/// Print a timestamped alert. Shown even in quiet mode.
pub fn alert(timestamp: &str, kind: &str, message: &str) {
    if is_json() {
        emit(
            "alert",
            json!({ "timestamp": timestamp, "kind": kind, "message": message }),
        );
        return;
    }

    let label = match kind {
        "warning" => kind.yellow().to_string(),
        _ => kind.red().to_string(),
    };
    println!("  {} {} {}", timestamp.dimmed(), label, message);
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
        return;
    }

    eprintln!("  {} {}", "×".red(), message);
}

/// Emit a complete JSON document as one line.
pub fn json_output(value: Value) {
    println!("{value}");
}

/// Format a value in cyan, or leave it plain in JSON mode.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    value.cyan().to_string()
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Start a progress spinner. Hidden in JSON or quiet mode.
pub fn spinner(message: &str) -> ProgressBar {
    let config = current();
    let pb = if config.json || config.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(SPINNER_FRAMES)
            .template("  {spinner:.cyan} {msg}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    };
    pb.set_message(message.to_string());
    pb
}

/// Stop a spinner, replacing it with a pass or fail line.
///
/// Failures stay visible in quiet mode.
pub fn finish_spinner(pb: &ProgressBar, passed: bool, message: &str) {
    let config = current();
    if config.json {
        let kind = if passed { "spinner_success" } else { "spinner_fail" };
        emit(kind, json!({ "message": message }));
        pb.finish_and_clear();
        return;
    }
    if passed && config.quiet {
        pb.finish_and_clear();
        return;
    }

    let symbol = if passed {
        "✓".green().to_string()
    } else {
        "×".red().to_string()
    };
    pb.finish_with_message(format!("{symbol} {message}"));
}
