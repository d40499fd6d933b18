//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Watch a realtime connection and recover it when it fails
#[derive(Parser, Debug)]
#[command(name = "linkwatch")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor the configured endpoint until interrupted
    Monitor(ConfigPathArg),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),

    /// Classify an error message
    Classify(ClassifyArgs),
}

/// Subcommands for `linkwatch check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file.
    Config(ConfigPathArg),
    /// Probe the endpoint through the circuit breaker and retry policy.
    Connection(ConfigPathArg),
}

/// Shared argument for commands that only need a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Error message to classify.
    #[arg(required = true)]
    pub message: Vec<String>,
}

impl ClassifyArgs {
    /// Words joined back into one message.
    #[must_use]
    pub fn message(&self) -> String {
        self.message.join(" ")
    }
}
