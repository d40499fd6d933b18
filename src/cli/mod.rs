//! Operator CLI.

pub mod check;
pub mod classify;
pub mod command;
pub mod monitor;
pub mod output;

pub use command::{CheckCommand, ClassifyArgs, Cli, Commands, ConfigPathArg};

use crate::error::Result;

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match cli.command {
        Commands::Monitor(arg) => monitor::execute(&arg.config).await,
        Commands::Check(CheckCommand::Config(arg)) => check::execute_config(&arg.config),
        Commands::Check(CheckCommand::Connection(arg)) => {
            check::execute_connection(&arg.config).await
        }
        Commands::Classify(args) => classify::execute(&args.message()),
    }
}
