//! CLI command definitions and dispatch.

pub mod run;

use clap::{Parser, Subcommand};

/// confine — run a single isolated process tree.
#[derive(Parser, Debug)]
#[command(name = "confine", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision and run a container, becoming its supervisor.
    Run(run::RunArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// Returns the exit code the process should terminate with.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Run(args) => run::execute(args),
    }
}
