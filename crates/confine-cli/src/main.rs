//! # confine — single-container runtime CLI.
//!
//! Provisions and runs one isolated process tree: private rootfs, fresh
//! namespaces, optional memory ceiling. The process exit code mirrors
//! the contained shell's exit status.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match commands::execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
