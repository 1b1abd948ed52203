//! Pebble CLI - compile and run Pebble programs.

use std::process::ExitCode;

use clap::Parser;
use pebble_cli::cli::{Cli, Command};
use pebble_cli::commands;

fn main() -> ExitCode {
    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG environment variable to control log level
    // Default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => commands::run::run(args, &cli.global),
        Command::Check(args) => commands::check::run(args, &cli.global),
        Command::Dump(args) => commands::dump::run(args, &cli.global),
    }
}
