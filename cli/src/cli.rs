//! Command-line interface definitions.
//!
//! This module contains only clap struct definitions - no business logic.
//! All command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use pebble_core::parser::DEFAULT_MAX_DEPTH;

/// Pebble - compile and run programs in a small C-like language
#[derive(Parser, Debug)]
#[command(name = "pebble", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Copy)]
pub struct GlobalArgs {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Render diagnostics with source snippets
    #[arg(long, global = true)]
    pub fancy: bool,

    /// Maximum nesting depth accepted by the parser
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and execute a program
    Run(RunArgs),

    /// Parse and analyze files without running them
    Check(CheckArgs),

    /// Print the compiled bytecode of a program
    Dump(DumpArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source file to run (use - for stdin)
    ///
    /// With -, stdin is consumed by the source text, so a program that calls
    /// read() fails with "unexpected end of input".
    pub file: String,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Source files to check (use - for stdin)
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Only report through the exit code
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `dump` command.
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Source file to compile (use - for stdin)
    pub file: String,
}
