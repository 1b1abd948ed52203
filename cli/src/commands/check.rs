//! The `check` command - parse and analyze Pebble files without running.

use std::process::ExitCode;

use pebble::check;

use crate::cli::{CheckArgs, GlobalArgs};
use crate::common::{compile_options, read_input, report};

/// Run the check command.
pub fn run(args: CheckArgs, global: &GlobalArgs) -> ExitCode {
    let mut has_errors = false;

    for file in &args.files {
        if !check_file(file, args.quiet, global) {
            has_errors = true;
        }
    }

    if has_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Check a single file. Returns true if OK, false if errors.
fn check_file(path: &str, quiet: bool, global: &GlobalArgs) -> bool {
    let (content, display_name) = match read_input(path) {
        Ok(c) => c,
        Err(e) => {
            if !quiet {
                eprintln!("error: {}", e);
            }
            return false;
        }
    };

    match check(&content, &compile_options(global)) {
        Ok(()) => {
            if !quiet {
                println!("{}: OK", display_name);
            }
            true
        }
        Err(e) => {
            if !quiet {
                report(&e.with_filename(display_name), global);
            }
            false
        }
    }
}
