//! The `run` command - compile and execute a Pebble file.

use std::process::ExitCode;

use pebble::compile;

use crate::cli::{GlobalArgs, RunArgs};
use crate::common::{compile_options, read_input, report};

/// Run the run command.
pub fn run(args: RunArgs, global: &GlobalArgs) -> ExitCode {
    let (content, display_name) = match read_input(&args.file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let program = match compile(&content, &compile_options(global)) {
        Ok(program) => program,
        Err(e) => {
            report(&e.with_filename(display_name), global);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(file = %display_name, cells = program.code().len(), "Compiled");

    match program.run_stdio() {
        Ok(result) => {
            println!("Result: {result}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e.with_filename(display_name), global);
            ExitCode::FAILURE
        }
    }
}
