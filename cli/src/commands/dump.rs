//! The `dump` command - print the bytecode of a Pebble file.

use std::process::ExitCode;

use pebble::compile;

use crate::cli::{DumpArgs, GlobalArgs};
use crate::common::{compile_options, read_input, report};

/// Run the dump command.
pub fn run(args: DumpArgs, global: &GlobalArgs) -> ExitCode {
    let (content, display_name) = match read_input(&args.file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match compile(&content, &compile_options(global)) {
        Ok(program) => {
            print!("{}", program.code());
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e.with_filename(display_name), global);
            ExitCode::FAILURE
        }
    }
}
