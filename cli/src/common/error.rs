//! Error reporting for the CLI.

use pebble::{CompileOptions, Error, RenderConfig, Style, render_error_to};

use crate::cli::GlobalArgs;

/// Compile options selected on the command line.
pub fn compile_options(global: &GlobalArgs) -> CompileOptions {
    CompileOptions::default().with_max_depth(global.max_depth)
}

/// Render an error to stderr.
pub fn report(error: &Error, global: &GlobalArgs) {
    let config = RenderConfig {
        color: !global.no_color,
        style: if global.fancy {
            Style::Fancy
        } else {
            Style::Plain
        },
        ..Default::default()
    };
    render_error_to(error, &mut std::io::stderr(), &config).ok();
}
