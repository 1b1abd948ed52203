//! Pebble - a small C-like language with a bytecode virtual machine.
//!
//! # Overview
//!
//! Pebble programs are made of global variables and functions over the
//! primitive types `int`, `float`, `string`, `bool` and `void`. Execution
//! starts at `int main()`. Source is compiled in one pass to a linear
//! bytecode program, which then runs on a stack machine with a flat memory
//! region.
//!
//! # Quick Start
//!
//! ```
//! use pebble::{CompileOptions, compile};
//!
//! let source = r#"
//!     int square(int n) { return n * n; }
//!     int main() {
//!         print_string("squares");
//!         int i = 1;
//!         while (i <= 3) { print(square(i)); i += 1; }
//!         return 0;
//!     }
//! "#;
//!
//! let program = compile(source, &CompileOptions::default()).unwrap();
//! let mut output = Vec::new();
//! let result = program.run(&b""[..], &mut output).unwrap();
//! assert_eq!(result, 0);
//! assert_eq!(String::from_utf8(output).unwrap(), "squares\n1\n4\n9\n");
//! ```
//!
//! # Errors
//!
//! Every failure is reported as an [`Error`] carrying [`Diagnostic`]s. Use
//! [`render_error_to`] to print them for a terminal.

// Error rendering utilities
pub mod error_renderer;
pub use error_renderer::{CharSet, RenderConfig, Style, render_error, render_error_to};

// Re-export public API from pebble_core
pub use pebble_core::api::{
    CompileOptions, CompiledProgram, Diagnostic, Error, Severity, check, compile,
};

// Re-export the bytecode model for tooling
pub use pebble_core::vm::{Code, Instruction};
