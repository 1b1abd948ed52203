//! Public API for the Pebble language.
//!
//! [`compile`] runs the lexer, parser, and both semantic passes, then
//! generates bytecode. Any problem found before execution is reported as
//! [`Error::Compilation`] with one [`Diagnostic`] per issue. The resulting
//! [`CompiledProgram`] can be run any number of times.
//!
//! # Example
//!
//! ```
//! use pebble_core::api::{CompileOptions, Error, compile};
//!
//! let err = compile("int main() { return x; }", &CompileOptions::default()).unwrap_err();
//! assert!(matches!(err, Error::Compilation { .. }));
//! assert_eq!(err.diagnostics()[0].message, "undeclared identifier `x`");
//! ```

mod error;
mod options;
mod program;

pub use error::{Diagnostic, Error, Severity};
pub use options::CompileOptions;
pub use program::{CompiledProgram, check, compile};
