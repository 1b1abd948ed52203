//! Common utilities shared across CLI commands.

pub mod error;
pub mod input;

pub use error::{compile_options, report};
pub use input::read_input;
