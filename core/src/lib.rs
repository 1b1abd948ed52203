//! Compiler and bytecode virtual machine for the Pebble language.
//!
//! The pipeline runs strictly in sequence:
//!
//! 1. [`parser`] turns source text into an [`syntax::Ast`] arena.
//! 2. [`analyzer`] resolves names and checks types, producing side tables.
//! 3. [`compiler`] linearizes the tree into a [`vm::Code`] object.
//! 4. [`vm`] executes the bytecode in a flat memory region.
//!
//! Most users only need [`api::compile`] and [`api::CompiledProgram::run`].

pub mod analyzer;
pub mod api;
pub mod compiler;
pub mod parser;
pub mod syntax;
pub mod vm;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_label_patching() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
