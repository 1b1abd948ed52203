//! Code generation: analyzed tree to bytecode.

mod codegen;
mod error;
mod label;


pub use codegen::generate;
pub use error::CompileError;
pub use label::{CodeWriter, LabelId, Operand, UNPLACED};
