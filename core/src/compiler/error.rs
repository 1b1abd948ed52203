use thiserror::Error;

use super::label::LabelId;
use crate::syntax::{BinaryOp, NodeId, PrimKind};
use crate::vm::Instruction;

/// Internal consistency failures during code generation.
///
/// None of these can be caused by a program that passed analysis; they
/// indicate a bug in the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("`{instruction}` takes {expected} operand(s), got {found}")]
    OperandCount {
        instruction: Instruction,
        expected: usize,
        found: usize,
    },

    #[error("label {0} placed twice")]
    LabelPlacedTwice(LabelId),

    #[error("{count} label(s) left unplaced")]
    UnplacedLabel { count: usize },

    #[error("program needs {size} cells but the code region holds {max}")]
    CodeTooLarge { size: usize, max: usize },

    #[error("no {what} recorded for node {node:?}")]
    MissingFact { node: NodeId, what: &'static str },

    #[error("no instruction for `{op}` on {ty}")]
    NoInstruction { op: BinaryOp, ty: PrimKind },
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        "C001"
    }
}
