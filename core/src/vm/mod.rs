mod code;
mod error;
mod instruction_set;
#[allow(clippy::module_inception)]
mod vm;

pub use code::{BadOpcode, Code, Decoded, Decoder};
pub use error::{ExecutionError, RuntimeError};
pub use instruction_set::{INSTRUCTIONS, Instruction, InstructionInfo, InstructionSet};
pub use vm::{FRAME_HEADER, MEMORY_SIZE, STACK_BASE, VM};
