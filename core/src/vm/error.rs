use thiserror::Error;

/// Fatal conditions raised while executing bytecode.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("undefined opcode {opcode}")]
    UndefinedOpcode { opcode: i32 },

    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("memory access out of bounds at address {address}")]
    OutOfBounds { address: i64 },

    #[error("invalid jump target {target}")]
    InvalidJump { target: i32 },

    #[error("instruction pointer {ip} left the code region")]
    IpOutOfBounds { ip: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid string constant index {index}")]
    InvalidString { index: i32 },

    #[error("unexpected end of input")]
    EndOfInput,

    #[error("program of {size} cells does not fit in the {max}-cell code region")]
    CodeTooLarge { size: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        use RuntimeError::*;
        match self {
            UndefinedOpcode { .. } => "R001",
            StackOverflow => "R002",
            StackUnderflow => "R003",
            OutOfBounds { .. } => "R004",
            InvalidJump { .. } => "R005",
            IpOutOfBounds { .. } => "R006",
            DivisionByZero => "R007",
            InvalidString { .. } => "R008",
            EndOfInput => "R009",
            CodeTooLarge { .. } => "R010",
            Io(_) => "R011",
        }
    }
}

/// A runtime error together with where it happened.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ExecutionError {
    pub kind: RuntimeError,
    /// Offset of the instruction that failed.
    pub offset: usize,
    /// Source line of the statement that emitted that instruction.
    pub line: Option<u32>,
}
