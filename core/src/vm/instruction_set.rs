//! Pebble VM instructions.
//!
//! # Encoding
//!
//! Bytecode is a flat `i32` array. Every instruction is its opcode followed by
//! exactly as many operand cells as the registry declares for it, so the
//! offset of the next instruction is `offset + 1 + operand count`:
//!
//! ```text
//! ┌────────┬───────────┬───────────┐
//! │ opcode │ operand 0 │ operand 1 │   (Call: target, argument count)
//! └────────┴───────────┴───────────┘
//! ```
//!
//! Opcodes start at 1 so that zeroed memory never decodes to an instruction.
//!
//! # Stack Discipline
//!
//! Binary operations pop the right operand, then the left one, and push the
//! result: `[..., a, b] -> [..., a op b]`. Floats travel through the stack as
//! the raw bits of an `f32`; booleans are `0` or `1`; strings are indices into
//! the string table.

use core::fmt;

use hashbrown::HashMap;
use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    // ========================================================================
    // Arithmetic: [a, b] -> [a op b]
    // ========================================================================
    /// Wrapping integer addition.
    IntAdd,
    IntSub,
    IntMul,
    /// Truncating integer division. Fails on a zero divisor.
    IntDiv,
    FloatAdd,
    FloatSub,
    FloatMul,
    FloatDiv,

    // ========================================================================
    // Comparison: [a, b] -> [0 | 1]
    // ========================================================================
    IntLess,
    IntLessEqual,
    IntGreater,
    IntGreaterEqual,
    FloatLess,
    FloatLessEqual,
    FloatGreater,
    FloatGreaterEqual,
    /// Also used for booleans.
    IntEq,
    IntNe,
    FloatEq,
    FloatNe,
    /// Compares the contents of two string table entries.
    StrEq,
    StrNe,

    // ========================================================================
    // Variables
    // ========================================================================
    /// Operand: frame slot | Stack: [...] -> [..., value]
    GetL,
    /// Operand: frame slot | Stack: [..., value] -> [...]
    SetL,
    /// Operand: global slot | Stack: [...] -> [..., value]
    GetG,
    /// Operand: global slot | Stack: [..., value] -> [...]
    SetG,

    // ========================================================================
    // Stack
    // ========================================================================
    Pop,
    /// Operand: value | Stack: [...] -> [..., value]
    Push,
    /// Operand: cell count. Bumps `sp` without clearing the cells.
    Alloc,

    // ========================================================================
    // Control flow
    // ========================================================================
    /// Operand: target offset.
    Br,
    /// Operand: target offset | Stack: [..., cond] -> [...]
    Bz,
    /// Return from a function, leaving `0` as the call's value.
    Ret,
    /// Return from a function, leaving the popped value as the call's value.
    RetV,
    /// Reserve the three frame header cells of an upcoming call.
    CallBegin,
    /// Operands: target offset, argument count.
    Call,
    /// Stop execution. The value on top of the stack is the program result.
    Exit,

    // ========================================================================
    // I/O
    // ========================================================================
    /// Stack: [...] -> [..., int read from input]
    Read,
    Print,
    PrintFloat,
    PrintString,
}

/// Registry entry for one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionInfo {
    pub instruction: Instruction,
    pub mnemonic: &'static str,
    pub opcode: i32,
    pub operands: usize,
}

// Registration order fixes the opcodes: the entry at index `i` gets `i + 1`.
const REGISTRY: [(Instruction, &str, usize); 40] = {
    use Instruction::*;
    [
        (IntAdd, "IntAdd", 0),
        (IntSub, "IntSub", 0),
        (IntMul, "IntMul", 0),
        (IntDiv, "IntDiv", 0),
        (FloatAdd, "FloatAdd", 0),
        (FloatSub, "FloatSub", 0),
        (FloatMul, "FloatMul", 0),
        (FloatDiv, "FloatDiv", 0),
        (IntLess, "IntLess", 0),
        (IntLessEqual, "IntLessEqual", 0),
        (IntGreater, "IntGreater", 0),
        (IntGreaterEqual, "IntGreaterEqual", 0),
        (FloatLess, "FloatLess", 0),
        (FloatLessEqual, "FloatLessEqual", 0),
        (FloatGreater, "FloatGreater", 0),
        (FloatGreaterEqual, "FloatGreaterEqual", 0),
        (IntEq, "IntEq", 0),
        (IntNe, "IntNe", 0),
        (FloatEq, "FloatEq", 0),
        (FloatNe, "FloatNe", 0),
        (StrEq, "StrEq", 0),
        (StrNe, "StrNe", 0),
        (GetL, "GetL", 1),
        (SetL, "SetL", 1),
        (GetG, "GetG", 1),
        (SetG, "SetG", 1),
        (Pop, "Pop", 0),
        (Push, "Push", 1),
        (Alloc, "Alloc", 1),
        (Br, "Br", 1),
        (Bz, "Bz", 1),
        (Ret, "Ret", 0),
        (RetV, "RetV", 0),
        (CallBegin, "CallBegin", 0),
        (Call, "Call", 2),
        (Exit, "Exit", 0),
        (Read, "Read", 0),
        (Print, "Print", 0),
        (PrintFloat, "PrintFloat", 0),
        (PrintString, "PrintString", 0),
    ]
};

/// Bidirectional map between mnemonics, opcodes and operand counts.
#[derive(Debug)]
pub struct InstructionSet {
    entries: Vec<InstructionInfo>,
    by_mnemonic: HashMap<&'static str, usize>,
    by_opcode: HashMap<i32, usize>,
}

impl InstructionSet {
    fn new() -> Self {
        let mut set = InstructionSet {
            entries: Vec::with_capacity(REGISTRY.len()),
            by_mnemonic: HashMap::with_capacity(REGISTRY.len()),
            by_opcode: HashMap::with_capacity(REGISTRY.len()),
        };
        for (index, &(instruction, mnemonic, operands)) in REGISTRY.iter().enumerate() {
            let opcode = index as i32 + 1;
            set.entries.push(InstructionInfo {
                instruction,
                mnemonic,
                opcode,
                operands,
            });
            set.by_mnemonic.insert(mnemonic, index);
            set.by_opcode.insert(opcode, index);
        }
        set
    }

    pub fn by_mnemonic(&self, mnemonic: &str) -> Option<&InstructionInfo> {
        self.by_mnemonic.get(mnemonic).map(|&i| &self.entries[i])
    }

    pub fn by_opcode(&self, opcode: i32) -> Option<&InstructionInfo> {
        self.by_opcode.get(&opcode).map(|&i| &self.entries[i])
    }

    /// Entry of a known instruction.
    pub fn info(&self, instruction: Instruction) -> &InstructionInfo {
        // Entries are registered in declaration order.
        &self.entries[instruction as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static! {
    /// The process-wide instruction registry, built on first use.
    pub static ref INSTRUCTIONS: InstructionSet = InstructionSet::new();
}

impl Instruction {
    pub fn opcode(self) -> i32 {
        INSTRUCTIONS.info(self).opcode
    }

    pub fn mnemonic(self) -> &'static str {
        INSTRUCTIONS.info(self).mnemonic
    }

    pub fn operand_count(self) -> usize {
        INSTRUCTIONS.info(self).operands
    }

    pub fn from_opcode(opcode: i32) -> Option<Instruction> {
        INSTRUCTIONS.by_opcode(opcode).map(|info| info.instruction)
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Instruction> {
        INSTRUCTIONS.by_mnemonic(mnemonic).map(|info| info.instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
