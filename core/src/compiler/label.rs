//! Bytecode emission with forward references.
//!
//! A jump to code that has not been emitted yet refers to a [`LabelId`]. Until
//! the label is placed, its operand cell holds [`UNPLACED`] and the cell's
//! position is remembered; placing the label back-patches every recorded
//! cell with the label's offset.

use core::fmt;

use smallvec::SmallVec;

use super::error::CompileError;
use crate::vm::{Code, Instruction, STACK_BASE};

/// Operand value of a reference to a label that has not been placed yet.
pub const UNPLACED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(usize);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
struct Label {
    offset: Option<usize>,
    /// Operand cells waiting for `offset`.
    patches: SmallVec<[usize; 4]>,
}

/// An instruction operand: an immediate or a (possibly pending) label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Imm(i32),
    Label(LabelId),
}

/// Append-only writer for one program.
#[derive(Debug, Default)]
pub struct CodeWriter {
    instructions: Vec<i32>,
    strings: Vec<String>,
    lines: Vec<(usize, u32)>,
    labels: Vec<Label>,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next instruction will be written at.
    pub fn offset(&self) -> usize {
        self.instructions.len()
    }

    pub fn new_label(&mut self) -> LabelId {
        self.labels.push(Label::default());
        LabelId(self.labels.len() - 1)
    }

    /// Fix `label` at the current offset and patch all earlier references.
    pub fn place(&mut self, label: LabelId) -> Result<(), CompileError> {
        let offset = self.offset();
        let entry = &mut self.labels[label.0];
        if entry.offset.is_some() {
            return Err(CompileError::LabelPlacedTwice(label));
        }
        entry.offset = Some(offset);
        for cell in entry.patches.drain(..) {
            debug_assert_eq!(self.instructions[cell], UNPLACED);
            self.instructions[cell] = offset as i32;
        }
        tracing::trace!(%label, offset, "Placed label");
        Ok(())
    }

    /// Append `instruction` with its operands.
    pub fn emit(
        &mut self,
        instruction: Instruction,
        operands: &[Operand],
    ) -> Result<(), CompileError> {
        let expected = instruction.operand_count();
        if operands.len() != expected {
            return Err(CompileError::OperandCount {
                instruction,
                expected,
                found: operands.len(),
            });
        }
        self.instructions.push(instruction.opcode());
        for &operand in operands {
            let value = match operand {
                Operand::Imm(value) => value,
                Operand::Label(label) => {
                    let entry = &mut self.labels[label.0];
                    match entry.offset {
                        Some(offset) => offset as i32,
                        None => {
                            entry.patches.push(self.instructions.len());
                            UNPLACED
                        }
                    }
                }
            };
            self.instructions.push(value);
        }
        Ok(())
    }

    /// Shorthand for an instruction with one immediate operand.
    pub fn emit_imm(&mut self, instruction: Instruction, value: i32) -> Result<(), CompileError> {
        self.emit(instruction, &[Operand::Imm(value)])
    }

    /// Shorthand for a jump to `label`.
    pub fn emit_jump(&mut self, instruction: Instruction, label: LabelId) -> Result<(), CompileError> {
        self.emit(instruction, &[Operand::Label(label)])
    }

    /// Append a string constant and return its index.
    pub fn add_string(&mut self, value: &str) -> i32 {
        self.strings.push(value.to_string());
        (self.strings.len() - 1) as i32
    }

    /// Attribute code emitted from here on to source `line`.
    pub fn mark_line(&mut self, line: u32) {
        let offset = self.offset();
        match self.lines.last_mut() {
            Some((_, last)) if *last == line => {}
            Some((start, last)) if *start == offset => *last = line,
            _ => self.lines.push((offset, line)),
        }
    }

    /// Marker for [`CodeWriter::ensure_placed_since`].
    pub fn label_mark(&self) -> usize {
        self.labels.len()
    }

    /// Fail if any label created after `mark` is still unplaced.
    pub fn ensure_placed_since(&self, mark: usize) -> Result<(), CompileError> {
        let count = self.labels[mark..]
            .iter()
            .filter(|label| label.offset.is_none() || !label.patches.is_empty())
            .count();
        if count == 0 {
            Ok(())
        } else {
            Err(CompileError::UnplacedLabel { count })
        }
    }

    /// Check every label was placed and produce the program.
    pub fn finish(self) -> Result<Code, CompileError> {
        self.ensure_placed_since(0)?;
        if self.instructions.len() > STACK_BASE {
            return Err(CompileError::CodeTooLarge {
                size: self.instructions.len(),
                max: STACK_BASE,
            });
        }
        Ok(Code {
            instructions: self.instructions,
            strings: self.strings,
            lines: self.lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_forward_reference_is_patched() {
        let mut writer = CodeWriter::new();
        let end = writer.new_label();
        writer.emit_jump(Instruction::Br, end).unwrap();
        writer.emit_jump(Instruction::Bz, end).unwrap();
        assert_eq!(writer.instructions[1], UNPLACED);
        assert_eq!(writer.instructions[3], UNPLACED);
        assert!(writer.ensure_placed_since(0).is_err());

        writer.emit(Instruction::Exit, &[]).unwrap();
        writer.place(end).unwrap();
        assert_eq!(writer.instructions[1], 5);
        assert_eq!(writer.instructions[3], 5);
        assert!(writer.ensure_placed_since(0).is_ok());
    }

    #[test]
    fn test_backward_reference_is_immediate() {
        let mut writer = CodeWriter::new();
        writer.emit_imm(Instruction::Push, 1).unwrap();
        let start = writer.new_label();
        writer.place(start).unwrap();
        writer.emit(Instruction::Pop, &[]).unwrap();
        writer.emit_jump(Instruction::Br, start).unwrap();
        let code = writer.finish().unwrap();
        assert_eq!(code.instructions[4], 2);
    }

    #[test]
    fn test_placing_twice_fails() {
        let mut writer = CodeWriter::new();
        let label = writer.new_label();
        writer.place(label).unwrap();
        assert_eq!(
            writer.place(label),
            Err(CompileError::LabelPlacedTwice(label))
        );
    }

    #[test]
    fn test_operand_count_is_checked() {
        let mut writer = CodeWriter::new();
        assert_eq!(
            writer.emit(Instruction::Call, &[Operand::Imm(0)]),
            Err(CompileError::OperandCount {
                instruction: Instruction::Call,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(writer.offset(), 0);
    }

    #[test]
    fn test_unplaced_label_fails_finish() {
        let mut writer = CodeWriter::new();
        let mark = writer.label_mark();
        let _forgotten = writer.new_label();
        assert_eq!(
            writer.ensure_placed_since(mark),
            Err(CompileError::UnplacedLabel { count: 1 })
        );
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_string_constants_are_not_deduplicated() {
        let mut writer = CodeWriter::new();
        assert_eq!(writer.add_string("a"), 0);
        assert_eq!(writer.add_string("a"), 1);
        let code = writer.finish().unwrap();
        assert_eq!(code.strings, vec!["a", "a"]);
    }

    #[test]
    fn test_line_marks() {
        let mut writer = CodeWriter::new();
        writer.mark_line(1);
        writer.mark_line(2);
        writer.emit(Instruction::Pop, &[]).unwrap();
        writer.mark_line(2);
        writer.emit(Instruction::Pop, &[]).unwrap();
        writer.mark_line(5);
        writer.emit(Instruction::Exit, &[]).unwrap();
        let code = writer.finish().unwrap();
        assert_eq!(code.lines, vec![(0, 2), (2, 5)]);
    }
}
