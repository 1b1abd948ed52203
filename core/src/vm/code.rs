use core::fmt;

use super::instruction_set::Instruction;

/// A compiled program: bytecode, string constants and a line table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Code {
    pub instructions: Vec<i32>,
    pub strings: Vec<String>,
    /// `(offset, line)` pairs, sorted by offset. Each entry covers the
    /// instructions up to the next one.
    pub lines: Vec<(usize, u32)>,
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded<'c> {
    pub offset: usize,
    pub instruction: Instruction,
    pub operands: &'c [i32],
}

/// A cell that does not hold a valid instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadOpcode {
    pub offset: usize,
    pub opcode: i32,
}

impl Code {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Source line of the statement that emitted the code at `offset`.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        let index = self.lines.partition_point(|&(start, _)| start <= offset);
        index.checked_sub(1).map(|i| self.lines[i].1)
    }

    /// Walk the bytecode instruction by instruction.
    pub fn decode(&self) -> Decoder<'_> {
        Decoder {
            cells: &self.instructions,
            offset: 0,
        }
    }
}

pub struct Decoder<'c> {
    cells: &'c [i32],
    offset: usize,
}

impl<'c> Iterator for Decoder<'c> {
    type Item = Result<Decoded<'c>, BadOpcode>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        let &opcode = self.cells.get(offset)?;
        let bad = BadOpcode { offset, opcode };
        let Some(instruction) = Instruction::from_opcode(opcode) else {
            self.offset = self.cells.len();
            return Some(Err(bad));
        };
        let end = offset + 1 + instruction.operand_count();
        let Some(operands) = self.cells.get(offset + 1..end) else {
            self.offset = self.cells.len();
            return Some(Err(bad));
        };
        self.offset = end;
        Some(Ok(Decoded {
            offset,
            instruction,
            operands,
        }))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decoded in self.decode() {
            match decoded {
                Ok(Decoded {
                    offset,
                    instruction,
                    operands,
                }) => {
                    write!(f, "{offset:>4}: {instruction}")?;
                    for operand in operands {
                        write!(f, " {operand}")?;
                    }
                    writeln!(f)?;
                }
                Err(BadOpcode { offset, opcode }) => {
                    writeln!(f, "{offset:>4}: <bad opcode {opcode}>")?;
                }
            }
        }
        if !self.strings.is_empty() {
            writeln!(f, "strings:")?;
            for (index, string) in self.strings.iter().enumerate() {
                writeln!(f, "{index:>4}: {string:?}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    fn op(instruction: Instruction) -> i32 {
        instruction.opcode()
    }

    #[test]
    fn test_decode_variable_width() {
        let code = Code {
            instructions: vec![
                op(Instruction::CallBegin),
                op(Instruction::Call),
                5,
                0,
                op(Instruction::Exit),
                op(Instruction::Push),
                7,
                op(Instruction::RetV),
            ],
            ..Code::default()
        };
        let offsets: Vec<_> = code
            .decode()
            .map(|d| {
                let d = d.unwrap();
                (d.offset, d.instruction)
            })
            .collect();
        assert_eq!(
            offsets,
            vec![
                (0, Instruction::CallBegin),
                (1, Instruction::Call),
                (4, Instruction::Exit),
                (5, Instruction::Push),
                (7, Instruction::RetV),
            ]
        );
    }

    #[test]
    fn test_decode_reports_bad_opcode_and_truncation() {
        let code = Code {
            instructions: vec![op(Instruction::Pop), 0],
            ..Code::default()
        };
        let decoded: Vec<_> = code.decode().collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1], Err(BadOpcode { offset: 1, opcode: 0 }));

        let truncated = Code {
            instructions: vec![op(Instruction::Call), 3],
            ..Code::default()
        };
        assert!(truncated.decode().next().unwrap().is_err());
    }

    #[test]
    fn test_line_at() {
        let code = Code {
            lines: vec![(0, 1), (4, 3), (9, 7)],
            ..Code::default()
        };
        assert_eq!(code.line_at(0), Some(1));
        assert_eq!(code.line_at(3), Some(1));
        assert_eq!(code.line_at(4), Some(3));
        assert_eq!(code.line_at(100), Some(7));
        assert_eq!(Code::default().line_at(0), None);
    }

    #[test]
    fn test_display_listing() {
        let code = Code {
            instructions: vec![
                op(Instruction::Push),
                0,
                op(Instruction::PrintString),
                op(Instruction::Br),
                0,
            ],
            strings: vec!["hi\n".to_string()],
            lines: Vec::new(),
        };
        expect![[r#"
               0: Push 0
               2: PrintString
               3: Br 0
            strings:
               0: "hi\n"
        "#]]
        .assert_eq(&code.to_string());
    }
}
