use std::io::{BufRead, Write};

use static_assertions::const_assert;

use super::error::{ExecutionError, RuntimeError};
use super::instruction_set::Instruction;
use super::code::Code;

/// Cells of VM memory.
pub const MEMORY_SIZE: usize = 4096;
/// First cell of the stack region. Code is loaded below it.
pub const STACK_BASE: usize = 1024;
/// Cells written by `Call` below a frame: saved `ip`, saved `fp`, saved `sp`.
pub const FRAME_HEADER: usize = 3;

const_assert!(STACK_BASE > 0);
const_assert!(STACK_BASE + FRAME_HEADER < MEMORY_SIZE);
const_assert!(MEMORY_SIZE <= i32::MAX as usize);

type Step<T> = Result<T, RuntimeError>;

/// Stack machine executing a [`Code`] object in one flat `i32` memory.
///
/// Layout: bytecode at `0..code.len()`, globals from `STACK_BASE` upwards,
/// then call frames and operand values up to `MEMORY_SIZE`.
pub struct VM<'c, R, W> {
    code: &'c Code,
    memory: Box<[i32]>,
    ip: usize,
    fp: usize,
    sp: usize,
    running: bool,
    input: R,
    output: W,
}

impl<'c, R: BufRead, W: Write> VM<'c, R, W> {
    /// Load `code` into a fresh memory image.
    pub fn new(code: &'c Code, input: R, output: W) -> Result<Self, ExecutionError> {
        if code.len() > STACK_BASE {
            return Err(ExecutionError {
                kind: RuntimeError::CodeTooLarge {
                    size: code.len(),
                    max: STACK_BASE,
                },
                offset: 0,
                line: None,
            });
        }
        let mut memory = vec![0; MEMORY_SIZE].into_boxed_slice();
        memory[..code.len()].copy_from_slice(&code.instructions);
        Ok(VM {
            code,
            memory,
            ip: 0,
            fp: STACK_BASE,
            sp: STACK_BASE,
            running: true,
            input,
            output,
        })
    }

    /// Execute `code` from offset zero and return the program result.
    pub fn execute(code: &'c Code, input: R, output: W) -> Result<i32, ExecutionError> {
        let mut vm = VM::new(code, input, output)?;
        vm.run()
    }

    /// Run until `Exit`, then pop the result.
    pub fn run(&mut self) -> Result<i32, ExecutionError> {
        while self.running {
            self.step()?;
        }
        let offset = self.ip;
        let result = self.pop().map_err(|kind| self.fail(kind, offset))?;
        self.output
            .flush()
            .map_err(|e| self.fail(RuntimeError::Io(e), offset))?;
        tracing::debug!(result, "Program exited");
        Ok(result)
    }

    /// Execute a single instruction. Returns whether the machine is still
    /// running.
    pub fn step(&mut self) -> Result<bool, ExecutionError> {
        let offset = self.ip;
        self.execute_one().map_err(|kind| self.fail(kind, offset))?;
        Ok(self.running)
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn fp(&self) -> usize {
        self.fp
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Live stack cells, from `STACK_BASE` to `sp`.
    pub fn stack(&self) -> &[i32] {
        &self.memory[STACK_BASE..self.sp]
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn fail(&self, kind: RuntimeError, offset: usize) -> ExecutionError {
        ExecutionError {
            kind,
            offset,
            line: self.code.line_at(offset),
        }
    }

    // === Memory primitives ===

    fn read_imm(&mut self) -> Step<i32> {
        if self.ip >= self.code.len() {
            return Err(RuntimeError::IpOutOfBounds { ip: self.ip });
        }
        let value = self.memory[self.ip];
        self.ip += 1;
        Ok(value)
    }

    fn push(&mut self, value: i32) -> Step<()> {
        if self.sp >= MEMORY_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.memory[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Step<i32> {
        if self.sp <= STACK_BASE {
            return Err(RuntimeError::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.memory[self.sp])
    }

    fn address(base: usize, slot: i32) -> Step<usize> {
        let address = base as i64 + slot as i64;
        if (STACK_BASE as i64..MEMORY_SIZE as i64).contains(&address) {
            Ok(address as usize)
        } else {
            Err(RuntimeError::OutOfBounds { address })
        }
    }

    fn load(&self, address: usize) -> i32 {
        self.memory[address]
    }

    fn store(&mut self, address: usize, value: i32) {
        self.memory[address] = value;
    }

    fn jump(&mut self, target: i32) -> Step<()> {
        match usize::try_from(target) {
            Ok(target) if target < self.code.len() => {
                self.ip = target;
                Ok(())
            }
            _ => Err(RuntimeError::InvalidJump { target }),
        }
    }

    /// Move `sp` to an absolute position inside the stack region.
    fn set_sp(&mut self, sp: i64) -> Step<()> {
        if sp > MEMORY_SIZE as i64 {
            return Err(RuntimeError::StackOverflow);
        }
        if sp < STACK_BASE as i64 {
            return Err(RuntimeError::StackUnderflow);
        }
        self.sp = sp as usize;
        Ok(())
    }

    // === Instruction helpers ===

    fn int_binary(&mut self, op: impl FnOnce(i32, i32) -> Step<i32>) -> Step<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = op(a, b)?;
        self.push(result)
    }

    fn float_binary(&mut self, op: impl FnOnce(f32, f32) -> f32) -> Step<()> {
        self.int_binary(|a, b| Ok(to_bits(op(from_bits(a), from_bits(b)))))
    }

    fn int_compare(&mut self, op: impl FnOnce(i32, i32) -> bool) -> Step<()> {
        self.int_binary(|a, b| Ok(op(a, b) as i32))
    }

    fn float_compare(&mut self, op: impl FnOnce(f32, f32) -> bool) -> Step<()> {
        self.int_binary(|a, b| Ok(op(from_bits(a), from_bits(b)) as i32))
    }

    fn string(&self, index: i32) -> Step<&'c str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.code.strings.get(i))
            .map(String::as_str)
            .ok_or(RuntimeError::InvalidString { index })
    }

    fn string_compare(&mut self, equal: bool) -> Step<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let same = self.string(a)? == self.string(b)?;
        self.push((same == equal) as i32)
    }

    /// Restore the caller's frame from the header and push the call's value.
    fn return_with(&mut self, value: i32) -> Step<()> {
        let header = Self::address(self.fp, -(FRAME_HEADER as i32))?;
        let saved_ip = self.load(header);
        let saved_fp = self.load(header + 1);
        let saved_sp = self.load(header + 2);
        self.jump(saved_ip)?;
        self.fp = Self::address(saved_fp as usize, 0)?;
        self.set_sp(saved_sp as i64)?;
        self.push(value)
    }

    fn read_int(&mut self) -> Step<i32> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(RuntimeError::EndOfInput);
            }
            let text = line.trim();
            if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(value) = text.parse::<i32>() {
                    return Ok(value);
                }
            }
            writeln!(self.output, "invalid integer, try again")?;
            self.output.flush()?;
        }
    }

    fn execute_one(&mut self) -> Step<()> {
        let offset = self.ip;
        let opcode = self.read_imm()?;
        let instruction =
            Instruction::from_opcode(opcode).ok_or(RuntimeError::UndefinedOpcode { opcode })?;
        tracing::trace!(offset, %instruction, sp = self.sp, fp = self.fp, "Step");

        use Instruction::*;
        match instruction {
            IntAdd => self.int_binary(|a, b| Ok(a.wrapping_add(b)))?,
            IntSub => self.int_binary(|a, b| Ok(a.wrapping_sub(b)))?,
            IntMul => self.int_binary(|a, b| Ok(a.wrapping_mul(b)))?,
            IntDiv => self.int_binary(|a, b| {
                if b == 0 {
                    Err(RuntimeError::DivisionByZero)
                } else {
                    Ok(a.wrapping_div(b))
                }
            })?,
            FloatAdd => self.float_binary(|a, b| a + b)?,
            FloatSub => self.float_binary(|a, b| a - b)?,
            FloatMul => self.float_binary(|a, b| a * b)?,
            FloatDiv => self.float_binary(|a, b| a / b)?,

            IntLess => self.int_compare(|a, b| a < b)?,
            IntLessEqual => self.int_compare(|a, b| a <= b)?,
            IntGreater => self.int_compare(|a, b| a > b)?,
            IntGreaterEqual => self.int_compare(|a, b| a >= b)?,
            FloatLess => self.float_compare(|a, b| a < b)?,
            FloatLessEqual => self.float_compare(|a, b| a <= b)?,
            FloatGreater => self.float_compare(|a, b| a > b)?,
            FloatGreaterEqual => self.float_compare(|a, b| a >= b)?,
            IntEq => self.int_compare(|a, b| a == b)?,
            IntNe => self.int_compare(|a, b| a != b)?,
            FloatEq => self.float_compare(|a, b| a == b)?,
            FloatNe => self.float_compare(|a, b| a != b)?,
            StrEq => self.string_compare(true)?,
            StrNe => self.string_compare(false)?,

            GetL => {
                let slot = self.read_imm()?;
                let value = self.load(Self::address(self.fp, slot)?);
                self.push(value)?;
            }
            SetL => {
                let slot = self.read_imm()?;
                let address = Self::address(self.fp, slot)?;
                let value = self.pop()?;
                self.store(address, value);
            }
            GetG => {
                let slot = self.read_imm()?;
                let value = self.load(Self::address(STACK_BASE, slot)?);
                self.push(value)?;
            }
            SetG => {
                let slot = self.read_imm()?;
                let address = Self::address(STACK_BASE, slot)?;
                let value = self.pop()?;
                self.store(address, value);
            }

            Pop => {
                self.pop()?;
            }
            Push => {
                let value = self.read_imm()?;
                self.push(value)?;
            }
            Alloc => {
                let cells = self.read_imm()?;
                self.set_sp(self.sp as i64 + cells as i64)?;
            }

            Br => {
                let target = self.read_imm()?;
                self.jump(target)?;
            }
            Bz => {
                let target = self.read_imm()?;
                if self.pop()? == 0 {
                    self.jump(target)?;
                }
            }
            Ret => self.return_with(0)?,
            RetV => {
                let value = self.pop()?;
                self.return_with(value)?;
            }
            CallBegin => {
                for _ in 0..FRAME_HEADER {
                    self.push(0)?;
                }
            }
            Call => {
                let target = self.read_imm()?;
                let argc = self.read_imm()?;
                let frame = self.sp as i64 - argc as i64;
                let header = frame - FRAME_HEADER as i64;
                if argc < 0 || header < STACK_BASE as i64 {
                    return Err(RuntimeError::StackUnderflow);
                }
                let (frame, header) = (frame as usize, header as usize);
                self.store(header, self.ip as i32);
                self.store(header + 1, self.fp as i32);
                self.store(header + 2, header as i32);
                self.jump(target)?;
                self.fp = frame;
                self.sp = frame;
            }
            Exit => self.running = false,

            Read => {
                let value = self.read_int()?;
                self.push(value)?;
            }
            Print => {
                let value = self.pop()?;
                writeln!(self.output, "{value}")?;
            }
            PrintFloat => {
                let value = from_bits(self.pop()?);
                writeln!(self.output, "{value}")?;
            }
            PrintString => {
                let index = self.pop()?;
                let text = self.string(index)?;
                writeln!(self.output, "{text}")?;
            }
        }
        Ok(())
    }
}

fn from_bits(cell: i32) -> f32 {
    f32::from_bits(cell as u32)
}

fn to_bits(value: f32) -> i32 {
    value.to_bits() as i32
}
