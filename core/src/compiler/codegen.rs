//! Linearizes an analyzed tree into bytecode.
//!
//! Layout of the generated program:
//!
//! ```text
//! 0: Alloc <globals>          (only when there are globals)
//!    <init>; SetG <slot>      (per global, in source order)
//!    CallBegin
//!    Call <main> 0
//!    Exit
//!    <functions...>
//! ```
//!
//! Each function starts with `Alloc <params + locals>` and ends with an
//! implicit `Ret`. Expressions push their value; statements leave the stack
//! as they found it.

use hashbrown::HashMap;

use super::error::CompileError;
use super::label::{CodeWriter, LabelId, Operand};
use crate::analyzer::{Analysis, Storage};
use crate::syntax::{Ast, BinaryOp, Intrinsic, Literal, NodeId, NodeKind, OpCategory, PrimKind};
use crate::vm::{Code, Instruction};

type Result<T> = core::result::Result<T, CompileError>;

/// Generate the bytecode for an analyzed program.
pub fn generate(ast: &Ast<'_>, analysis: &Analysis) -> Result<Code> {
    let mut codegen = CodeGen {
        ast,
        analysis,
        writer: CodeWriter::new(),
        functions: HashMap::new(),
        loops: HashMap::new(),
    };
    codegen.program()?;
    let code = codegen.writer.finish()?;
    tracing::debug!(
        cells = code.len(),
        strings = code.strings.len(),
        "Generated bytecode"
    );
    Ok(code)
}

struct CodeGen<'g, 'a> {
    ast: &'g Ast<'a>,
    analysis: &'g Analysis,
    writer: CodeWriter,
    /// Start label of every user function.
    functions: HashMap<NodeId, LabelId>,
    /// `(start, end)` labels of every loop being generated.
    loops: HashMap<NodeId, (LabelId, LabelId)>,
}

impl<'g, 'a> CodeGen<'g, 'a> {
    fn program(&mut self) -> Result<()> {
        let ast = self.ast;
        for &decl in ast.decls() {
            if let NodeKind::FnDecl { body: Some(_), .. } = ast.kind(decl) {
                let label = self.writer.new_label();
                self.functions.insert(decl, label);
            }
        }

        let globals = self.analysis.resolution.globals();
        if globals > 0 {
            self.writer.emit_imm(Instruction::Alloc, globals as i32)?;
        }
        for &decl in ast.decls() {
            if let NodeKind::VarDecl { init, .. } = ast.kind(decl) {
                self.writer.mark_line(ast.token(decl).line);
                self.initializer(*init)?;
                self.store(decl)?;
            }
        }

        let entry = self.analysis.entry;
        let main = self.function_label(entry)?;
        self.writer.mark_line(ast.token(entry).line);
        self.writer.emit(Instruction::CallBegin, &[])?;
        self.writer
            .emit(Instruction::Call, &[Operand::Label(main), Operand::Imm(0)])?;
        self.writer.emit(Instruction::Exit, &[])?;

        for &decl in ast.decls() {
            if let NodeKind::FnDecl { body: Some(body), .. } = ast.kind(decl) {
                self.function(decl, *body)?;
            }
        }
        Ok(())
    }

    fn function(&mut self, function: NodeId, body: NodeId) -> Result<()> {
        let mark = self.writer.label_mark();
        let start = self.function_label(function)?;
        tracing::debug!(
            name = self.ast.declared_name(function),
            offset = self.writer.offset(),
            "Generating function"
        );

        self.writer.mark_line(self.ast.token(function).line);
        self.writer.place(start)?;
        let frame = self
            .analysis
            .resolution
            .frame(function)
            .ok_or(CompileError::MissingFact {
                node: function,
                what: "frame layout",
            })?;
        if frame.total() > 0 {
            self.writer.emit_imm(Instruction::Alloc, frame.total() as i32)?;
        }
        self.block(body)?;
        self.writer.emit(Instruction::Ret, &[])?;

        // Loop labels live inside the function, so all of them must be placed.
        self.writer.ensure_placed_since(mark)
    }

    fn block(&mut self, block: NodeId) -> Result<()> {
        if let NodeKind::Block { stmts } = self.ast.kind(block) {
            for &stmt in stmts {
                self.stmt(stmt)?;
            }
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: NodeId) -> Result<()> {
        let ast = self.ast;
        if !matches!(ast.kind(stmt), NodeKind::Block { .. }) {
            self.writer.mark_line(ast.token(stmt).line);
        }
        match ast.kind(stmt) {
            NodeKind::Block { .. } => self.block(stmt),
            NodeKind::VarDecl { init, .. } => {
                self.initializer(*init)?;
                self.store(stmt)
            }
            NodeKind::If {
                branches,
                otherwise,
            } => self.if_chain(branches, *otherwise),
            NodeKind::While { cond, body } => self.while_loop(stmt, *cond, *body),
            NodeKind::Break => {
                let (_, end) = self.loop_labels(stmt)?;
                self.writer.emit_jump(Instruction::Br, end)
            }
            NodeKind::Continue => {
                let (start, _) = self.loop_labels(stmt)?;
                self.writer.emit_jump(Instruction::Br, start)
            }
            NodeKind::Return { value } => match *value {
                Some(value) => {
                    self.expr(value)?;
                    self.writer.emit(Instruction::RetV, &[])
                }
                None => self.writer.emit(Instruction::Ret, &[]),
            },
            NodeKind::Assign { op, value, .. } => {
                let decl = self.target(stmt)?;
                match op.arithmetic() {
                    None => self.expr(*value)?,
                    Some(arith) => {
                        self.load(stmt)?;
                        self.expr(*value)?;
                        let ty = self.type_of(decl)?;
                        self.writer.emit(binary_instruction(arith, ty)?, &[])?;
                    }
                }
                self.store(decl)
            }
            NodeKind::CallStmt { call } => {
                if self.call(*call)? {
                    self.writer.emit(Instruction::Pop, &[])?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Push a declaration's initial value, zero when there is none.
    fn initializer(&mut self, init: Option<NodeId>) -> Result<()> {
        match init {
            Some(init) => self.expr(init),
            None => self.writer.emit_imm(Instruction::Push, 0),
        }
    }

    fn if_chain(&mut self, branches: &[(NodeId, NodeId)], otherwise: Option<NodeId>) -> Result<()> {
        let end = self.writer.new_label();
        for (i, &(cond, body)) in branches.iter().enumerate() {
            let next = self.writer.new_label();
            self.expr(cond)?;
            self.writer.emit_jump(Instruction::Bz, next)?;
            self.block(body)?;
            if i + 1 < branches.len() || otherwise.is_some() {
                self.writer.emit_jump(Instruction::Br, end)?;
            }
            self.writer.place(next)?;
        }
        if let Some(otherwise) = otherwise {
            self.block(otherwise)?;
        }
        self.writer.place(end)
    }

    fn while_loop(&mut self, stmt: NodeId, cond: NodeId, body: NodeId) -> Result<()> {
        let start = self.writer.new_label();
        let end = self.writer.new_label();
        self.loops.insert(stmt, (start, end));

        self.writer.place(start)?;
        self.expr(cond)?;
        self.writer.emit_jump(Instruction::Bz, end)?;
        self.block(body)?;
        self.writer.emit_jump(Instruction::Br, start)?;
        self.writer.place(end)
    }

    fn loop_labels(&self, stmt: NodeId) -> Result<(LabelId, LabelId)> {
        self.analysis
            .resolution
            .loop_of(stmt)
            .and_then(|target| self.loops.get(&target).copied())
            .ok_or(CompileError::MissingFact {
                node: stmt,
                what: "enclosing loop",
            })
    }

    fn expr(&mut self, expr: NodeId) -> Result<()> {
        let ast = self.ast;
        match ast.kind(expr) {
            NodeKind::Const { value } => self.constant(value),
            NodeKind::Var { .. } => self.load(expr),
            NodeKind::Call { .. } => {
                self.call(expr)?;
                Ok(())
            }
            NodeKind::Binary { op, left, right } => self.binary(*op, *left, *right),
            _ => Ok(()),
        }
    }

    fn constant(&mut self, value: &Literal<'_>) -> Result<()> {
        let cell = match *value {
            Literal::Int(value) => value,
            Literal::Bool(value) => value as i32,
            Literal::Float(value) => value.to_bits() as i32,
            Literal::Str(value) => self.writer.add_string(value),
        };
        self.writer.emit_imm(Instruction::Push, cell)
    }

    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> Result<()> {
        match op {
            BinaryOp::And => {
                // a; Bz F; b; Br E; F: Push 0; E:
                let short = self.writer.new_label();
                let end = self.writer.new_label();
                self.expr(left)?;
                self.writer.emit_jump(Instruction::Bz, short)?;
                self.expr(right)?;
                self.writer.emit_jump(Instruction::Br, end)?;
                self.writer.place(short)?;
                self.writer.emit_imm(Instruction::Push, 0)?;
                self.writer.place(end)
            }
            BinaryOp::Or => {
                // a; Bz R; Push 1; Br E; R: b; E:
                let rhs = self.writer.new_label();
                let end = self.writer.new_label();
                self.expr(left)?;
                self.writer.emit_jump(Instruction::Bz, rhs)?;
                self.writer.emit_imm(Instruction::Push, 1)?;
                self.writer.emit_jump(Instruction::Br, end)?;
                self.writer.place(rhs)?;
                self.expr(right)?;
                self.writer.place(end)
            }
            _ if op.is_compound() => {
                // The expression's value is the variable after the update.
                let decl = self.target(left)?;
                let ty = self.type_of(decl)?;
                self.load(left)?;
                self.expr(right)?;
                self.writer.emit(binary_instruction(op.arithmetic(), ty)?, &[])?;
                self.store(decl)?;
                self.load(left)
            }
            _ => {
                let ty = self.operand_type(left, right)?;
                self.expr(left)?;
                self.expr(right)?;
                self.writer.emit(binary_instruction(op, ty)?, &[])
            }
        }
    }

    /// Emit a call. Returns whether it leaves a value on the stack.
    fn call(&mut self, call: NodeId) -> Result<bool> {
        let ast = self.ast;
        let NodeKind::Call { args, .. } = ast.kind(call) else {
            return Ok(false);
        };
        let function = self.target(call)?;

        if let NodeKind::FnDecl {
            intrinsic: Some(intrinsic),
            ..
        } = ast.kind(function)
        {
            for &arg in args {
                self.expr(arg)?;
            }
            self.writer.emit(intrinsic_instruction(*intrinsic), &[])?;
            return Ok(intrinsic.returns().has_value());
        }

        let start = self.function_label(function)?;
        self.writer.emit(Instruction::CallBegin, &[])?;
        for &arg in args {
            self.expr(arg)?;
        }
        self.writer.emit(
            Instruction::Call,
            &[Operand::Label(start), Operand::Imm(args.len() as i32)],
        )?;
        // `Ret` pushes a zero, so every user call leaves a value.
        Ok(true)
    }

    /// Push the variable bound at `node`.
    fn load(&mut self, node: NodeId) -> Result<()> {
        let decl = self.target(node)?;
        match self.storage(decl)? {
            Storage::Local(slot) => self.writer.emit_imm(Instruction::GetL, slot as i32),
            Storage::Global(slot) => self.writer.emit_imm(Instruction::GetG, slot as i32),
        }
    }

    /// Pop the top of the stack into `decl`.
    fn store(&mut self, decl: NodeId) -> Result<()> {
        match self.storage(decl)? {
            Storage::Local(slot) => self.writer.emit_imm(Instruction::SetL, slot as i32),
            Storage::Global(slot) => self.writer.emit_imm(Instruction::SetG, slot as i32),
        }
    }

    fn target(&self, node: NodeId) -> Result<NodeId> {
        self.analysis
            .resolution
            .target(node)
            .ok_or(CompileError::MissingFact {
                node,
                what: "binding",
            })
    }

    fn storage(&self, decl: NodeId) -> Result<Storage> {
        self.analysis
            .resolution
            .storage(decl)
            .ok_or(CompileError::MissingFact {
                node: decl,
                what: "storage",
            })
    }

    fn type_of(&self, node: NodeId) -> Result<PrimKind> {
        self.analysis
            .types
            .get(node)
            .ok_or(CompileError::MissingFact { node, what: "type" })
    }

    /// Type the instruction for a binary operator is selected by.
    fn operand_type(&self, left: NodeId, right: NodeId) -> Result<PrimKind> {
        self.type_of(left).or_else(|_| self.type_of(right))
    }

    fn function_label(&self, function: NodeId) -> Result<LabelId> {
        self.functions
            .get(&function)
            .copied()
            .ok_or(CompileError::MissingFact {
                node: function,
                what: "function label",
            })
    }
}

/// Select the instruction for `op` applied to operands of type `ty`.
fn binary_instruction(op: BinaryOp, ty: PrimKind) -> Result<Instruction> {
    use Instruction::*;
    let float = ty == PrimKind::Float;
    let instruction = match (op.category(), op.arithmetic()) {
        (OpCategory::Arithmetic, _) if !ty.is_numeric() => None,
        (OpCategory::Arithmetic, BinaryOp::Add) => Some(if float { FloatAdd } else { IntAdd }),
        (OpCategory::Arithmetic, BinaryOp::Sub) => Some(if float { FloatSub } else { IntSub }),
        (OpCategory::Arithmetic, BinaryOp::Mul) => Some(if float { FloatMul } else { IntMul }),
        (OpCategory::Arithmetic, BinaryOp::Div) => Some(if float { FloatDiv } else { IntDiv }),
        (OpCategory::Comparison, _) if !ty.is_comparable() => None,
        (OpCategory::Comparison, BinaryOp::Less) => Some(if float { FloatLess } else { IntLess }),
        (OpCategory::Comparison, BinaryOp::LessEqual) => {
            Some(if float { FloatLessEqual } else { IntLessEqual })
        }
        (OpCategory::Comparison, BinaryOp::Greater) => {
            Some(if float { FloatGreater } else { IntGreater })
        }
        (OpCategory::Comparison, BinaryOp::GreaterEqual) => {
            Some(if float { FloatGreaterEqual } else { IntGreaterEqual })
        }
        (OpCategory::Equality, BinaryOp::Equal) => match ty {
            PrimKind::Float => Some(FloatEq),
            PrimKind::String => Some(StrEq),
            PrimKind::Int | PrimKind::Bool => Some(IntEq),
            PrimKind::Void => None,
        },
        (OpCategory::Equality, BinaryOp::NotEqual) => match ty {
            PrimKind::Float => Some(FloatNe),
            PrimKind::String => Some(StrNe),
            PrimKind::Int | PrimKind::Bool => Some(IntNe),
            PrimKind::Void => None,
        },
        _ => None,
    };
    instruction.ok_or(CompileError::NoInstruction { op, ty })
}

fn intrinsic_instruction(intrinsic: Intrinsic) -> Instruction {
    match intrinsic {
        Intrinsic::Print => Instruction::Print,
        Intrinsic::PrintFloat => Instruction::PrintFloat,
        Intrinsic::PrintString => Instruction::PrintString,
        Intrinsic::Read => Instruction::Read,
    }
}
