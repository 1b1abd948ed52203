use thiserror::Error;

use crate::syntax::{Ast, BinaryOp, NodeId, PrimKind, Span};

/// What went wrong during name resolution or type checking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticErrorKind {
    #[error("duplicate declaration of `{name}`")]
    DuplicateDeclaration { name: String },

    #[error("undeclared identifier `{name}`")]
    Undeclared { name: String },

    #[error("`{keyword}` outside of a loop")]
    OutsideLoop { keyword: &'static str },

    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: PrimKind, found: PrimKind },

    #[error("operator `{op}` expects numeric operands, got {found}")]
    NotNumeric { op: BinaryOp, found: PrimKind },

    #[error("operator `{op}` cannot compare values of type {found}")]
    NotComparable { op: BinaryOp, found: PrimKind },

    #[error("operator `{op}` needs operands with a value, got void")]
    NoValue { op: BinaryOp },

    #[error("`{name}` expects {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("`{name}` is not a function")]
    NotAFunction { name: String },

    #[error("`{name}` is a function, not a variable")]
    NotAVariable { name: String },

    #[error("`{name}` cannot have type void")]
    VoidVariable { name: String },

    #[error("left side of `{op}` must be a variable")]
    NotAssignable { op: BinaryOp },

    #[error("no `main` function found")]
    MissingMain,

    #[error("`main` must not take parameters")]
    MainHasParameters,

    #[error("`main` must return int or void, got {found}")]
    MainReturnType { found: PrimKind },
}

impl SemanticErrorKind {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        use SemanticErrorKind::*;
        match self {
            DuplicateDeclaration { .. } => "E001",
            Undeclared { .. } => "E002",
            OutsideLoop { .. } => "E003",
            TypeMismatch { .. } => "E004",
            NotNumeric { .. } => "E005",
            NotComparable { .. } => "E006",
            NoValue { .. } => "E007",
            ArgumentCount { .. } => "E008",
            NotAFunction { .. } => "E009",
            NotAVariable { .. } => "E010",
            VoidVariable { .. } => "E011",
            NotAssignable { .. } => "E012",
            MissingMain => "E013",
            MainHasParameters => "E014",
            MainReturnType { .. } => "E015",
        }
    }
}

/// A name-resolution or type error tied to a source location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub line: u32,
    pub span: Span,
}

impl SemanticError {
    /// An error located at the token of `node`.
    pub fn at(ast: &Ast<'_>, node: NodeId, kind: SemanticErrorKind) -> Self {
        let token = ast.token(node);
        SemanticError {
            kind,
            line: token.line,
            span: token.span.clone(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}
