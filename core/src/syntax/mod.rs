//! Syntax tree and the vocabulary shared by every compiler phase.

mod ast;
mod ops;
mod token;

pub use ast::{Ast, AstBuilder, Literal, Node, NodeId, NodeKind};
pub use ops::{AssignOp, BinaryOp, Intrinsic, OpCategory, PrimKind};
pub use token::{Span, Token, TokenKind};
