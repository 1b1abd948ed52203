//! Type checking over a resolved tree.
//!
//! Every expression evaluates to a primitive kind or to `None` when its type
//! is unknown because of an earlier error. Unknown types unify with anything,
//! so one mistake produces one diagnostic.

use hashbrown::HashMap;

use super::PhaseResult;
use super::error::{SemanticError, SemanticErrorKind};
use super::resolve::Resolution;
use crate::syntax::{Ast, BinaryOp, NodeId, NodeKind, OpCategory, PrimKind};

/// Computed type of each expression and declaration.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: HashMap<NodeId, PrimKind>,
}

impl TypeTable {
    pub fn get(&self, node: NodeId) -> Option<PrimKind> {
        self.types.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

struct Checker<'r, 'a> {
    ast: &'r Ast<'a>,
    resolution: &'r Resolution,
    table: TypeTable,
    errors: Vec<SemanticError>,
}

/// Check the types of every declaration in `ast`.
pub fn check_types(ast: &Ast<'_>, resolution: &Resolution) -> PhaseResult<TypeTable> {
    let mut checker = Checker {
        ast,
        resolution,
        table: TypeTable::default(),
        errors: Vec::new(),
    };
    for &decl in ast.decls() {
        checker.check_decl(decl);
    }
    tracing::debug!(
        typed = checker.table.len(),
        errors = checker.errors.len(),
        "Checked types"
    );
    PhaseResult {
        output: checker.table,
        errors: checker.errors,
    }
}

impl<'r, 'a> Checker<'r, 'a> {
    fn error(&mut self, node: NodeId, kind: SemanticErrorKind) {
        self.errors.push(SemanticError::at(self.ast, node, kind));
    }

    fn record(&mut self, node: NodeId, ty: Option<PrimKind>) -> Option<PrimKind> {
        if let Some(ty) = ty {
            self.table.types.insert(node, ty);
        }
        ty
    }

    /// Unify `found` against `expected`, reporting at `at` on mismatch.
    fn unify(&mut self, expected: Option<PrimKind>, found: Option<PrimKind>, at: NodeId) -> bool {
        match (expected, found) {
            (Some(expected), Some(found)) if expected != found => {
                self.error(at, SemanticErrorKind::TypeMismatch { expected, found });
                false
            }
            _ => true,
        }
    }

    fn check_decl(&mut self, decl: NodeId) {
        let ast = self.ast;
        match ast.kind(decl) {
            NodeKind::VarDecl { .. } => self.check_var_decl(decl),
            NodeKind::FnDecl { params, body, .. } => {
                for &param in params {
                    self.check_storage_type(param);
                }
                if let Some(body) = *body {
                    self.check_stmt(body);
                }
            }
            _ => {}
        }
    }

    /// Variables and parameters must hold a value.
    fn check_storage_type(&mut self, decl: NodeId) -> Option<PrimKind> {
        let ty = self.ast.declared_type(decl);
        if ty == Some(PrimKind::Void) {
            let name = self.ast.declared_name(decl).unwrap_or_default().to_string();
            self.error(decl, SemanticErrorKind::VoidVariable { name });
            return None;
        }
        self.record(decl, ty)
    }

    fn check_var_decl(&mut self, decl: NodeId) {
        let ast = self.ast;
        let declared = self.check_storage_type(decl);
        if let NodeKind::VarDecl {
            init: Some(init), ..
        } = ast.kind(decl)
        {
            let found = self.check_expr(*init);
            self.unify(declared, found, *init);
        }
    }

    fn check_stmt(&mut self, stmt: NodeId) {
        let ast = self.ast;
        match ast.kind(stmt) {
            NodeKind::Block { stmts } => {
                for &stmt in stmts {
                    self.check_stmt(stmt);
                }
            }
            NodeKind::VarDecl { .. } => self.check_var_decl(stmt),
            NodeKind::If {
                branches,
                otherwise,
            } => {
                for &(cond, body) in branches {
                    self.check_condition(cond);
                    self.check_stmt(body);
                }
                if let Some(otherwise) = *otherwise {
                    self.check_stmt(otherwise);
                }
            }
            NodeKind::While { cond, body } => {
                self.check_condition(*cond);
                self.check_stmt(*body);
            }
            NodeKind::Return { value } => {
                let found = match *value {
                    Some(value) => self.check_expr(value),
                    None => Some(PrimKind::Void),
                };
                let expected = ast
                    .enclosing_function(stmt)
                    .and_then(|function| ast.declared_type(function));
                self.unify(expected, found, value.unwrap_or(stmt));
            }
            NodeKind::Assign { op, value, .. } => {
                let target = self.variable_type(stmt);
                let found = self.check_expr(*value);
                if let (Some(arith), Some(ty)) = (op.arithmetic(), target) {
                    if !ty.is_numeric() {
                        self.error(stmt, SemanticErrorKind::NotNumeric { op: arith, found: ty });
                        return;
                    }
                }
                self.unify(target, found, *value);
            }
            NodeKind::CallStmt { call } => {
                self.check_expr(*call);
            }
            _ => {}
        }
    }

    fn check_condition(&mut self, cond: NodeId) {
        let found = self.check_expr(cond);
        self.unify(Some(PrimKind::Bool), found, cond);
    }

    /// Type of the variable bound to a read or assignment at `node`.
    fn variable_type(&mut self, node: NodeId) -> Option<PrimKind> {
        let ast = self.ast;
        let target = self.resolution.target(node)?;
        match ast.kind(target) {
            NodeKind::FnDecl { name, .. } => {
                let name = name.to_string();
                self.error(node, SemanticErrorKind::NotAVariable { name });
                None
            }
            _ => ast.declared_type(target),
        }
    }

    fn check_expr(&mut self, expr: NodeId) -> Option<PrimKind> {
        let ast = self.ast;
        let ty = match ast.kind(expr) {
            NodeKind::Const { value } => Some(value.kind()),
            NodeKind::Var { .. } => self.variable_type(expr),
            NodeKind::Call { .. } => self.check_call(expr),
            NodeKind::Binary { op, left, right } => self.check_binary(expr, *op, *left, *right),
            _ => None,
        };
        self.record(expr, ty)
    }

    fn check_call(&mut self, call: NodeId) -> Option<PrimKind> {
        let ast = self.ast;
        let NodeKind::Call { name, args } = ast.kind(call) else {
            return None;
        };
        let arg_types: Vec<_> = args.iter().map(|&arg| self.check_expr(arg)).collect();

        let target = self.resolution.target(call)?;
        let NodeKind::FnDecl { params, .. } = ast.kind(target) else {
            self.error(
                call,
                SemanticErrorKind::NotAFunction {
                    name: name.to_string(),
                },
            );
            return None;
        };

        if params.len() != args.len() {
            self.error(
                call,
                SemanticErrorKind::ArgumentCount {
                    name: name.to_string(),
                    expected: params.len(),
                    found: args.len(),
                },
            );
        }
        for ((&param, &arg), found) in params.iter().zip(args).zip(arg_types) {
            self.unify(ast.declared_type(param), found, arg);
        }
        ast.declared_type(target)
    }

    fn check_binary(
        &mut self,
        expr: NodeId,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    ) -> Option<PrimKind> {
        if op.is_compound() && !matches!(self.ast.kind(left), NodeKind::Var { .. }) {
            self.error(expr, SemanticErrorKind::NotAssignable { op });
        }
        let l = self.check_expr(left);
        let r = self.check_expr(right);

        match op.category() {
            OpCategory::Arithmetic => {
                for ty in [l, r].into_iter().flatten() {
                    if !ty.is_numeric() {
                        self.error(expr, SemanticErrorKind::NotNumeric { op, found: ty });
                        return None;
                    }
                }
                if !self.unify(l, r, right) {
                    return None;
                }
                l.or(r)
            }
            OpCategory::Comparison => {
                for ty in [l, r].into_iter().flatten() {
                    if !ty.is_comparable() {
                        self.error(expr, SemanticErrorKind::NotComparable { op, found: ty });
                        return Some(PrimKind::Bool);
                    }
                }
                self.unify(l, r, right);
                Some(PrimKind::Bool)
            }
            OpCategory::Equality => {
                if [l, r].into_iter().flatten().any(|ty| !ty.has_value()) {
                    self.error(expr, SemanticErrorKind::NoValue { op });
                } else {
                    self.unify(l, r, right);
                }
                Some(PrimKind::Bool)
            }
            OpCategory::Logic => {
                self.unify(Some(PrimKind::Bool), l, left);
                self.unify(Some(PrimKind::Bool), r, right);
                Some(PrimKind::Bool)
            }
        }
    }
}
