//! Arena-allocated syntax tree.
//!
//! Nodes are stored in a flat vector and addressed by [`NodeId`]. Every node
//! keeps a non-owning handle to its parent, assigned when the parent itself is
//! allocated, so later phases can search upwards (enclosing function,
//! enclosing loop) without reference cycles.
//!
//! The tree is immutable once built. Facts computed by later phases live in
//! side tables keyed by `NodeId`.

use core::iter;

use smallvec::SmallVec;

use super::{AssignOp, BinaryOp, Intrinsic, PrimKind, Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'a> {
    Int(i32),
    Float(f32),
    Str(&'a str),
    Bool(bool),
}

impl Literal<'_> {
    pub fn kind(&self) -> PrimKind {
        match self {
            Literal::Int(_) => PrimKind::Int,
            Literal::Float(_) => PrimKind::Float,
            Literal::Str(_) => PrimKind::String,
            Literal::Bool(_) => PrimKind::Bool,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    Root {
        decls: Vec<NodeId>,
    },
    /// Function declaration. Intrinsics have no body.
    FnDecl {
        ret: NodeId,
        name: &'a str,
        params: Vec<NodeId>,
        body: Option<NodeId>,
        intrinsic: Option<Intrinsic>,
    },
    VarDecl {
        ty: NodeId,
        name: &'a str,
        init: Option<NodeId>,
    },
    Param {
        ty: NodeId,
        name: &'a str,
    },
    /// `if (c) {..} else if (c) {..} else {..}` as ordered branches.
    If {
        branches: Vec<(NodeId, NodeId)>,
        otherwise: Option<NodeId>,
    },
    Block {
        stmts: Vec<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Break,
    Continue,
    Assign {
        name: &'a str,
        op: AssignOp,
        value: NodeId,
    },
    CallStmt {
        call: NodeId,
    },
    Var {
        name: &'a str,
    },
    Const {
        value: Literal<'a>,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Call {
        name: &'a str,
        args: Vec<NodeId>,
    },
    Type {
        kind: PrimKind,
    },
}

impl NodeKind<'_> {
    /// Direct children, in source order.
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self {
            NodeKind::Root { decls } => out.extend(decls.iter().copied()),
            NodeKind::FnDecl {
                ret, params, body, ..
            } => {
                out.push(*ret);
                out.extend(params.iter().copied());
                out.extend(*body);
            }
            NodeKind::VarDecl { ty, init, .. } => {
                out.push(*ty);
                out.extend(*init);
            }
            NodeKind::Param { ty, .. } => out.push(*ty),
            NodeKind::If {
                branches,
                otherwise,
            } => {
                for (cond, body) in branches {
                    out.push(*cond);
                    out.push(*body);
                }
                out.extend(*otherwise);
            }
            NodeKind::Block { stmts } => out.extend(stmts.iter().copied()),
            NodeKind::While { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            NodeKind::Return { value } => out.extend(*value),
            NodeKind::Assign { value, .. } => out.push(*value),
            NodeKind::CallStmt { call } => out.push(*call),
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Call { args, .. } => out.extend(args.iter().copied()),
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Var { .. }
            | NodeKind::Const { .. }
            | NodeKind::Type { .. } => {}
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub kind: NodeKind<'a>,
    pub parent: Option<NodeId>,
    /// Token used for diagnostics.
    pub token: Token<'a>,
}

/// Incrementally builds an [`Ast`]. Used by the parser.
pub struct AstBuilder<'a> {
    nodes: Vec<Node<'a>>,
    intrinsics: Vec<NodeId>,
}

impl<'a> Default for AstBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> AstBuilder<'a> {
    /// Create a builder whose arena already holds the intrinsic declarations.
    pub fn new() -> Self {
        let mut builder = AstBuilder {
            nodes: Vec::new(),
            intrinsics: Vec::with_capacity(Intrinsic::ALL.len()),
        };
        for intrinsic in Intrinsic::ALL {
            let id = builder.alloc_intrinsic(intrinsic);
            builder.intrinsics.push(id);
        }
        builder
    }

    fn alloc_intrinsic(&mut self, intrinsic: Intrinsic) -> NodeId {
        let token = |kind| Token::new(kind, Some(intrinsic.name()), 0, Span::default());
        let params = intrinsic
            .params()
            .iter()
            .map(|&kind| {
                let ty = self.alloc(NodeKind::Type { kind }, token(TokenKind::Ident));
                self.alloc(NodeKind::Param { ty, name: "value" }, token(TokenKind::Ident))
            })
            .collect();
        let ret = self.alloc(
            NodeKind::Type {
                kind: intrinsic.returns(),
            },
            token(TokenKind::Ident),
        );
        self.alloc(
            NodeKind::FnDecl {
                ret,
                name: intrinsic.name(),
                params,
                body: None,
                intrinsic: Some(intrinsic),
            },
            token(TokenKind::Ident),
        )
    }

    /// Allocate a node and adopt its children.
    pub fn alloc(&mut self, kind: NodeKind<'a>, token: Token<'a>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            parent: None,
            token,
        });
        id
    }

    /// Allocate the root node and freeze the tree.
    pub fn finish(mut self, decls: Vec<NodeId>, token: Token<'a>) -> Ast<'a> {
        let root = self.alloc(NodeKind::Root { decls }, token);
        Ast {
            nodes: self.nodes,
            root,
            intrinsics: self.intrinsics,
        }
    }
}

/// The parsed program.
#[derive(Debug, Clone)]
pub struct Ast<'a> {
    nodes: Vec<Node<'a>>,
    root: NodeId,
    intrinsics: Vec<NodeId>,
}

impl<'a> Ast<'a> {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Top-level declarations in source order.
    pub fn decls(&self) -> &[NodeId] {
        match &self.nodes[self.root.index()].kind {
            NodeKind::Root { decls } => decls,
            _ => &[],
        }
    }

    /// Synthetic declarations of the built-in functions.
    pub fn intrinsics(&self) -> &[NodeId] {
        &self.intrinsics
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind<'a> {
        &self.nodes[id.index()].kind
    }

    pub fn token(&self, id: NodeId) -> &Token<'a> {
        &self.nodes[id.index()].token
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// Nearest enclosing function declaration.
    pub fn enclosing_function(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&node| matches!(self.kind(node), NodeKind::FnDecl { .. }))
    }

    /// Nearest enclosing `while` within the same function.
    pub fn enclosing_loop(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .take_while(|&node| !matches!(self.kind(node), NodeKind::FnDecl { .. }))
            .find(|&node| matches!(self.kind(node), NodeKind::While { .. }))
    }

    /// The primitive kind named by a `Type` node.
    pub fn type_kind(&self, id: NodeId) -> Option<PrimKind> {
        match self.kind(id) {
            NodeKind::Type { kind } => Some(*kind),
            _ => None,
        }
    }

    /// Declared type of a variable, parameter, or function return.
    pub fn declared_type(&self, id: NodeId) -> Option<PrimKind> {
        match self.kind(id) {
            NodeKind::VarDecl { ty, .. } | NodeKind::Param { ty, .. } => self.type_kind(*ty),
            NodeKind::FnDecl { ret, .. } => self.type_kind(*ret),
            _ => None,
        }
    }

    /// Name introduced by a declaration node.
    pub fn declared_name(&self, id: NodeId) -> Option<&'a str> {
        match self.kind(id) {
            NodeKind::FnDecl { name, .. }
            | NodeKind::VarDecl { name, .. }
            | NodeKind::Param { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind) -> Token<'static> {
        Token::new(kind, None, 1, Span::default())
    }

    #[test]
    fn test_builder_starts_with_intrinsics() {
        let ast = AstBuilder::new().finish(Vec::new(), tok(TokenKind::Eof));
        assert_eq!(ast.intrinsics().len(), Intrinsic::ALL.len());
        for (&id, intrinsic) in ast.intrinsics().iter().zip(Intrinsic::ALL) {
            assert_eq!(ast.declared_name(id), Some(intrinsic.name()));
            assert_eq!(ast.declared_type(id), Some(intrinsic.returns()));
            // Intrinsics are not reachable from the root.
            assert_eq!(ast.parent(id), None);
        }
        assert!(ast.decls().is_empty());
    }

    #[test]
    fn test_alloc_sets_parent_links() {
        let mut builder = AstBuilder::new();
        let cond = builder.alloc(
            NodeKind::Const {
                value: Literal::Bool(true),
            },
            tok(TokenKind::True),
        );
        let brk = builder.alloc(NodeKind::Break, tok(TokenKind::Break));
        let body = builder.alloc(NodeKind::Block { stmts: vec![brk] }, tok(TokenKind::LBrace));
        let while_id = builder.alloc(NodeKind::While { cond, body }, tok(TokenKind::While));
        let ast = builder.finish(Vec::new(), tok(TokenKind::Eof));

        assert_eq!(ast.parent(cond), Some(while_id));
        assert_eq!(ast.parent(body), Some(while_id));
        assert_eq!(ast.parent(brk), Some(body));
        assert_eq!(ast.ancestors(brk).collect::<Vec<_>>(), vec![body, while_id]);
        assert_eq!(ast.enclosing_loop(brk), Some(while_id));
        assert_eq!(ast.enclosing_function(brk), None);
    }
}
