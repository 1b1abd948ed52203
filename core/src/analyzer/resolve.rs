//! Name resolution: binds every identifier use to its declaration and lays
//! out storage for variables.

use hashbrown::HashMap;

use super::error::{SemanticError, SemanticErrorKind};
use super::scope::Scope;
use super::PhaseResult;
use crate::syntax::{Ast, NodeId, NodeKind};

/// Where a variable or parameter lives at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Frame slot relative to the frame pointer.
    Local(u32),
    /// Slot in the global area at the bottom of the stack region.
    Global(u32),
}

/// Slot counts of one function's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameLayout {
    pub params: u32,
    pub locals: u32,
}

impl FrameLayout {
    /// Cells the frame occupies above its header.
    pub fn total(&self) -> u32 {
        self.params + self.locals
    }
}

/// Facts derived by name resolution, keyed by node.
#[derive(Debug, Default)]
pub struct Resolution {
    targets: HashMap<NodeId, NodeId>,
    storage: HashMap<NodeId, Storage>,
    loops: HashMap<NodeId, NodeId>,
    frames: HashMap<NodeId, FrameLayout>,
    globals: u32,
}

impl Resolution {
    /// Declaration bound to a variable read, assignment, or call.
    pub fn target(&self, node: NodeId) -> Option<NodeId> {
        self.targets.get(&node).copied()
    }

    /// Storage of a variable declaration or parameter.
    pub fn storage(&self, decl: NodeId) -> Option<Storage> {
        self.storage.get(&decl).copied()
    }

    /// The `while` targeted by a `break` or `continue`.
    pub fn loop_of(&self, node: NodeId) -> Option<NodeId> {
        self.loops.get(&node).copied()
    }

    pub fn frame(&self, function: NodeId) -> Option<FrameLayout> {
        self.frames.get(&function).copied()
    }

    /// Number of global variable slots.
    pub fn globals(&self) -> u32 {
        self.globals
    }
}

struct Resolver<'r, 'a> {
    ast: &'r Ast<'a>,
    resolution: Resolution,
    errors: Vec<SemanticError>,
}

/// Resolve all names in `ast`.
///
/// The walk never stops early: every undeclared name, duplicate, and stray
/// `break`/`continue` in the program is reported.
pub fn resolve(ast: &Ast<'_>) -> PhaseResult<Resolution> {
    let mut resolver = Resolver {
        ast,
        resolution: Resolution::default(),
        errors: Vec::new(),
    };
    resolver.resolve_program();
    tracing::debug!(
        bindings = resolver.resolution.targets.len(),
        globals = resolver.resolution.globals,
        errors = resolver.errors.len(),
        "Resolved names"
    );
    PhaseResult {
        output: resolver.resolution,
        errors: resolver.errors,
    }
}

impl<'r, 'a> Resolver<'r, 'a> {
    fn error(&mut self, node: NodeId, kind: SemanticErrorKind) {
        self.errors.push(SemanticError::at(self.ast, node, kind));
    }

    fn declare(&mut self, scope: &mut Scope<'_, 'a>, decl: NodeId) {
        let Some(name) = self.ast.declared_name(decl) else {
            return;
        };
        if scope.declare(name, decl).is_err() {
            self.error(
                decl,
                SemanticErrorKind::DuplicateDeclaration {
                    name: name.to_string(),
                },
            );
        }
    }

    fn bind(&mut self, scope: &Scope<'_, 'a>, node: NodeId, name: &str) {
        match scope.lookup(name) {
            Some(decl) => {
                self.resolution.targets.insert(node, decl);
            }
            None => self.error(
                node,
                SemanticErrorKind::Undeclared {
                    name: name.to_string(),
                },
            ),
        }
    }

    fn resolve_program(&mut self) {
        let ast = self.ast;
        let mut root = Scope::root();
        for &intrinsic in ast.intrinsics() {
            self.declare(&mut root, intrinsic);
        }

        // Functions are visible everywhere, including before their declaration.
        for &decl in ast.decls() {
            if matches!(ast.kind(decl), NodeKind::FnDecl { .. }) {
                self.declare(&mut root, decl);
            }
        }

        for &decl in ast.decls() {
            match ast.kind(decl) {
                NodeKind::VarDecl { init, .. } => {
                    if let Some(init) = *init {
                        self.resolve_expr(&root, init);
                    }
                    let slot = self.resolution.globals;
                    self.resolution.globals += 1;
                    self.resolution.storage.insert(decl, Storage::Global(slot));
                    self.declare(&mut root, decl);
                }
                NodeKind::FnDecl { .. } => self.resolve_function(&root, decl),
                _ => {}
            }
        }
    }

    fn resolve_function(&mut self, root: &Scope<'_, 'a>, function: NodeId) {
        let ast = self.ast;
        let NodeKind::FnDecl {
            params, body: Some(body), ..
        } = ast.kind(function)
        else {
            return;
        };

        // Parameters share the body's scope, so a local cannot redeclare one.
        let mut scope = Scope::with_parent(root);
        for (slot, &param) in params.iter().enumerate() {
            self.resolution
                .storage
                .insert(param, Storage::Local(slot as u32));
            self.declare(&mut scope, param);
        }

        let params = params.len() as u32;
        let mut slots = params;
        if let NodeKind::Block { stmts } = ast.kind(*body) {
            for &stmt in stmts {
                slots = self.resolve_stmt(&mut scope, stmt, slots);
            }
        }

        let layout = FrameLayout {
            params,
            locals: slots - params,
        };
        tracing::trace!(name = ast.declared_name(function), ?layout, "Laid out frame");
        self.resolution.frames.insert(function, layout);
    }

    /// Resolve one statement. Returns the next free frame slot.
    fn resolve_stmt(&mut self, scope: &mut Scope<'_, 'a>, stmt: NodeId, slots: u32) -> u32 {
        let ast = self.ast;
        match ast.kind(stmt) {
            NodeKind::Block { .. } => self.resolve_block(scope, stmt, slots),
            NodeKind::VarDecl { init, .. } => {
                if let Some(init) = *init {
                    self.resolve_expr(scope, init);
                }
                self.resolution.storage.insert(stmt, Storage::Local(slots));
                self.declare(scope, stmt);
                slots + 1
            }
            NodeKind::If {
                branches,
                otherwise,
            } => {
                let mut slots = slots;
                for &(cond, body) in branches {
                    self.resolve_expr(scope, cond);
                    slots = self.resolve_block(scope, body, slots);
                }
                if let Some(otherwise) = *otherwise {
                    slots = self.resolve_block(scope, otherwise, slots);
                }
                slots
            }
            NodeKind::While { cond, body } => {
                self.resolve_expr(scope, *cond);
                self.resolve_block(scope, *body, slots)
            }
            NodeKind::Return { value } => {
                if let Some(value) = *value {
                    self.resolve_expr(scope, value);
                }
                slots
            }
            NodeKind::Break | NodeKind::Continue => {
                match ast.enclosing_loop(stmt) {
                    Some(target) => {
                        self.resolution.loops.insert(stmt, target);
                    }
                    None => {
                        let keyword = match ast.kind(stmt) {
                            NodeKind::Break => "break",
                            _ => "continue",
                        };
                        self.error(stmt, SemanticErrorKind::OutsideLoop { keyword });
                    }
                }
                slots
            }
            NodeKind::Assign { name, value, .. } => {
                self.bind(scope, stmt, name);
                self.resolve_expr(scope, *value);
                slots
            }
            NodeKind::CallStmt { call } => {
                self.resolve_expr(scope, *call);
                slots
            }
            _ => slots,
        }
    }

    fn resolve_block(&mut self, scope: &Scope<'_, 'a>, block: NodeId, slots: u32) -> u32 {
        let ast = self.ast;
        let NodeKind::Block { stmts } = ast.kind(block) else {
            return slots;
        };
        let mut inner = Scope::with_parent(scope);
        let mut slots = slots;
        for &stmt in stmts {
            slots = self.resolve_stmt(&mut inner, stmt, slots);
        }
        slots
    }

    fn resolve_expr(&mut self, scope: &Scope<'_, 'a>, expr: NodeId) {
        let ast = self.ast;
        match ast.kind(expr) {
            NodeKind::Var { name } => self.bind(scope, expr, name),
            NodeKind::Call { name, args } => {
                self.bind(scope, expr, name);
                for &arg in args {
                    self.resolve_expr(scope, arg);
                }
            }
            NodeKind::Binary { left, right, .. } => {
                self.resolve_expr(scope, *left);
                self.resolve_expr(scope, *right);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::parser::parse;

    fn find<'a>(ast: &Ast<'a>, pred: impl Fn(&NodeKind<'a>) -> bool) -> Vec<NodeId> {
        ast.ids().filter(|&id| pred(ast.kind(id))).collect()
    }

    fn decl_named(ast: &Ast<'_>, name: &str) -> NodeId {
        ast.ids()
            .find(|&id| {
                matches!(ast.kind(id), NodeKind::VarDecl { .. } | NodeKind::Param { .. })
                    && ast.declared_name(id) == Some(name)
            })
            .unwrap_or_else(|| panic!("no declaration of {name}"))
    }

    fn messages(result: &PhaseResult<Resolution>) -> Vec<String> {
        result.errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_slots_continue_through_nested_blocks() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            indoc! {"
                int f(int a, int b) {
                    int c = a;
                    if (true) { int d = 1; } else { int e = 2; }
                    while (false) { int g = 3; }
                    int h = b;
                    return h;
                }
            "},
        )
        .unwrap();
        let result = resolve(&ast);
        assert!(result.errors.is_empty(), "{:?}", messages(&result));

        let slot = |name| result.output.storage(decl_named(&ast, name));
        assert_eq!(slot("a"), Some(Storage::Local(0)));
        assert_eq!(slot("b"), Some(Storage::Local(1)));
        assert_eq!(slot("c"), Some(Storage::Local(2)));
        assert_eq!(slot("d"), Some(Storage::Local(3)));
        assert_eq!(slot("e"), Some(Storage::Local(4)));
        assert_eq!(slot("g"), Some(Storage::Local(5)));
        assert_eq!(slot("h"), Some(Storage::Local(6)));

        let function = ast.decls()[0];
        assert_eq!(
            result.output.frame(function),
            Some(FrameLayout {
                params: 2,
                locals: 5
            })
        );
    }

    #[test]
    fn test_counter_resets_per_function() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            "void f() { int x = 1; int y = 2; } void g(int z) { int w = 0; }",
        )
        .unwrap();
        let result = resolve(&ast);
        let slot = |name| result.output.storage(decl_named(&ast, name));
        assert_eq!(slot("y"), Some(Storage::Local(1)));
        assert_eq!(slot("z"), Some(Storage::Local(0)));
        assert_eq!(slot("w"), Some(Storage::Local(1)));
    }

    #[test]
    fn test_globals_get_global_slots() {
        let arena = Bump::new();
        let ast = parse(&arena, "int a; float b = 2.0; void main() { a = 1; }").unwrap();
        let result = resolve(&ast);
        assert!(result.errors.is_empty());
        assert_eq!(result.output.globals(), 2);
        assert_eq!(
            result.output.storage(decl_named(&ast, "a")),
            Some(Storage::Global(0))
        );
        assert_eq!(
            result.output.storage(decl_named(&ast, "b")),
            Some(Storage::Global(1))
        );
        let assign = find(&ast, |k| matches!(k, NodeKind::Assign { .. }))[0];
        assert_eq!(result.output.target(assign), Some(decl_named(&ast, "a")));
    }

    #[test]
    fn test_shadowing_binds_innermost() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            "void main() { int x = 1; { int x = 2; print(x); } print(x); }",
        )
        .unwrap();
        let result = resolve(&ast);
        assert!(result.errors.is_empty());

        let decls = find(&ast, |k| matches!(k, NodeKind::VarDecl { name: "x", .. }));
        let uses = find(&ast, |k| matches!(k, NodeKind::Var { name: "x" }));
        assert_eq!(decls.len(), 2);
        assert_eq!(uses.len(), 2);
        assert_eq!(result.output.target(uses[0]), Some(decls[1]));
        assert_eq!(result.output.target(uses[1]), Some(decls[0]));
    }

    #[test]
    fn test_functions_are_hoisted() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            indoc! {"
                int main() { return later(1); }
                int later(int n) { return n; }
            "},
        )
        .unwrap();
        let result = resolve(&ast);
        assert!(result.errors.is_empty(), "{:?}", messages(&result));
        let call = find(&ast, |k| matches!(k, NodeKind::Call { .. }))[0];
        assert_eq!(result.output.target(call), Some(ast.decls()[1]));
    }

    #[test]
    fn test_intrinsics_resolve() {
        let arena = Bump::new();
        let ast = parse(&arena, "void main() { print(read()); }").unwrap();
        let result = resolve(&ast);
        assert!(result.errors.is_empty());
        let calls = find(&ast, |k| matches!(k, NodeKind::Call { .. }));
        for call in calls {
            let target = result.output.target(call).unwrap();
            assert!(ast.intrinsics().contains(&target));
        }
    }

    #[test]
    fn test_declaration_not_visible_in_own_initializer() {
        let arena = Bump::new();
        let ast = parse(&arena, "void main() { int x = x; }").unwrap();
        let result = resolve(&ast);
        assert_eq!(messages(&result), vec!["line 1: undeclared identifier `x`"]);
    }

    #[test]
    fn test_use_before_declaration() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            indoc! {"
                void main() {
                    print(y);
                    int y = 2;
                }
            "},
        )
        .unwrap();
        let result = resolve(&ast);
        assert_eq!(messages(&result), vec!["line 2: undeclared identifier `y`"]);
    }

    #[test]
    fn test_duplicates_and_undeclared_are_all_reported() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            indoc! {"
                int g;
                int g;
                void f(int a) {
                    int a = 1;
                    b = 2;
                    missing();
                }
            "},
        )
        .unwrap();
        let result = resolve(&ast);
        assert_eq!(
            messages(&result),
            vec![
                "line 2: duplicate declaration of `g`",
                "line 4: duplicate declaration of `a`",
                "line 5: undeclared identifier `b`",
                "line 6: undeclared identifier `missing`",
            ]
        );
    }

    #[test]
    fn test_break_and_continue_target_nearest_loop() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            indoc! {"
                void main() {
                    while (true) {
                        while (false) { break; }
                        continue;
                    }
                }
            "},
        )
        .unwrap();
        let result = resolve(&ast);
        assert!(result.errors.is_empty());

        let loops = find(&ast, |k| matches!(k, NodeKind::While { .. }));
        let brk = find(&ast, |k| matches!(k, NodeKind::Break))[0];
        let cont = find(&ast, |k| matches!(k, NodeKind::Continue))[0];
        // The inner loop is allocated first.
        assert_eq!(result.output.loop_of(brk), Some(loops[0]));
        assert_eq!(result.output.loop_of(cont), Some(loops[1]));
    }

    #[test]
    fn test_break_outside_loop_does_not_stop_walk() {
        let arena = Bump::new();
        let ast = parse(
            &arena,
            indoc! {"
                void main() {
                    break;
                    continue;
                    print(nope);
                }
            "},
        )
        .unwrap();
        let result = resolve(&ast);
        assert_eq!(
            messages(&result),
            vec![
                "line 2: `break` outside of a loop",
                "line 3: `continue` outside of a loop",
                "line 4: undeclared identifier `nope`",
            ]
        );
    }
}
