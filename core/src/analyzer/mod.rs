//! Semantic analysis: name resolution followed by type checking.
//!
//! Each phase walks the whole tree and returns its side table together with
//! every diagnostic it found. [`analyze`] runs both, then checks for a valid
//! entry point, and only hands out the tables when nothing was reported.

mod error;
mod resolve;
mod scope;
mod typecheck;

pub use error::{SemanticError, SemanticErrorKind};
pub use resolve::{FrameLayout, Resolution, Storage, resolve};
pub use scope::Scope;
pub use typecheck::{TypeTable, check_types};

use crate::syntax::{Ast, NodeId, NodeKind, PrimKind};

/// Name of the function every program starts in.
pub const ENTRY_POINT: &str = "main";

/// Output of one analysis phase plus the diagnostics it produced.
#[derive(Debug)]
pub struct PhaseResult<T> {
    pub output: T,
    pub errors: Vec<SemanticError>,
}

impl<T> PhaseResult<T> {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<T, Vec<SemanticError>> {
        if self.errors.is_empty() {
            Ok(self.output)
        } else {
            Err(self.errors)
        }
    }
}

/// Everything code generation needs to know beyond the tree itself.
#[derive(Debug)]
pub struct Analysis {
    pub resolution: Resolution,
    pub types: TypeTable,
    /// The `main` function declaration.
    pub entry: NodeId,
}

/// Run both semantic phases and validate the entry point.
pub fn analyze(ast: &Ast<'_>) -> Result<Analysis, Vec<SemanticError>> {
    let resolved = resolve(ast);
    let typed = check_types(ast, &resolved.output);

    let mut errors = resolved.errors;
    errors.extend(typed.errors);
    let entry = match find_entry_point(ast) {
        Ok(entry) => Some(entry),
        Err(err) => {
            errors.push(err);
            None
        }
    };

    match entry {
        Some(entry) if errors.is_empty() => Ok(Analysis {
            resolution: resolved.output,
            types: typed.output,
            entry,
        }),
        _ => {
            tracing::debug!(errors = errors.len(), "Analysis failed");
            Err(errors)
        }
    }
}

/// Locate the top-level `main` function and check its signature: no
/// parameters, returning `int` or `void`.
pub fn find_entry_point(ast: &Ast<'_>) -> Result<NodeId, SemanticError> {
    let main = ast.decls().iter().copied().find(|&decl| {
        matches!(ast.kind(decl), NodeKind::FnDecl { name, .. } if *name == ENTRY_POINT)
    });
    let Some(main) = main else {
        // Reported at the end of the program.
        let token = ast.token(ast.root());
        let line = ast.decls().last().map_or(token.line, |&d| ast.token(d).line);
        return Err(SemanticError {
            kind: SemanticErrorKind::MissingMain,
            line,
            span: token.span.clone(),
        });
    };
    let NodeKind::FnDecl { ret, params, .. } = ast.kind(main) else {
        return Ok(main);
    };
    if !params.is_empty() {
        return Err(SemanticError::at(
            ast,
            main,
            SemanticErrorKind::MainHasParameters,
        ));
    }
    match ast.type_kind(*ret) {
        Some(found @ (PrimKind::Float | PrimKind::String | PrimKind::Bool)) => Err(
            SemanticError::at(ast, main, SemanticErrorKind::MainReturnType { found }),
        ),
        _ => Ok(main),
    }
}
