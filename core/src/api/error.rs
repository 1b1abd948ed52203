//! Public error types for the Pebble API.
//!
//! Internal errors are converted to these types at API boundaries. Callers
//! never see phase-specific error enums, only diagnostics.

use core::fmt;

use crate::analyzer::SemanticError;
use crate::compiler::CompileError;
use crate::parser::ParseError;
use crate::syntax::Span;
use crate::vm::ExecutionError;

/// Public error type for all Pebble operations.
#[derive(Debug)]
pub enum Error {
    /// Lexical, syntax, name-resolution, or type errors.
    ///
    /// Contains one or more diagnostics with source locations.
    Compilation {
        diagnostics: Vec<Diagnostic>,
        source: String,
        filename: Option<String>,
    },

    /// A fatal error while the program was executing.
    Runtime {
        diagnostic: Diagnostic,
        source: String,
        filename: Option<String>,
    },

    /// The compiler produced inconsistent output. Always a bug.
    Internal(String),
}

impl Error {
    /// Compilation error over `source` with no filename yet.
    pub fn compilation(diagnostics: Vec<Diagnostic>, source: &str) -> Self {
        Error::Compilation {
            diagnostics,
            source: source.to_string(),
            filename: None,
        }
    }

    /// Runtime error over `source` with no filename yet.
    pub fn runtime(diagnostic: Diagnostic, source: &str) -> Self {
        Error::Runtime {
            diagnostic,
            source: source.to_string(),
            filename: None,
        }
    }

    /// Set the filename for this error.
    pub fn with_filename(self, filename: impl Into<String>) -> Self {
        let filename = Some(filename.into());
        match self {
            Error::Compilation {
                diagnostics,
                source,
                ..
            } => Error::Compilation {
                diagnostics,
                source,
                filename,
            },
            Error::Runtime {
                diagnostic,
                source,
                ..
            } => Error::Runtime {
                diagnostic,
                source,
                filename,
            },
            other => other,
        }
    }

    /// Set the filename if provided, otherwise return self unchanged.
    pub fn with_filename_opt(self, filename: Option<&str>) -> Self {
        match filename {
            Some(f) => self.with_filename(f),
            None => self,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Error::Compilation { filename, .. } | Error::Runtime { filename, .. } => {
                filename.as_deref()
            }
            Error::Internal(_) => None,
        }
    }

    /// Source text the diagnostics point into.
    pub fn source_text(&self) -> Option<&str> {
        match self {
            Error::Compilation { source, .. } | Error::Runtime { source, .. } => Some(source),
            Error::Internal(_) => None,
        }
    }

    /// All diagnostics carried by this error, in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Compilation { diagnostics, .. } => diagnostics,
            Error::Runtime { diagnostic, .. } => core::slice::from_ref(diagnostic),
            Error::Internal(_) => &[],
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compilation { diagnostics, .. } => {
                let error_count = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                write!(f, "Compilation failed with {} error(s)", error_count)
            }
            Error::Runtime { diagnostic, .. } => {
                write!(f, "Runtime error: {}", diagnostic.message)
            }
            Error::Internal(msg) => write!(f, "Internal compiler error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// A diagnostic message with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// 1-based source line, when known.
    pub line: Option<u32>,

    /// Byte range of the offending token, when known.
    pub span: Option<Span>,

    /// Help messages suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Stable error code (e.g., "E002") for documentation lookup.
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            line: None,
            span: None,
            help: Vec::new(),
            code: None,
        }
    }

    pub fn at(mut self, line: u32, span: Option<Span>) -> Self {
        self.line = Some(line);
        self.span = span;
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

// ============================================================================
// Conversion from internal errors
// ============================================================================

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic::error(err.kind.to_string())
            .at(err.line, Some(err.span.clone()))
            .with_code(err.code())
    }
}

impl From<&SemanticError> for Diagnostic {
    fn from(err: &SemanticError) -> Self {
        use crate::analyzer::SemanticErrorKind;

        let diagnostic = Diagnostic::error(err.kind.to_string())
            .at(err.line, Some(err.span.clone()))
            .with_code(err.code());
        match &err.kind {
            SemanticErrorKind::MissingMain => {
                diagnostic.with_help("declare `int main() { ... }` as the program entry point")
            }
            SemanticErrorKind::Undeclared { .. } => {
                diagnostic.with_help("names must be declared before they are used")
            }
            SemanticErrorKind::OutsideLoop { .. } => {
                diagnostic.with_help("move this statement into the body of a `while` loop")
            }
            _ => diagnostic,
        }
    }
}

impl From<&ExecutionError> for Diagnostic {
    fn from(err: &ExecutionError) -> Self {
        let mut diagnostic = Diagnostic::error(err.kind.to_string()).with_code(err.kind.code());
        diagnostic.line = err.line;
        diagnostic
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Error::Internal(err.to_string())
    }
}
