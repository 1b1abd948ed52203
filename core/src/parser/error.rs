use thiserror::Error;

use crate::syntax::{Span, TokenKind};

/// What went wrong while scanning characters into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unterminated string")]
    UnterminatedString,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
}

/// What went wrong while building the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error(transparent)]
    Lex(#[from] LexErrorKind),

    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken { found: TokenKind, expected: String },

    #[error("invalid {kind} literal `{text}`")]
    InvalidLiteral { kind: &'static str, text: String },

    #[error(
        "nesting depth exceeds maximum of {max} levels. \
         This likely indicates excessively nested parentheses or calls."
    )]
    TooDeep { max: usize },

    #[error("token stream does not end with end of file")]
    MissingEof,
}

/// A fatal error from the lexer or parser. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: impl Into<ParseErrorKind>, line: u32, span: Span) -> Self {
        ParseError {
            kind: kind.into(),
            line,
            span,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ParseErrorKind::Lex(_) => "L001",
            _ => "P001",
        }
    }
}
