mod error;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;

pub use error::{LexErrorKind, ParseError, ParseErrorKind};
pub use lexer::tokenize;
pub use parser::{DEFAULT_MAX_DEPTH, Parser, parse, parse_tokens, parse_with_max_depth};
