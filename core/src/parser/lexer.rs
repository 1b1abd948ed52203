//! Scanner turning source text into [`Token`]s.

use bumpalo::Bump;
use logos::Logos;

use super::error::{LexErrorKind, ParseError};
use crate::syntax::{Span, Token, TokenKind};

/// Raw lexemes recognized by the scanner.
///
/// Block comments and unterminated strings are lexemes of their own so they
/// can be skipped or reported with a precise message.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+|//[^\n]*")]
enum Lexeme {
    #[token("/*", block_comment)]
    BlockComment,

    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("string")]
    String,
    #[token("bool")]
    Bool,
    #[token("void")]
    Void,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex("[0-9]+")]
    LitInt,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    LitFloat,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    LitStr,

    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedStr,

    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("+=")]
    PlusAssign,
    #[token("-")]
    Minus,
    #[token("-=")]
    MinusAssign,
    #[token("*")]
    Star,
    #[token("*=")]
    StarAssign,
    #[token("/")]
    Slash,
    #[token("/=")]
    SlashAssign,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

fn block_comment(lex: &mut logos::Lexer<Lexeme>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl Lexeme {
    fn token_kind(self) -> Option<TokenKind> {
        use TokenKind as K;
        Some(match self {
            Lexeme::BlockComment | Lexeme::UnterminatedStr => return None,
            Lexeme::If => K::If,
            Lexeme::Else => K::Else,
            Lexeme::While => K::While,
            Lexeme::Break => K::Break,
            Lexeme::Continue => K::Continue,
            Lexeme::Return => K::Return,
            Lexeme::Int => K::Int,
            Lexeme::Float => K::Float,
            Lexeme::String => K::String,
            Lexeme::Bool => K::Bool,
            Lexeme::Void => K::Void,
            Lexeme::True => K::True,
            Lexeme::False => K::False,
            Lexeme::Ident => K::Ident,
            Lexeme::LitInt => K::LitInt,
            Lexeme::LitFloat => K::LitFloat,
            Lexeme::LitStr => K::LitStr,
            Lexeme::Less => K::Less,
            Lexeme::LessEqual => K::LessEqual,
            Lexeme::Greater => K::Greater,
            Lexeme::GreaterEqual => K::GreaterEqual,
            Lexeme::Equal => K::Equal,
            Lexeme::NotEqual => K::NotEqual,
            Lexeme::Assign => K::Assign,
            Lexeme::Plus => K::Plus,
            Lexeme::PlusAssign => K::PlusAssign,
            Lexeme::Minus => K::Minus,
            Lexeme::MinusAssign => K::MinusAssign,
            Lexeme::Star => K::Star,
            Lexeme::StarAssign => K::StarAssign,
            Lexeme::Slash => K::Slash,
            Lexeme::SlashAssign => K::SlashAssign,
            Lexeme::AndAnd => K::AndAnd,
            Lexeme::OrOr => K::OrOr,
            Lexeme::Comma => K::Comma,
            Lexeme::Semicolon => K::Semicolon,
            Lexeme::LParen => K::LParen,
            Lexeme::RParen => K::RParen,
            Lexeme::LBrace => K::LBrace,
            Lexeme::RBrace => K::RBrace,
        })
    }
}

/// Maps byte offsets to 1-based line numbers.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = core::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex { starts }
    }

    fn line_of(&self, offset: usize) -> u32 {
        self.starts.partition_point(|&start| start <= offset) as u32
    }
}

/// Decode the escapes of a string literal body (quotes already stripped).
fn unescape(raw: &str) -> Result<String, char> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(other),
            None => return Err('\\'),
        }
    }
    Ok(out)
}

/// Scan `source` into tokens terminated by an end-of-file token.
///
/// Identifier and literal payloads are copied into `arena`. Scanning stops at
/// the first lexical error.
pub fn tokenize<'a>(arena: &'a Bump, source: &str) -> Result<Vec<Token<'a>>, ParseError> {
    let lines = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = Lexeme::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span(lexer.span());
        let line = lines.line_of(span.start());
        let slice = lexer.slice();

        let lexeme = match result {
            Ok(lexeme) => lexeme,
            Err(()) => {
                let kind = if slice.starts_with("/*") {
                    LexErrorKind::UnterminatedComment
                } else {
                    LexErrorKind::UnexpectedChar(slice.chars().next().unwrap_or('\0'))
                };
                return Err(ParseError::new(kind, line, span));
            }
        };

        let value = match lexeme {
            Lexeme::BlockComment => continue,
            Lexeme::UnterminatedStr => {
                return Err(ParseError::new(
                    LexErrorKind::UnterminatedString,
                    line,
                    span,
                ));
            }
            Lexeme::LitStr => {
                let body = &slice[1..slice.len() - 1];
                let text = unescape(body).map_err(|c| {
                    ParseError::new(LexErrorKind::InvalidEscape(c), line, span.clone())
                })?;
                Some(arena.alloc_str(&text) as &str)
            }
            Lexeme::Ident | Lexeme::LitInt | Lexeme::LitFloat => {
                Some(arena.alloc_str(slice) as &str)
            }
            _ => None,
        };

        if let Some(kind) = lexeme.token_kind() {
            tokens.push(Token::new(kind, value, line, span));
        }
    }

    let end = source.len();
    tokens.push(Token::new(
        TokenKind::Eof,
        None,
        lines.line_of(end),
        Span::new(end, end),
    ));
    tracing::debug!(count = tokens.len(), "Scanned tokens");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseErrorKind;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        tokenize(&arena, source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_error(source: &str) -> ParseError {
        let arena = Bump::new();
        tokenize(&arena, source).unwrap_err()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("int main() { while (x) break; }"),
            vec![
                Int, Ident, LParen, RParen, LBrace, While, LParen, Ident, RParen, Break,
                Semicolon, RBrace, Eof
            ]
        );
        // Keywords are only matched as whole words.
        assert_eq!(kinds("iffy int_value"), vec![Ident, Ident, Eof]);
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        use TokenKind::*;
        assert_eq!(
            kinds("< <= > >= == != = += -= *= /= && || + - * /"),
            vec![
                Less,
                LessEqual,
                Greater,
                GreaterEqual,
                Equal,
                NotEqual,
                Assign,
                PlusAssign,
                MinusAssign,
                StarAssign,
                SlashAssign,
                AndAnd,
                OrOr,
                Plus,
                Minus,
                Star,
                Slash,
                Eof
            ]
        );
    }

    #[test]
    fn test_literals_carry_payload() {
        let arena = Bump::new();
        let tokens = tokenize(&arena, r#"42 3.5 1e3 "a\tb\"c" true"#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LitInt);
        assert_eq!(tokens[0].value, Some("42"));
        assert_eq!(tokens[1].kind, TokenKind::LitFloat);
        assert_eq!(tokens[1].value, Some("3.5"));
        assert_eq!(tokens[2].kind, TokenKind::LitFloat);
        assert_eq!(tokens[3].kind, TokenKind::LitStr);
        assert_eq!(tokens[3].value, Some("a\tb\"c"));
        assert_eq!(tokens[4].kind, TokenKind::True);
        assert_eq!(tokens[4].value, None);
    }

    #[test]
    fn test_comments_are_skipped_and_lines_counted() {
        let arena = Bump::new();
        let source = "// header\nint /* multi\nline */ x;\n";
        let tokens = tokenize(&arena, source).unwrap();
        let lines: Vec<_> = tokens.iter().map(|t| (t.kind, t.line)).collect();
        assert_eq!(
            lines,
            vec![
                (TokenKind::Int, 2),
                (TokenKind::Ident, 3),
                (TokenKind::Semicolon, 3),
                (TokenKind::Eof, 4),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex_error("int x;\nstring s = \"abc;\n");
        assert_eq!(err.kind, ParseErrorKind::Lex(LexErrorKind::UnterminatedString));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = lex_error("int x; /* never closed");
        assert_eq!(err.kind, ParseErrorKind::Lex(LexErrorKind::UnterminatedComment));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_invalid_escape() {
        let err = lex_error(r#""bad \q escape""#);
        assert_eq!(err.kind, ParseErrorKind::Lex(LexErrorKind::InvalidEscape('q')));
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex_error("int x = 1;\n\nx = $;");
        assert_eq!(err.kind, ParseErrorKind::Lex(LexErrorKind::UnexpectedChar('$')));
        assert_eq!(err.line, 3);
    }
}
