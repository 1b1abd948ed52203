use core::fmt;
use core::ops::Range;

/// Byte range of a token or node in the original source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span(start..end)
    }

    pub fn start(&self) -> usize {
        self.0.start
    }

    pub fn end(&self) -> usize {
        self.0.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span(range)
    }
}

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    LitInt,
    LitFloat,
    LitStr,
    True,
    False,

    // Keywords
    If,
    Else,
    While,
    Break,
    Continue,
    Return,

    // Type names
    Int,
    Float,
    String,
    Bool,
    Void,

    // Operators
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Assign,
    Plus,
    PlusAssign,
    Minus,
    MinusAssign,
    Star,
    StarAssign,
    Slash,
    SlashAssign,
    AndAnd,
    OrOr,

    // Punctuation
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,

    Eof,
}

impl TokenKind {
    /// Whether this token starts a type (`int x`, `void f()`).
    pub fn is_type(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::Float | TokenKind::String | TokenKind::Bool | TokenKind::Void
        )
    }

    fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Ident => "identifier",
            LitInt => "integer literal",
            LitFloat => "float literal",
            LitStr => "string literal",
            True => "`true`",
            False => "`false`",
            If => "`if`",
            Else => "`else`",
            While => "`while`",
            Break => "`break`",
            Continue => "`continue`",
            Return => "`return`",
            Int => "`int`",
            Float => "`float`",
            String => "`string`",
            Bool => "`bool`",
            Void => "`void`",
            Less => "`<`",
            LessEqual => "`<=`",
            Greater => "`>`",
            GreaterEqual => "`>=`",
            Equal => "`==`",
            NotEqual => "`!=`",
            Assign => "`=`",
            Plus => "`+`",
            PlusAssign => "`+=`",
            Minus => "`-`",
            MinusAssign => "`-=`",
            Star => "`*`",
            StarAssign => "`*=`",
            Slash => "`/`",
            SlashAssign => "`/=`",
            AndAnd => "`&&`",
            OrOr => "`||`",
            Comma => "`,`",
            Semicolon => "`;`",
            LParen => "`(`",
            RParen => "`)`",
            LBrace => "`{`",
            RBrace => "`}`",
            Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A lexical token.
///
/// `value` holds the payload of identifiers and literals. For string literals
/// it is the unescaped contents without the surrounding quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: Option<&'a str>,
    pub line: u32,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, value: Option<&'a str>, line: u32, span: Span) -> Self {
        Token {
            kind,
            value,
            line,
            span,
        }
    }

    /// The payload, or the empty string for tokens without one.
    pub fn text(&self) -> &'a str {
        self.value.unwrap_or("")
    }
}
