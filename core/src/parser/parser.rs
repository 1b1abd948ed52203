use bumpalo::Bump;

use crate::parser::error::{ParseError, ParseErrorKind};
use crate::parser::lexer::tokenize;
use crate::syntax::{
    AssignOp, Ast, AstBuilder, BinaryOp, Literal, NodeId, NodeKind, PrimKind, Span, Token,
    TokenKind,
};

type PResult<T> = Result<T, ParseError>;

/// Default maximum nesting depth of expressions and blocks.
pub const DEFAULT_MAX_DEPTH: usize = 256;

// Binary operator ladder, loosest to tightest. Every level is left-associative.
const OR_OPS: &[(TokenKind, BinaryOp)] = &[(TokenKind::OrOr, BinaryOp::Or)];
const AND_OPS: &[(TokenKind, BinaryOp)] = &[(TokenKind::AndAnd, BinaryOp::And)];
const COMPARISON_OPS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Less, BinaryOp::Less),
    (TokenKind::Greater, BinaryOp::Greater),
    (TokenKind::LessEqual, BinaryOp::LessEqual),
    (TokenKind::GreaterEqual, BinaryOp::GreaterEqual),
];
const EQUALITY_OPS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Equal, BinaryOp::Equal),
    (TokenKind::NotEqual, BinaryOp::NotEqual),
];
const ADDITIVE_OPS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Plus, BinaryOp::Add),
    (TokenKind::PlusAssign, BinaryOp::AddAssign),
    (TokenKind::Minus, BinaryOp::Sub),
    (TokenKind::MinusAssign, BinaryOp::SubAssign),
];
const MULTIPLICATIVE_OPS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Star, BinaryOp::Mul),
    (TokenKind::StarAssign, BinaryOp::MulAssign),
    (TokenKind::Slash, BinaryOp::Div),
    (TokenKind::SlashAssign, BinaryOp::DivAssign),
];

/// Recursive-descent parser over a token slice with one token of lookahead.
///
/// The slice must end with an end-of-file token, which [`Parser::new`]
/// checks; the cursor never moves past it.
pub struct Parser<'a, 't> {
    tokens: &'t [Token<'a>],
    pos: usize,
    ast: AstBuilder<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'a, 't> Parser<'a, 't> {
    pub fn new(tokens: &'t [Token<'a>], max_depth: usize) -> PResult<Self> {
        match tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => {}
            last => {
                let (line, span) =
                    last.map_or((1, Span::default()), |t| (t.line, t.span.clone()));
                return Err(ParseError::new(ParseErrorKind::MissingEof, line, span));
            }
        }
        Ok(Parser {
            tokens,
            pos: 0,
            ast: AstBuilder::new(),
            depth: 0,
            max_depth,
        })
    }

    /// Parse a whole program: a sequence of declarations up to end of file.
    pub fn parse_program(mut self) -> PResult<Ast<'a>> {
        let first = self.current().clone();
        let mut decls = Vec::new();
        while self.current().kind != TokenKind::Eof {
            decls.push(self.parse_decl()?);
        }
        tracing::debug!(decls = decls.len(), "Parsed program");
        Ok(self.ast.finish(decls, first))
    }

    // === Token cursor ===

    fn current(&self) -> &Token<'a> {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        let index = (self.pos + ahead).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn accept(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        (self.current().kind == kind).then(|| self.advance())
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token<'a>> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.to_string()))
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let token = self.current();
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found: token.kind,
                expected: expected.into(),
            },
            token.line,
            token.span.clone(),
        )
    }

    /// Run `parse` one nesting level deeper, failing once `max_depth` is hit.
    fn nested(&mut self, parse: fn(&mut Self) -> PResult<NodeId>) -> PResult<NodeId> {
        if self.depth >= self.max_depth {
            let token = self.current();
            return Err(ParseError::new(
                ParseErrorKind::TooDeep {
                    max: self.max_depth,
                },
                token.line,
                token.span.clone(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn alloc(&mut self, kind: NodeKind<'a>, token: Token<'a>) -> NodeId {
        self.ast.alloc(kind, token)
    }

    // === Declarations ===

    fn parse_type(&mut self) -> PResult<NodeId> {
        let kind = match self.current().kind {
            TokenKind::Int => PrimKind::Int,
            TokenKind::Float => PrimKind::Float,
            TokenKind::String => PrimKind::String,
            TokenKind::Bool => PrimKind::Bool,
            TokenKind::Void => PrimKind::Void,
            _ => return Err(self.unexpected("a type")),
        };
        let token = self.advance();
        Ok(self.alloc(NodeKind::Type { kind }, token))
    }

    fn parse_decl(&mut self) -> PResult<NodeId> {
        let ty = self.parse_type()?;
        let name_token = self.expect(TokenKind::Ident)?;
        match self.current().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.var_decl(ty, name_token, None))
            }
            TokenKind::Assign => {
                self.advance();
                let init = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(self.var_decl(ty, name_token, Some(init)))
            }
            TokenKind::LParen => self.parse_fn_decl(ty, name_token),
            _ => Err(self.unexpected("`;`, `=` or `(`")),
        }
    }

    fn var_decl(&mut self, ty: NodeId, name_token: Token<'a>, init: Option<NodeId>) -> NodeId {
        let name = name_token.text();
        self.alloc(NodeKind::VarDecl { ty, name, init }, name_token)
    }

    fn parse_fn_decl(&mut self, ret: NodeId, name_token: Token<'a>) -> PResult<NodeId> {
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(self.alloc(
            NodeKind::FnDecl {
                ret,
                name: name_token.text(),
                params,
                body: Some(body),
                intrinsic: None,
            },
            name_token,
        ))
    }

    fn parse_params(&mut self) -> PResult<Vec<NodeId>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.accept(TokenKind::RParen).is_some() {
            return Ok(params);
        }
        loop {
            let ty = self.parse_type()?;
            let name_token = self.expect(TokenKind::Ident)?;
            let name = name_token.text();
            params.push(self.alloc(NodeKind::Param { ty, name }, name_token));
            if self.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    // === Statements ===

    fn parse_block(&mut self) -> PResult<NodeId> {
        self.nested(Self::parse_block_contents)
    }

    fn parse_block_contents(&mut self) -> PResult<NodeId> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while self.accept(TokenKind::RBrace).is_none() {
            if self.current().kind == TokenKind::Eof {
                return Err(self.unexpected(TokenKind::RBrace.to_string()));
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(self.alloc(NodeKind::Block { stmts }, open))
    }

    fn parse_statement(&mut self) -> PResult<NodeId> {
        match self.current().kind {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Break => {
                let token = self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(self.alloc(NodeKind::Break, token))
            }
            TokenKind::Continue => {
                let token = self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(self.alloc(NodeKind::Continue, token))
            }
            TokenKind::Return => self.parse_return(),
            kind if kind.is_type() => self.parse_local_decl(),
            TokenKind::Ident => self.parse_ident_statement(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn parse_if(&mut self) -> PResult<NodeId> {
        let if_token = self.expect(TokenKind::If)?;
        let mut branches = Vec::new();
        let cond = self.parse_paren_expr()?;
        let body = self.parse_block()?;
        branches.push((cond, body));

        let mut otherwise = None;
        while self.accept(TokenKind::Else).is_some() {
            if self.accept(TokenKind::If).is_some() {
                let cond = self.parse_paren_expr()?;
                let body = self.parse_block()?;
                branches.push((cond, body));
            } else {
                otherwise = Some(self.parse_block()?);
                break;
            }
        }
        Ok(self.alloc(
            NodeKind::If {
                branches,
                otherwise,
            },
            if_token,
        ))
    }

    fn parse_while(&mut self) -> PResult<NodeId> {
        let token = self.expect(TokenKind::While)?;
        let cond = self.parse_paren_expr()?;
        let body = self.parse_block()?;
        Ok(self.alloc(NodeKind::While { cond, body }, token))
    }

    fn parse_return(&mut self) -> PResult<NodeId> {
        let token = self.expect(TokenKind::Return)?;
        let value = if self.current().kind == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(self.alloc(NodeKind::Return { value }, token))
    }

    fn parse_local_decl(&mut self) -> PResult<NodeId> {
        let ty = self.parse_type()?;
        let name_token = self.expect(TokenKind::Ident)?;
        let init = if self.accept(TokenKind::Assign).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        if self.current().kind != TokenKind::Semicolon {
            let expected = if init.is_some() { "`;`" } else { "`;` or `=`" };
            return Err(self.unexpected(expected));
        }
        self.advance();
        Ok(self.var_decl(ty, name_token, init))
    }

    /// A statement starting with an identifier: a call or an assignment,
    /// told apart by the token after the identifier.
    fn parse_ident_statement(&mut self) -> PResult<NodeId> {
        let op = match self.peek_kind(1) {
            TokenKind::LParen => {
                let token = self.current().clone();
                let call = self.parse_call()?;
                self.expect(TokenKind::Semicolon)?;
                return Ok(self.alloc(NodeKind::CallStmt { call }, token));
            }
            TokenKind::Assign => AssignOp::Set,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            _ => {
                self.advance();
                return Err(self.unexpected("`(` or an assignment operator"));
            }
        };
        let name_token = self.advance();
        self.advance();
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.alloc(
            NodeKind::Assign {
                name: name_token.text(),
                op,
                value,
            },
            name_token,
        ))
    }

    // === Expressions ===

    fn parse_expr(&mut self) -> PResult<NodeId> {
        self.nested(Self::parse_or)
    }

    fn parse_paren_expr(&mut self) -> PResult<NodeId> {
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_binary_level(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> PResult<NodeId>,
    ) -> PResult<NodeId> {
        let mut left = next(self)?;
        loop {
            let kind = self.current().kind;
            let Some(&(_, op)) = ops.iter().find(|(k, _)| *k == kind) else {
                break;
            };
            let op_token = self.advance();
            let right = next(self)?;
            left = self.alloc(NodeKind::Binary { op, left, right }, op_token);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> PResult<NodeId> {
        self.parse_binary_level(OR_OPS, Self::parse_and)
    }

    fn parse_and(&mut self) -> PResult<NodeId> {
        self.parse_binary_level(AND_OPS, Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> PResult<NodeId> {
        self.parse_binary_level(COMPARISON_OPS, Self::parse_equality)
    }

    fn parse_equality(&mut self) -> PResult<NodeId> {
        self.parse_binary_level(EQUALITY_OPS, Self::parse_additive)
    }

    fn parse_additive(&mut self) -> PResult<NodeId> {
        self.parse_binary_level(ADDITIVE_OPS, Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> PResult<NodeId> {
        self.parse_binary_level(MULTIPLICATIVE_OPS, Self::parse_primary)
    }

    fn parse_primary(&mut self) -> PResult<NodeId> {
        match self.current().kind {
            TokenKind::LitInt => {
                let token = self.advance();
                let value = token.text().parse::<i32>().map_err(|_| {
                    invalid_literal(&token, "integer")
                })?;
                Ok(self.constant(Literal::Int(value), token))
            }
            TokenKind::LitFloat => {
                let token = self.advance();
                let value = token.text().parse::<f32>().map_err(|_| {
                    invalid_literal(&token, "float")
                })?;
                Ok(self.constant(Literal::Float(value), token))
            }
            TokenKind::LitStr => {
                let token = self.advance();
                Ok(self.constant(Literal::Str(token.text()), token))
            }
            TokenKind::True => {
                let token = self.advance();
                Ok(self.constant(Literal::Bool(true), token))
            }
            TokenKind::False => {
                let token = self.advance();
                Ok(self.constant(Literal::Bool(false), token))
            }
            TokenKind::Ident if self.peek_kind(1) == TokenKind::LParen => self.parse_call(),
            TokenKind::Ident => {
                let token = self.advance();
                Ok(self.alloc(NodeKind::Var { name: token.text() }, token))
            }
            TokenKind::LParen => self.parse_paren_expr(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn constant(&mut self, value: Literal<'a>, token: Token<'a>) -> NodeId {
        self.alloc(NodeKind::Const { value }, token)
    }

    fn parse_call(&mut self) -> PResult<NodeId> {
        let name_token = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.accept(TokenKind::RParen).is_none() {
            loop {
                args.push(self.parse_expr()?);
                if self.accept(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }
        Ok(self.alloc(
            NodeKind::Call {
                name: name_token.text(),
                args,
            },
            name_token,
        ))
    }
}

fn invalid_literal(token: &Token<'_>, kind: &'static str) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidLiteral {
            kind,
            text: token.text().to_string(),
        },
        token.line,
        token.span.clone(),
    )
}

/// Parses a program with the default maximum nesting depth.
///
/// Identifier and literal payloads are allocated in `arena`, which must
/// outlive the returned tree.
pub fn parse<'a>(arena: &'a Bump, source: &str) -> Result<Ast<'a>, ParseError> {
    parse_with_max_depth(arena, source, DEFAULT_MAX_DEPTH)
}

/// Parses a program with a custom maximum nesting depth.
pub fn parse_with_max_depth<'a>(
    arena: &'a Bump,
    source: &str,
    max_depth: usize,
) -> Result<Ast<'a>, ParseError> {
    let tokens = tokenize(arena, source)?;
    parse_tokens(&tokens, max_depth)
}

/// Parses an already scanned token stream. A stream that does not end with
/// an end-of-file token is rejected with [`ParseErrorKind::MissingEof`].
pub fn parse_tokens<'a>(tokens: &[Token<'a>], max_depth: usize) -> Result<Ast<'a>, ParseError> {
    Parser::new(tokens, max_depth)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse_ok<'a>(arena: &'a Bump, source: &str) -> Ast<'a> {
        match parse(arena, source) {
            Ok(ast) => ast,
            Err(err) => panic!("failed to parse {source:?}: {err}"),
        }
    }

    fn parse_err(source: &str) -> ParseError {
        let arena = Bump::new();
        parse(&arena, source).unwrap_err()
    }

    /// Render an expression tree with explicit parentheses.
    fn show(ast: &Ast<'_>, id: NodeId) -> String {
        match ast.kind(id) {
            NodeKind::Const { value } => match value {
                Literal::Int(v) => v.to_string(),
                Literal::Float(v) => format!("{v:?}"),
                Literal::Str(s) => format!("{s:?}"),
                Literal::Bool(b) => b.to_string(),
            },
            NodeKind::Var { name } => name.to_string(),
            NodeKind::Binary { op, left, right } => {
                format!("({} {op} {})", show(ast, *left), show(ast, *right))
            }
            NodeKind::Call { name, args } => {
                let args: Vec<_> = args.iter().map(|&a| show(ast, a)).collect();
                format!("{name}({})", args.join(", "))
            }
            other => panic!("not an expression: {other:?}"),
        }
    }

    /// Parse `int x = <expr>;` and render the initializer.
    fn expr(source: &str) -> String {
        let arena = Bump::new();
        let program = format!("int x = {source};");
        let ast = parse_ok(&arena, &program);
        let NodeKind::VarDecl { init: Some(init), .. } = ast.kind(ast.decls()[0]) else {
            panic!("expected an initialized declaration");
        };
        show(&ast, *init)
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(expr("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(expr("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(expr("a < b == c > d"), "((a < (b == c)) > d)");
        assert_eq!(expr("a || b && c"), "(a || (b && c))");
        assert_eq!(expr("a + 1 < b || f(2, c * 3)"), "(((a + 1) < b) || f(2, (c * 3)))");
    }

    #[test]
    fn test_binary_levels_are_left_associative() {
        assert_eq!(expr("10 - 4 - 3"), "((10 - 4) - 3)");
        assert_eq!(expr("8 / 2 * 2"), "((8 / 2) * 2)");
        assert_eq!(expr("a && b && c"), "((a && b) && c)");
    }

    #[test]
    fn test_comparison_binds_looser_than_equality() {
        // Comparison sits above equality in the ladder.
        assert_eq!(expr("a == b < c"), "((a == b) < c)");
    }

    #[test]
    fn test_compound_operators_in_expressions() {
        assert_eq!(expr("y += 2 * 3"), "(y += (2 * 3))");
        assert_eq!(expr("y *= 2 + 3"), "((y *= 2) + 3)");
    }

    #[test]
    fn test_literals() {
        assert_eq!(expr("2.5"), "2.5");
        assert_eq!(expr("\"hi\""), "\"hi\"");
        assert_eq!(expr("true && false"), "(true && false)");
        assert_eq!(expr("2147483647"), "2147483647");
    }

    #[test]
    fn test_integer_literal_out_of_range() {
        let err = parse_err("int x = 2147483648;");
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidLiteral {
                kind: "integer",
                text: "2147483648".to_string()
            }
        );
    }

    #[test]
    fn test_top_level_declarations() {
        let arena = Bump::new();
        let ast = parse_ok(
            &arena,
            indoc! {"
                int counter;
                float scale = 1.5;
                void main() {}
            "},
        );
        let decls = ast.decls();
        assert_eq!(decls.len(), 3);
        assert!(matches!(
            ast.kind(decls[0]),
            NodeKind::VarDecl { name: "counter", init: None, .. }
        ));
        assert!(matches!(
            ast.kind(decls[1]),
            NodeKind::VarDecl { name: "scale", init: Some(_), .. }
        ));
        assert!(matches!(
            ast.kind(decls[2]),
            NodeKind::FnDecl { name: "main", intrinsic: None, body: Some(_), .. }
        ));
        for &decl in decls {
            assert_eq!(ast.parent(decl), Some(ast.root()));
        }
    }

    #[test]
    fn test_function_parameters() {
        let arena = Bump::new();
        let ast = parse_ok(&arena, "int add(int a, float b) { return a; }");
        let NodeKind::FnDecl { params, ret, .. } = ast.kind(ast.decls()[0]) else {
            panic!("expected a function");
        };
        assert_eq!(ast.type_kind(*ret), Some(PrimKind::Int));
        let names: Vec<_> = params.iter().map(|&p| ast.declared_name(p)).collect();
        assert_eq!(names, vec![Some("a"), Some("b")]);
        let types: Vec<_> = params.iter().map(|&p| ast.declared_type(p)).collect();
        assert_eq!(types, vec![Some(PrimKind::Int), Some(PrimKind::Float)]);
    }

    #[test]
    fn test_if_chain_branches() {
        let arena = Bump::new();
        let ast = parse_ok(
            &arena,
            indoc! {"
                void main() {
                    if (a) { print(1); }
                    else if (b) { print(2); }
                    else if (c) { print(3); }
                    else { print(4); }
                }
            "},
        );
        let NodeKind::FnDecl { body: Some(body), .. } = ast.kind(ast.decls()[0]) else {
            panic!("expected a function");
        };
        let NodeKind::Block { stmts } = ast.kind(*body) else {
            panic!("expected a block");
        };
        let NodeKind::If {
            branches,
            otherwise,
        } = ast.kind(stmts[0])
        else {
            panic!("expected an if statement");
        };
        let conds: Vec<_> = branches.iter().map(|&(c, _)| show(&ast, c)).collect();
        assert_eq!(conds, vec!["a", "b", "c"]);
        assert!(otherwise.is_some());
    }

    #[test]
    fn test_identifier_led_statements() {
        let arena = Bump::new();
        let ast = parse_ok(
            &arena,
            indoc! {"
                void main() {
                    f(1);
                    x = 1;
                    x += 2;
                    x -= 3;
                    x *= 4;
                    x /= 5;
                }
            "},
        );
        let NodeKind::FnDecl { body: Some(body), .. } = ast.kind(ast.decls()[0]) else {
            panic!("expected a function");
        };
        let NodeKind::Block { stmts } = ast.kind(*body) else {
            panic!("expected a block");
        };
        assert!(matches!(ast.kind(stmts[0]), NodeKind::CallStmt { .. }));
        let ops: Vec<_> = stmts[1..]
            .iter()
            .map(|&s| match ast.kind(s) {
                NodeKind::Assign { name, op, .. } => (*name, *op),
                other => panic!("expected an assignment, got {other:?}"),
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                ("x", AssignOp::Set),
                ("x", AssignOp::Add),
                ("x", AssignOp::Sub),
                ("x", AssignOp::Mul),
                ("x", AssignOp::Div),
            ]
        );
    }

    #[test]
    fn test_loop_statements_link_to_while() {
        let arena = Bump::new();
        let ast = parse_ok(
            &arena,
            "void main() { while (true) { if (x) { break; } continue; } return; }",
        );
        let breaks: Vec<_> = ast
            .ids()
            .filter(|&id| matches!(ast.kind(id), NodeKind::Break | NodeKind::Continue))
            .collect();
        assert_eq!(breaks.len(), 2);
        for id in breaks {
            let target = ast.enclosing_loop(id).expect("loop");
            assert!(matches!(ast.kind(target), NodeKind::While { .. }));
        }
    }

    #[test]
    fn test_unexpected_token_reports_line() {
        let err = parse_err("void main() {\n  int x = ;\n}");
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                found: TokenKind::Semicolon,
                expected: "an expression".to_string()
            }
        );
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "line 2: unexpected `;`, expected an expression");
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_err("void main() { x = 1 }");
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                found: TokenKind::RBrace,
                expected: "`;`".to_string()
            }
        );
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse_err("void main() { print(1);");
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                found: TokenKind::Eof,
                expected: "`}`".to_string()
            }
        );
    }

    #[test]
    fn test_identifier_statement_needs_call_or_assignment() {
        let err = parse_err("void main() { x; }");
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                found: TokenKind::Semicolon,
                expected: "`(` or an assignment operator".to_string()
            }
        );
    }

    #[test]
    fn test_lex_errors_surface_as_parse_errors() {
        let err = parse_err("void main() { string s = \"oops; }");
        assert_eq!(err.code(), "L001");
        assert_eq!(parse_err("int;").code(), "P001");
    }

    #[test]
    fn test_depth_tracking_exceeds_limit() {
        let max_depth = 20;
        let nested = format!("{}1{}", "(".repeat(max_depth + 5), ")".repeat(max_depth + 5));
        let source = format!("int x = {nested};");
        let arena = Bump::new();
        let err = parse_with_max_depth(&arena, &source, max_depth).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep { max: max_depth });
        assert!(err.to_string().contains("nesting depth exceeds maximum of 20"));
    }

    #[test]
    fn test_depth_tracking_default_max() {
        let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        let arena = Bump::new();
        assert!(parse(&arena, &format!("int x = {nested};")).is_ok());
        assert_eq!(DEFAULT_MAX_DEPTH, 256);
    }

    #[test]
    fn test_nested_blocks_count_towards_depth() {
        let source = format!("void main() {}{}", "{".repeat(40), "}".repeat(40));
        let arena = Bump::new();
        let err = parse_with_max_depth(&arena, &source, 16).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep { max: 16 });
    }

    #[test]
    fn test_parse_tokens_directly() {
        let tokens = vec![
            Token::new(TokenKind::Int, None, 1, Span::new(0, 3)),
            Token::new(TokenKind::Ident, Some("x"), 1, Span::new(4, 5)),
            Token::new(TokenKind::Semicolon, None, 1, Span::new(5, 6)),
            Token::new(TokenKind::Eof, None, 1, Span::new(6, 6)),
        ];
        let ast = parse_tokens(&tokens, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(ast.decls().len(), 1);
        assert_eq!(ast.declared_name(ast.decls()[0]), Some("x"));
    }

    #[test]
    fn test_parse_tokens_requires_eof() {
        let err = parse_tokens(&[], DEFAULT_MAX_DEPTH).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEof);
        assert_eq!(err.line, 1);

        let tokens = vec![
            Token::new(TokenKind::Int, None, 2, Span::new(0, 3)),
            Token::new(TokenKind::Ident, Some("x"), 2, Span::new(4, 5)),
        ];
        let err = parse_tokens(&tokens, DEFAULT_MAX_DEPTH).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEof);
        assert_eq!(err.line, 2);
        assert_eq!(err.span, Span::new(4, 5));
    }
}
