/*!
 * Script Parser
 * Recursive-descent parser from tokens to a unit AST
 */

use super::ast::*;
use super::lexer::{tokenize, SyntaxError, Token, TokenKind};
use std::sync::Arc;

/// Nesting limit for expressions and blocks
const MAX_NESTING: usize = 96;

type ParseResult<T> = Result<T, SyntaxError>;

/// Parse a whole unit
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut body = Vec::new();
    while !parser.check(&TokenKind::Eof) {
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always ends with Eof, so the last token is a safe fallback
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn line(&self) -> usize {
        self.peek().line
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn error(&self, message: String) -> SyntaxError {
        let found = match &self.peek().kind {
            TokenKind::Eof => "end of input".to_string(),
            other => format!("{:?}", other),
        };
        SyntaxError::new(self.line(), format!("{}, found {}", message, found))
    }

    fn ident(&mut self, what: &str) -> ParseResult<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::new(self.line(), "nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn next_is_ident(&self) -> bool {
        matches!(
            self.tokens.get(self.pos + 1),
            Some(Token {
                kind: TokenKind::Ident(_),
                ..
            })
        )
    }

    fn end_statement(&mut self) {
        self.matches(&TokenKind::Semicolon);
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        self.enter()?;
        let result = self.statement_inner();
        self.leave();
        result
    }

    fn statement_inner(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        let current = self.peek().kind.clone();
        let kind = match current {
            TokenKind::Let => {
                self.advance();
                let name = self.ident("variable name after 'let'")?;
                let init = if self.matches(&TokenKind::Assign) {
                    Some(self.expression()?)
                } else {
                    None
                };
                self.end_statement();
                StmtKind::Let { name, init }
            }
            TokenKind::Fn if self.next_is_ident() => {
                self.advance();
                let name = self.ident("function name")?;
                StmtKind::Function(self.function_rest(Some(name))?)
            }
            TokenKind::If => self.if_statement()?,
            TokenKind::While => {
                self.advance();
                let condition = self.condition()?;
                let body = self.block()?;
                StmtKind::While { condition, body }
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon)
                    || self.check(&TokenKind::RBrace)
                    || self.check(&TokenKind::Eof)
                {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.end_statement();
                StmtKind::Return(value)
            }
            TokenKind::Throw => {
                self.advance();
                let value = self.expression()?;
                self.end_statement();
                StmtKind::Throw(value)
            }
            TokenKind::LBrace => StmtKind::Block(self.block()?),
            _ => {
                let expr = self.expression()?;
                if self.matches(&TokenKind::Assign) {
                    if !matches!(expr, Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }) {
                        return Err(SyntaxError::new(line, "invalid assignment target"));
                    }
                    let value = self.expression()?;
                    self.end_statement();
                    StmtKind::Assign { target: expr, value }
                } else {
                    self.end_statement();
                    StmtKind::Expr(expr)
                }
            }
        };
        Ok(Stmt { kind, line })
    }

    fn if_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let condition = self.condition()?;
        let then_branch = self.block()?;
        let else_branch = if self.matches(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let line = self.line();
                let nested = self.if_statement()?;
                Some(vec![Stmt { kind: nested, line }])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn condition(&mut self) -> ParseResult<Expr> {
        self.expect(&TokenKind::LParen, "'(' before condition")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen, "')' after condition")?;
        Ok(condition)
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error("expected '}'".into()));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn function_rest(&mut self, name: Option<String>) -> ParseResult<Arc<FunctionDecl>> {
        self.expect(&TokenKind::LParen, "'(' before parameters")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.ident("parameter name")?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')' after parameters")?;
        let body = self.block()?;
        Ok(Arc::new(FunctionDecl { name, params, body }))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.enter()?;
        let result = self.or();
        self.leave();
        result
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut left = self.and()?;
        while self.matches(&TokenKind::OrOr) {
            let right = self.and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut left = self.equality()?;
        while self.matches(&TokenKind::AndAnd) {
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn binary_level(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in operators {
                if self.matches(token) {
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[(TokenKind::EqEq, BinaryOp::Eq), (TokenKind::NotEq, BinaryOp::NotEq)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::LessEq, BinaryOp::LessEq),
                (TokenKind::Greater, BinaryOp::Greater),
                (TokenKind::GreaterEq, BinaryOp::GreaterEq),
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
            Self::factor,
        )
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = if self.matches(&TokenKind::Bang) {
            UnaryOp::Not
        } else if self.matches(&TokenKind::Minus) {
            UnaryOp::Neg
        } else {
            return self.postfix();
        };
        self.enter()?;
        let operand = self.unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.matches(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RParen, "')' after arguments")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.matches(&TokenKind::Dot) {
                let name = self.member_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    name,
                };
            } else if self.matches(&TokenKind::LBracket) {
                let index = self.expression()?;
                self.expect(&TokenKind::RBracket, "']' after index")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Identifier or keyword after `.` or as an object key
    fn member_name(&mut self) -> ParseResult<String> {
        let name = match &self.peek().kind {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Let => "let".into(),
            TokenKind::Fn => "fn".into(),
            TokenKind::Return => "return".into(),
            TokenKind::If => "if".into(),
            TokenKind::Else => "else".into(),
            TokenKind::While => "while".into(),
            TokenKind::True => "true".into(),
            TokenKind::False => "false".into(),
            TokenKind::Null => "null".into(),
            TokenKind::Throw => "throw".into(),
            _ => return Err(self.error("expected member name".into())),
        };
        self.advance();
        Ok(name)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        Ok(match token.kind {
            TokenKind::Number(n) => Expr::Number(n),
            TokenKind::Str(s) => Expr::Str(s),
            TokenKind::Ident(name) => Expr::Ident(name),
            TokenKind::True => Expr::Bool(true),
            TokenKind::False => Expr::Bool(false),
            TokenKind::Null => Expr::Null,
            TokenKind::Fn => Expr::Function(self.function_rest(None)?),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                inner
            }
            TokenKind::LBracket => {
                let mut items = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    items.push(self.expression()?);
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket, "']' after list items")?;
                Expr::List(items)
            }
            TokenKind::LBrace => {
                let mut entries = Vec::new();
                while !self.check(&TokenKind::RBrace) {
                    let key = match &self.peek().kind {
                        TokenKind::Str(s) => {
                            let key = s.clone();
                            self.advance();
                            key
                        }
                        _ => self.member_name()?,
                    };
                    self.expect(&TokenKind::Colon, "':' after object key")?;
                    entries.push((key, self.expression()?));
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace, "'}' after object entries")?;
                Expr::Object(entries)
            }
            other => {
                return Err(SyntaxError::new(
                    token.line,
                    format!("unexpected token {:?}", other),
                ))
            }
        })
    }
}
