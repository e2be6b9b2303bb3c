//! Recursive-descent parser for the Parley expression language.
//!
//! Precedence, lowest first:
//!
//! ```text
//! match        pattern => body
//! sequence     a; b; c
//! assignment   x = y, x += y, x -= y   (right associative)
//! conditional  a ? b : c
//! or           ||
//! and          &&
//! equality     == != === !==
//! relational   < <= > >=
//! additive     + -
//! multiplicative * / %
//! unary        ! - +
//! postfix      f(x)  a.b  a[b]
//! primary      literals, identifiers, (expr), [..], {..}
//! ```

use parley_foundation::{Error, ErrorKind, Result, Value};

use crate::ast::{AssignOp, BinaryOp, Expr, LogicalOp, Property, UnaryOp};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for Parley source code.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Span of the last consumed token.
    previous: Span,
    /// Source text (for error messages).
    source: &'src str,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Span::default(),
            source,
        }
    }

    /// Parses the whole source as one expression.
    ///
    /// # Errors
    /// Returns a `ParseError` if the source is not a single well-formed
    /// expression.
    pub fn parse_expression(&mut self) -> Result<Expr> {
        if self.current.kind == TokenKind::Eof {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_match()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.error(&format!("unexpected {}", self.current.kind.name())));
        }
        Ok(expr)
    }

    fn parse_match(&mut self) -> Result<Expr> {
        let pattern = self.parse_sequence()?;
        if !self.eat(&TokenKind::FatArrow) {
            return Ok(pattern);
        }
        let body = self.parse_sequence()?;
        let span = pattern.span().to(body.span());
        Ok(Expr::Match {
            pattern: Box::new(pattern),
            body: Box::new(body),
            span,
        })
    }

    fn parse_sequence(&mut self) -> Result<Expr> {
        let first = self.parse_assignment()?;
        if self.current.kind != TokenKind::Semicolon {
            return Ok(first);
        }
        let start = first.span();
        let mut items = vec![first];
        while self.eat(&TokenKind::Semicolon) {
            if self.at_sequence_end() {
                break;
            }
            items.push(self.parse_assignment()?);
        }
        if items.len() == 1 {
            return Ok(items.remove(0));
        }
        Ok(Expr::Sequence(items, self.span_from(start)))
    }

    fn at_sequence_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Eof | TokenKind::RParen | TokenKind::FatArrow | TokenKind::Semicolon
        )
    }

    fn parse_assignment(&mut self) -> Result<Expr> {
        let target = self.parse_conditional()?;
        let op = match self.current.kind {
            TokenKind::Assign => AssignOp::Set,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            _ => return Ok(target),
        };
        if !matches!(target, Expr::Identifier(..) | Expr::Member { .. }) {
            return Err(self.error_at(target.span(), "invalid assignment target"));
        }
        self.advance();
        let value = self.parse_assignment()?;
        let span = target.span().to(value.span());
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let test = self.parse_logical(LogicalOp::Or)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = test.span().to(alternate.span());
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        })
    }

    fn parse_logical(&mut self, op: LogicalOp) -> Result<Expr> {
        let (token, next) = match op {
            LogicalOp::Or => (TokenKind::OrOr, Some(LogicalOp::And)),
            LogicalOp::And => (TokenKind::AndAnd, None),
        };
        let operand = |p: &mut Self| match next {
            Some(inner) => p.parse_logical(inner),
            None => p.parse_equality(),
        };
        let mut left = operand(self)?;
        while self.eat(&token) {
            let right = operand(self)?;
            let span = left.span().to(right.span());
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_relational, |kind| match kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::BangEq => Some(BinaryOp::Ne),
            TokenKind::EqEqEq => Some(BinaryOp::StrictEq),
            TokenKind::BangEqEq => Some(BinaryOp::StrictNe),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_additive, |kind| match kind {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    /// Parses a left-associative run of binary operators.
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = operator(&self.current.kind) {
            self.advance();
            let right = operand(self)?;
            let span = left.span().to(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current.kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        let start = self.current.span;
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span: self.span_from(start),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let start = expr.span();
            match self.current.kind {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_list(&TokenKind::RParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span: self.span_from(start),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let TokenKind::Identifier(name) = &self.current.kind else {
                        return Err(self.error(&format!(
                            "expected property name, found {}",
                            self.current.kind.name()
                        )));
                    };
                    let property = Property::Named(name.clone());
                    self.advance();
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        span: self.span_from(start),
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_assignment()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Property::Computed(Box::new(key)),
                        span: self.span_from(start),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.current.span;
        let literal = match &self.current.kind {
            TokenKind::Nil => Value::Nil,
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Int(n) => Value::Int(*n),
            TokenKind::Float(n) => Value::Float(*n),
            TokenKind::String(s) => Value::from(s.as_str()),
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                return Ok(Expr::Identifier(name, span));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_sequence()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list(&TokenKind::RBracket)?;
                return Ok(Expr::Array(items, self.span_from(span)));
            }
            TokenKind::LBrace => return self.parse_object(),
            TokenKind::Error(message) => return Err(self.error(message)),
            kind => return Err(self.error(&format!("unexpected {}", kind.name()))),
        };
        self.advance();
        Ok(Expr::Literal(literal, span))
    }

    /// Parses comma-separated expressions up to `close` (already past the opener).
    fn parse_list(&mut self, close: &TokenKind) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while self.current.kind != *close {
            items.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_object(&mut self) -> Result<Expr> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            let key = match &self.current.kind {
                TokenKind::Identifier(name) | TokenKind::String(name) => name.clone(),
                TokenKind::Int(n) => n.to_string(),
                kind => {
                    return Err(self.error(&format!("expected object key, found {}", kind.name())));
                }
            };
            self.advance();
            self.expect(&TokenKind::Colon)?;
            entries.push((key, self.parse_assignment()?));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::Object(entries, self.span_from(start)))
    }

    fn advance(&mut self) {
        self.previous = self.current.span;
        self.current = self.lexer.next_token();
    }

    /// Consumes the current token if it has the given kind.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.current.kind == *kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!(
                "expected {}, found {}",
                expected.name(),
                self.current.kind.name()
            )))
        }
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.previous)
    }

    fn error(&self, message: &str) -> Error {
        self.error_at(self.current.span, message)
    }

    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::new(ErrorKind::ParseError {
            message: message.to_string(),
            line: span.line,
            column: span.column,
            context: self.context_at(span),
        })
    }

    /// Returns the source line containing `span`.
    fn context_at(&self, span: Span) -> String {
        let at = span.start.min(self.source.len());
        let line_start = self.source[..at].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[at..]
            .find('\n')
            .map_or(self.source.len(), |i| at + i);
        self.source[line_start..line_end].to_string()
    }
}

/// Parses source text into a single expression.
///
/// # Errors
/// Returns a `ParseError` if the source is malformed.
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source).parse_expression()
}
