//! Statement and expression parser for PolicyScript.
//!
//! Pulls tokens from any [`TokenSource`] with one token of lookahead.
//! Statements are parsed by recursive descent; expressions use Pratt
//! parsing over [`Precedence`].
//!
//! Every statement parser leaves the current token on the first token after
//! its construct. A statement that fails records one error and the parser
//! skips ahead to the next statement boundary.

use std::mem;

use policyscript_lexer::{Range, Token, TokenKind, TokenSource};
use tracing::{debug, trace};

use crate::ast::{Block, BlockKind, Expr, Identifier, InfixOp, PrefixOp, Program, Scope, Stmt};
use crate::{ParseError, ParseErrorKind};

/// Binding power of operators, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `:`
    Assign,
    Or,
    And,
    /// `=` `!=`
    Equals,
    /// `<` `>` `<=` `>=`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// `-x`
    Prefix,
}

impl Precedence {
    /// Precedence of `kind` in infix position. Tokens that cannot continue an
    /// expression are `Lowest`.
    pub const fn of(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::Colon => Precedence::Assign,
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
                Precedence::LessGreater
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Mult | TokenKind::Div => Precedence::Product,
            _ => Precedence::Lowest,
        }
    }
}

/// PolicyScript parser.
///
/// Converts a token stream into a [`Program`], collecting [`ParseError`]s
/// instead of stopping at the first one.
pub struct Parser<S> {
    source: S,
    cur: Token,
    peek: Token,
    errors: Vec<ParseError>,
    /// Tokens consumed so far. Lets statement loops detect a stalled parse.
    consumed: usize,
}

impl<S: TokenSource> Parser<S> {
    /// Create a parser, priming the current and peek tokens.
    pub fn new(mut source: S) -> Self {
        let cur = source.next_token();
        let peek = source.next_token();
        Self {
            source,
            cur,
            peek,
            errors: Vec::new(),
            consumed: 0,
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Parse statements until end of input.
    pub fn parse_program(&mut self) -> Program {
        let statements = self.parse_statement_list(None);
        debug!(
            target: "policyscript::parser",
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Program { statements }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse statements until `closing` (left as the current token) or end
    /// of input. `;` separators are skipped.
    fn parse_statement_list(&mut self, closing: Option<TokenKind>) -> Vec<Stmt> {
        let mut statements = Vec::new();

        loop {
            match self.cur.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.next_token();
                    continue;
                }
                kind if Some(kind) == closing => break,
                _ => {}
            }

            let before = self.consumed;
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
            if self.consumed == before {
                self.next_token();
            }
        }

        statements
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        trace!(
            target: "policyscript::parser",
            kind = %self.cur.kind,
            range = %self.cur.range,
            "statement"
        );

        if let Some(kind) = block_kind(self.cur.kind) {
            return self.parse_block(kind);
        }

        match self.cur.kind {
            TokenKind::Heading => {
                let value = self.cur.literal.strip_prefix("_ ").unwrap_or(&self.cur.literal);
                let stmt = Stmt::Heading {
                    depth: 1,
                    value: value.to_string(),
                    range: self.cur.range,
                };
                self.next_token();
                Some(stmt)
            }
            TokenKind::Paragraph => {
                let stmt = Stmt::Paragraph {
                    value: self.cur.literal.clone(),
                    range: self.cur.range,
                };
                self.next_token();
                Some(stmt)
            }
            TokenKind::Comment => {
                let stmt = Stmt::Comment {
                    value: self.cur.literal.clone(),
                    range: self.cur.range,
                };
                self.next_token();
                Some(stmt)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Else => self.parse_else(),
            TokenKind::For => self.parse_for(),
            TokenKind::LBrace => Some(Stmt::Scope(self.parse_scope())),
            TokenKind::Set => {
                let expr = self.parse_set()?;
                self.next_token();
                Some(Stmt::Expression(expr))
            }
            _ => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.next_token();
                Some(Stmt::Expression(expr))
            }
        }
    }

    /// `@keyword [Name] { statements }`
    fn parse_block(&mut self, kind: BlockKind) -> Option<Stmt> {
        let keyword = self.cur.range;
        debug!(target: "policyscript::parser", block = %kind, %keyword, "block");

        let name = if self.peek.is(TokenKind::Ident) {
            self.next_token();
            Some(self.cur_identifier())
        } else {
            None
        };

        self.expect_peek(TokenKind::LBrace)?;
        let scope = self.parse_scope();

        Some(Stmt::Block(Block {
            kind,
            keyword,
            name,
            statements: scope.statements,
            close: scope.close,
        }))
    }

    /// `{ statements }`, starting on the opening brace. A missing closing
    /// brace is reported but the scope is still returned.
    fn parse_scope(&mut self) -> Scope {
        let open = self.cur.range;
        self.next_token();

        let statements = self.parse_statement_list(Some(TokenKind::RBrace));

        let close = if self.cur.is(TokenKind::RBrace) {
            let close = self.cur.range;
            self.next_token();
            Some(close)
        } else {
            self.unexpected(TokenKind::RBrace, self.cur.kind, self.cur.range);
            None
        };

        Scope {
            open,
            statements,
            close,
        }
    }

    /// `if condition { ... }`
    fn parse_if(&mut self) -> Option<Stmt> {
        let keyword = self.cur.range;
        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_scope();

        Some(Stmt::If {
            keyword,
            condition,
            consequence,
        })
    }

    /// `else { ... }` or `else if condition { ... }`
    fn parse_else(&mut self) -> Option<Stmt> {
        let keyword = self.cur.range;

        let condition = if self.peek.is(TokenKind::If) {
            self.next_token();
            self.next_token();
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };

        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_scope();

        Some(Stmt::Else {
            keyword,
            condition,
            consequence,
        })
    }

    /// `for element in iterable { ... }`
    fn parse_for(&mut self) -> Option<Stmt> {
        let keyword = self.cur.range;

        self.expect_peek(TokenKind::Ident)?;
        let element = self.cur_identifier();

        self.expect_peek(TokenKind::In)?;
        self.next_token();
        let iterable = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_scope();

        Some(Stmt::For {
            keyword,
            element,
            iterable,
            body,
        })
    }

    /// `set name to value`. Leaves the current token on the value's last token.
    fn parse_set(&mut self) -> Option<Expr> {
        let keyword = self.cur.range;

        self.expect_peek(TokenKind::Ident)?;
        let ident = self.cur_identifier();

        self.expect_peek(TokenKind::To)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        Some(Expr::Set {
            keyword,
            ident,
            value: Box::new(value),
        })
    }

    /// Skip to the next token that can start or end a statement.
    ///
    /// A `{` met on the way is skipped through its matching `}`, so a
    /// failed `if`/`for` header discards its own body and never closes the
    /// enclosing scope. Document-mode tokens stop the skip at any depth.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.cur.kind {
                TokenKind::Eof | TokenKind::Heading | TokenKind::Paragraph => return,
                kind if block_kind(kind).is_some() => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Comment if depth == 0 => {
                    return;
                }
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.next_token();
                        return;
                    }
                }
                _ => {}
            }
            self.next_token();
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Pratt loop. Starts on the expression's first token and leaves the
    /// current token on its last.
    pub fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek.is(TokenKind::Semicolon) && precedence < Precedence::of(self.peek.kind) {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::Ident => Some(Expr::Identifier(self.cur_identifier())),
            TokenKind::True | TokenKind::False => Some(Expr::Bool {
                value: self.cur.is(TokenKind::True),
                range: self.cur.range,
            }),
            TokenKind::Integer
            | TokenKind::Decimal
            | TokenKind::Money
            | TokenKind::Percent
            | TokenKind::Period
            | TokenKind::Text
            | TokenKind::Date
            | TokenKind::Time => self.parse_literal(),
            TokenKind::Minus => {
                let op_range = self.cur.range;
                self.next_token();
                let right = self.parse_expression(Precedence::Prefix)?;
                Some(Expr::Prefix {
                    op: PrefixOp::Neg,
                    op_range,
                    right: Box::new(right),
                })
            }
            TokenKind::LParen => {
                self.next_token();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RParen)?;
                Some(expr)
            }
            kind => {
                self.error(ParseErrorKind::NoPrefixParseFunction(kind), self.cur.range);
                None
            }
        }
    }

    /// Called with the operator as the current token.
    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        let kind = self.cur.kind;
        if kind == TokenKind::Colon {
            return self.parse_declare(left);
        }

        let op = match infix_op(kind) {
            Some(op) => op,
            None => {
                self.error(ParseErrorKind::NoPrefixParseFunction(kind), self.cur.range);
                return None;
            }
        };

        self.next_token();
        let right = self.parse_expression(Precedence::of(kind))?;

        Some(Expr::Infix {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `name : value`. The value binds loosest, so `a : 5 + 3` declares `a`
    /// as the whole sum.
    fn parse_declare(&mut self, left: Expr) -> Option<Expr> {
        let ident = match left {
            Expr::Identifier(ident) => ident,
            other => {
                self.error(ParseErrorKind::InvalidDeclareTarget, other.range());
                return None;
            }
        };

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        Some(Expr::Declare {
            ident,
            value: Box::new(value),
        })
    }

    fn parse_literal(&mut self) -> Option<Expr> {
        match decode_literal(&self.cur) {
            Some(expr) => Some(expr),
            None => {
                self.error(
                    ParseErrorKind::InvalidLiteral {
                        kind: self.cur.kind,
                        literal: self.cur.literal.clone(),
                    },
                    self.cur.range,
                );
                None
            }
        }
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn next_token(&mut self) {
        let next = self.source.next_token();
        self.cur = mem::replace(&mut self.peek, next);
        self.consumed += 1;
    }

    /// Advance if the peek token is `kind`; otherwise record an error.
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek.is(kind) {
            self.next_token();
            Some(())
        } else {
            self.unexpected(kind, self.peek.kind, self.peek.range);
            None
        }
    }

    fn cur_identifier(&self) -> Identifier {
        Identifier {
            name: self.cur.literal.clone(),
            range: self.cur.range,
        }
    }

    fn unexpected(&mut self, expected: TokenKind, found: TokenKind, range: Range) {
        self.error(ParseErrorKind::UnexpectedToken { expected, found }, range);
    }

    fn error(&mut self, kind: ParseErrorKind, range: Range) {
        let error = ParseError { kind, range };
        debug!(target: "policyscript::parser", %error, "parse error");
        self.errors.push(error);
    }
}

fn block_kind(kind: TokenKind) -> Option<BlockKind> {
    match kind {
        TokenKind::Meta => Some(BlockKind::Meta),
        TokenKind::Define => Some(BlockKind::Define),
        TokenKind::Enum => Some(BlockKind::Enum),
        TokenKind::Inputs => Some(BlockKind::Inputs),
        TokenKind::Outputs => Some(BlockKind::Outputs),
        TokenKind::Locals => Some(BlockKind::Locals),
        TokenKind::Code => Some(BlockKind::Code),
        _ => None,
    }
}

fn infix_op(kind: TokenKind) -> Option<InfixOp> {
    match kind {
        TokenKind::Plus => Some(InfixOp::Add),
        TokenKind::Minus => Some(InfixOp::Sub),
        TokenKind::Mult => Some(InfixOp::Mul),
        TokenKind::Div => Some(InfixOp::Div),
        TokenKind::Eq => Some(InfixOp::Eq),
        TokenKind::NotEq => Some(InfixOp::NotEq),
        TokenKind::Lt => Some(InfixOp::Lt),
        TokenKind::Gt => Some(InfixOp::Gt),
        TokenKind::LtEq => Some(InfixOp::LtEq),
        TokenKind::GtEq => Some(InfixOp::GtEq),
        TokenKind::And => Some(InfixOp::And),
        TokenKind::Or => Some(InfixOp::Or),
        _ => None,
    }
}

/// Decode a literal token's text. `None` if it does not fit its kind.
fn decode_literal(token: &Token) -> Option<Expr> {
    let range = token.range;
    let literal = token.literal.as_str();

    let expr = match token.kind {
        TokenKind::Integer => Expr::Integer {
            value: literal.parse().ok()?,
            range,
        },
        TokenKind::Decimal => Expr::Decimal {
            value: literal.parse().ok()?,
            range,
        },
        TokenKind::Percent => Expr::Percent {
            value: literal.parse().ok()?,
            range,
        },
        TokenKind::Money => {
            let mut chars = literal.chars();
            let symbol = chars.next()?;
            Expr::Money {
                value: chars.as_str().parse().ok()?,
                symbol,
                range,
            }
        }
        TokenKind::Period => {
            let (amount, unit) = literal.split_once(' ')?;
            Expr::Period {
                value: amount.parse().ok()?,
                unit: unit.to_string(),
                range,
            }
        }
        TokenKind::Text => Expr::Text {
            value: literal.to_string(),
            range,
        },
        TokenKind::Date => match components(literal, '/')?[..] {
            [year, month, day] => Expr::Date {
                year,
                month,
                day,
                range,
            },
            _ => return None,
        },
        TokenKind::Time => match components(literal, ':')?[..] {
            [hours, minutes] => Expr::Time {
                hours,
                minutes,
                seconds: 0,
                range,
            },
            [hours, minutes, seconds] => Expr::Time {
                hours,
                minutes,
                seconds,
                range,
            },
            _ => return None,
        },
        _ => return None,
    };

    Some(expr)
}

fn components(literal: &str, separator: char) -> Option<Vec<u32>> {
    literal
        .split(separator)
        .map(|part| part.parse().ok())
        .collect()
}
