//! Abstract Syntax Tree for PolicyScript.
//!
//! Contains statement-level nodes (prose, blocks, control flow) and
//! expression-level nodes (operators, declarations, literals). Every node
//! reports the source [`Range`] it covers.

use std::fmt;

use policyscript_lexer::Range;

// ---------------------------------------------------------------------------
// Program and statements
// ---------------------------------------------------------------------------

/// A complete PolicyScript document.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    /// From the first statement to the last. Empty programs have the
    /// zero-width range at the start of input.
    pub fn range(&self) -> Range {
        match (self.statements.first(), self.statements.last()) {
            (Some(first), Some(last)) => first.range().to(last.range()),
            _ => Range::default(),
        }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stmt {
    /// A bare expression: `a : 5`, `set a to 5`
    Expression(Expr),

    /// `_ Title`
    Heading {
        depth: usize,
        value: String,
        range: Range,
    },

    /// A run of prose lines.
    Paragraph { value: String, range: Range },

    /// One or more `#` lines.
    Comment { value: String, range: Range },

    /// `@code { ... }`, `@define Name { ... }`
    Block(Block),

    /// `{ ... }`
    Scope(Scope),

    /// `if cond { ... }`
    If {
        keyword: Range,
        condition: Expr,
        consequence: Scope,
    },

    /// `else { ... }` or `else if cond { ... }`
    Else {
        keyword: Range,
        condition: Option<Expr>,
        consequence: Scope,
    },

    /// `for item in items { ... }`
    For {
        keyword: Range,
        element: Identifier,
        iterable: Expr,
        body: Scope,
    },
}

impl Stmt {
    pub fn range(&self) -> Range {
        match self {
            Stmt::Expression(expr) => expr.range(),
            Stmt::Heading { range, .. }
            | Stmt::Paragraph { range, .. }
            | Stmt::Comment { range, .. } => *range,
            Stmt::Block(block) => block.range(),
            Stmt::Scope(scope) => scope.range(),
            Stmt::If {
                keyword,
                consequence,
                ..
            }
            | Stmt::Else {
                keyword,
                consequence,
                ..
            } => keyword.to(consequence.range()),
            Stmt::For { keyword, body, .. } => keyword.to(body.range()),
        }
    }
}

/// Which `@keyword` opened a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockKind {
    Meta,
    Define,
    Enum,
    Inputs,
    Outputs,
    Locals,
    Code,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Meta => "@meta",
            BlockKind::Define => "@define",
            BlockKind::Enum => "@enum",
            BlockKind::Inputs => "@inputs",
            BlockKind::Outputs => "@outputs",
            BlockKind::Locals => "@locals",
            BlockKind::Code => "@code",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub kind: BlockKind,
    pub keyword: Range,
    /// Type name after `@define`.
    pub name: Option<Identifier>,
    pub statements: Vec<Stmt>,
    /// Closing brace, if one was found.
    pub close: Option<Range>,
}

impl Block {
    pub fn range(&self) -> Range {
        let end = self
            .close
            .or_else(|| self.statements.last().map(Stmt::range))
            .or_else(|| self.name.as_ref().map(|name| name.range))
            .unwrap_or(self.keyword);
        self.keyword.to(end)
    }
}

/// A brace-delimited statement list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    pub open: Range,
    pub statements: Vec<Stmt>,
    pub close: Option<Range>,
}

impl Scope {
    pub fn range(&self) -> Range {
        let end = self
            .close
            .or_else(|| self.statements.last().map(Stmt::range))
            .unwrap_or(self.open);
        self.open.to(end)
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A variable name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    pub name: String,
    pub range: Range,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// Identifier: `income`, `tax_rate`
    Identifier(Identifier),

    /// Prefix operation: `-amount`
    Prefix {
        op: PrefixOp,
        op_range: Range,
        right: Box<Expr>,
    },

    /// Binary operation: `a + b`, `income > threshold`
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Declaration: `rate : 12.5%`
    Declare { ident: Identifier, value: Box<Expr> },

    /// Mutation: `set tax to 0`
    Set {
        keyword: Range,
        ident: Identifier,
        value: Box<Expr>,
    },

    /// Boolean literal: `true`, `false`
    Bool { value: bool, range: Range },

    /// Text literal: `` `hello` ``
    Text { value: String, range: Range },

    /// Integer literal: `42`, `1_000`
    Integer { value: i64, range: Range },

    /// Decimal literal: `3.14`
    Decimal { value: f64, range: Range },

    /// Money literal: `$5.00`
    Money {
        value: f64,
        symbol: char,
        range: Range,
    },

    /// Percent literal: `12.5%`, stored as written (12.5, not 0.125)
    Percent { value: f64, range: Range },

    /// Period literal: `30 days`
    Period {
        value: i64,
        unit: String,
        range: Range,
    },

    /// Date literal: `|2024/07/01|`
    Date {
        year: u32,
        month: u32,
        day: u32,
        range: Range,
    },

    /// Time literal: `|10:30|`, `|10:30:15|`
    Time {
        hours: u32,
        minutes: u32,
        seconds: u32,
        range: Range,
    },
}

impl Expr {
    pub fn range(&self) -> Range {
        match self {
            Expr::Identifier(ident) => ident.range,
            Expr::Prefix {
                op_range, right, ..
            } => op_range.to(right.range()),
            Expr::Infix { left, right, .. } => left.range().to(right.range()),
            Expr::Declare { ident, value } => ident.range.to(value.range()),
            Expr::Set { keyword, value, .. } => keyword.to(value.range()),
            Expr::Bool { range, .. }
            | Expr::Text { range, .. }
            | Expr::Integer { range, .. }
            | Expr::Decimal { range, .. }
            | Expr::Money { range, .. }
            | Expr::Percent { range, .. }
            | Expr::Period { range, .. }
            | Expr::Date { range, .. }
            | Expr::Time { range, .. } => *range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrefixOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl InfixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Eq => "=",
            InfixOp::NotEq => "!=",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::LtEq => "<=",
            InfixOp::GtEq => ">=",
            InfixOp::And => "and",
            InfixOp::Or => "or",
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
