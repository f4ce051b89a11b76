//! PolicyScript Parser
//!
//! Parses a token stream into an Abstract Syntax Tree.
//! Prose tokens become heading, paragraph and comment statements; code inside
//! `@keyword { ... }` blocks is parsed into statements and Pratt-parsed
//! expressions.
//!
//! Parsing never stops at the first problem: errors are collected alongside
//! the best-effort [`Program`].
//!
//! # Example
//!
//! ```
//! use policyscript_parser::{parse_code, Expr, Stmt};
//!
//! let output = parse_code("rate : 12.5%");
//! assert!(output.is_ok());
//! assert!(matches!(
//!     &output.program.statements[0],
//!     Stmt::Expression(Expr::Declare { .. })
//! ));
//! ```

pub mod ast;
pub mod parser;

pub use ast::{
    Block, BlockKind, Expr, Identifier, InfixOp, PrefixOp, Program, Scope, Stmt,
};
pub use parser::{Parser, Precedence};

use policyscript_lexer::{LexerError, Range, Scanner, ScannerMode, TokenKind};

/// What went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseErrorKind {
    #[error("no prefix parse function for `{0}`")]
    NoPrefixParseFunction(TokenKind),
    #[error("left side of `:` must be a variable")]
    InvalidDeclareTarget,
    #[error("expected `{expected}`, found `{found}`")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("invalid {kind} literal `{literal}`")]
    InvalidLiteral { kind: TokenKind, literal: String },
}

/// Parser error with range information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{range}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub range: Range,
}

/// Everything produced by one parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<ParseError>,
    pub lex_errors: Vec<LexerError>,
}

impl ParseOutput {
    /// True when neither the scanner nor the parser reported anything.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.lex_errors.is_empty()
    }
}

/// Parse a PolicyScript document.
pub fn parse(source: &str) -> ParseOutput {
    run(Scanner::new(source))
}

/// Parse a bare code snippet, as if it were the body of a `@code` block.
pub fn parse_code(source: &str) -> ParseOutput {
    run(Scanner::with_mode(source, ScannerMode::Block))
}

fn run(mut scanner: Scanner<'_>) -> ParseOutput {
    let mut parser = Parser::new(&mut scanner);
    let program = parser.parse_program();
    let errors = parser.into_errors();
    ParseOutput {
        program,
        errors,
        lex_errors: scanner.into_errors(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyscript_lexer::Position;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        let err = ParseError {
            kind: ParseErrorKind::UnexpectedToken {
                expected: TokenKind::RBrace,
                found: TokenKind::Eof,
            },
            range: Range::point(Position::new(3, 4, 20)),
        };
        assert_eq!(err.to_string(), "3:4-3:4: expected `}`, found `EOF`");
    }

    #[test]
    fn test_output_collects_both_error_lists() {
        let output = parse("@code {\n  total : ?\n");
        assert!(!output.is_ok());
        assert_eq!(output.lex_errors.len(), 2);
        assert!(!output.errors.is_empty());
    }
}
