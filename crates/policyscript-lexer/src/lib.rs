//! PolicyScript Lexer
//!
//! Tokenizes PolicyScript documents into a stream of tokens.
//! A document is prose (headings, paragraphs, `#` comments) with fenced code
//! blocks introduced by `@meta`, `@define`, `@enum`, `@inputs`, `@outputs`,
//! `@locals` and `@code`. The scanner switches grammar at those fences and
//! inserts a `;` terminator at line breaks that end a code statement.
//!
//! # Example
//!
//! ```
//! use policyscript_lexer::{Scanner, TokenKind};
//!
//! let (tokens, errors) = Scanner::tokenize("_ Pricing\n\n@code {\n  total : $5\n}");
//! assert!(errors.is_empty());
//! assert_eq!(tokens[0].kind, TokenKind::Heading);
//! assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
//! ```

pub mod position;
pub mod scanner;
pub mod stream;
pub mod token;

pub use position::{Position, Range};
pub use scanner::{ErrorHandler, Scanner, ScannerMode};
pub use stream::{TokenBuffer, TokenSource};
pub use token::{Token, TokenKind};

/// What went wrong while scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LexErrorKind {
    #[error("illegal character `{0}`")]
    IllegalCharacter(char),
    #[error("unterminated text, missing closing backtick")]
    UnterminatedText,
    #[error("unterminated {0} literal, missing closing `|`")]
    UnterminatedTemporalLiteral(TokenKind),
    #[error("unterminated {0} block, missing closing `}}`")]
    UnterminatedBlock(TokenKind),
}

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{position}: {kind}")]
pub struct LexerError {
    pub kind: LexErrorKind,
    pub position: Position,
}

impl LexerError {
    pub fn new(kind: LexErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        let err = LexerError::new(
            LexErrorKind::UnterminatedBlock(TokenKind::Code),
            Position::new(4, 0, 37),
        );
        assert_eq!(err.to_string(), "4:0: unterminated @code block, missing closing `}`");
    }

    #[test]
    fn test_kind_display_is_bare_message() {
        assert_eq!(
            LexErrorKind::IllegalCharacter('?').to_string(),
            "illegal character `?`"
        );
        assert_eq!(
            LexErrorKind::UnterminatedTemporalLiteral(TokenKind::Time).to_string(),
            "unterminated time literal, missing closing `|`"
        );
    }
}
