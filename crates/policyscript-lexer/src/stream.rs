use std::vec;

use crate::position::Range;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};

/// A pull-based source of tokens.
///
/// Implementations must keep returning `Eof` once the input is exhausted.
pub trait TokenSource {
    fn next_token(&mut self) -> Token;
}

impl TokenSource for Scanner<'_> {
    fn next_token(&mut self) -> Token {
        Scanner::next_token(self)
    }
}

impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    fn next_token(&mut self) -> Token {
        (**self).next_token()
    }
}

/// Replays an already-scanned token list.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    tokens: vec::IntoIter<Token>,
    eof: Token,
}

impl TokenBuffer {
    /// Wrap `tokens`. If the list does not end with `Eof`, one is synthesized
    /// at the end of the last token.
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof = match tokens.last() {
            Some(last) if last.is(TokenKind::Eof) => last.clone(),
            Some(last) => Token::new(TokenKind::Eof, "", Range::point(last.range.end)),
            None => Token::new(TokenKind::Eof, "", Range::default()),
        };
        Self {
            tokens: tokens.into_iter(),
            eof,
        }
    }
}

impl From<Vec<Token>> for TokenBuffer {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl TokenSource for TokenBuffer {
    fn next_token(&mut self) -> Token {
        self.tokens.next().unwrap_or_else(|| self.eof.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use pretty_assertions::assert_eq;

    fn ident(name: &str, offset: usize) -> Token {
        let start = Position::new(1, offset, offset);
        let end = Position::new(1, offset + name.len(), offset + name.len());
        Token::new(TokenKind::Ident, name, Range::new(start, end))
    }

    #[test]
    fn test_buffer_replays_then_repeats_eof() {
        let scanned = Scanner::new("Hello").scan();
        let mut buffer = TokenBuffer::from(scanned.clone());
        assert_eq!(buffer.next_token(), scanned[0]);
        assert_eq!(buffer.next_token(), scanned[1]);
        assert_eq!(buffer.next_token(), scanned[1]);
    }

    #[test]
    fn test_buffer_synthesizes_eof() {
        let mut buffer = TokenBuffer::new(vec![ident("a", 0), ident("bc", 2)]);
        buffer.next_token();
        buffer.next_token();
        let eof = buffer.next_token();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.range, Range::point(Position::new(1, 4, 4)));
    }

    #[test]
    fn test_empty_buffer_yields_eof() {
        let mut buffer = TokenBuffer::new(Vec::new());
        assert_eq!(buffer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_borrowed_scanner_is_a_source() {
        fn drain(mut source: impl TokenSource) -> usize {
            let mut count = 0;
            while !source.next_token().is(TokenKind::Eof) {
                count += 1;
            }
            count
        }

        let mut scanner = Scanner::new("@code {\n  ?\n}");
        assert_eq!(drain(&mut scanner), 4);
        assert_eq!(scanner.error_count(), 1);
    }
}
