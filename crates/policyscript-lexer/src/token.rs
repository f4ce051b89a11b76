use std::fmt;

use crate::position::Range;

/// Token classification for PolicyScript source.
///
/// Kinds are plain tags; the decoded text lives in [`Token::literal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    // Structure
    Illegal,
    Eof,

    // Documentation
    Heading,
    Paragraph,
    Comment,

    // Literals
    Ident,
    Integer,
    Decimal,
    Money,
    Percent,
    Period,
    Text,
    Date,
    Time,

    // Operators
    Eq,
    NotEq,
    Plus,
    Minus,
    Mult,
    Div,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Colon,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,

    // Keywords
    If,
    Else,
    For,
    In,
    Set,
    To,
    True,
    False,
    And,
    Or,
    List,

    // Block keywords
    Meta,
    Define,
    Enum,
    Inputs,
    Outputs,
    Locals,
    Code,

    /// Statement terminator inserted by the scanner at line breaks.
    Semicolon,
}

impl TokenKind {
    /// Display name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Illegal => "illegal",
            TokenKind::Eof => "EOF",
            TokenKind::Heading => "heading",
            TokenKind::Paragraph => "paragraph",
            TokenKind::Comment => "comment",
            TokenKind::Ident => "identifier",
            TokenKind::Integer => "integer",
            TokenKind::Decimal => "decimal",
            TokenKind::Money => "money",
            TokenKind::Percent => "percent",
            TokenKind::Period => "period",
            TokenKind::Text => "text",
            TokenKind::Date => "date",
            TokenKind::Time => "time",
            TokenKind::Eq => "=",
            TokenKind::NotEq => "!=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Mult => "*",
            TokenKind::Div => "/",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Colon => ":",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Set => "set",
            TokenKind::To => "to",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::List => "list",
            TokenKind::Meta => "@meta",
            TokenKind::Define => "@define",
            TokenKind::Enum => "@enum",
            TokenKind::Inputs => "@inputs",
            TokenKind::Outputs => "@outputs",
            TokenKind::Locals => "@locals",
            TokenKind::Code => "@code",
            TokenKind::Semicolon => ";",
        }
    }

    pub fn is_block_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Meta
                | TokenKind::Define
                | TokenKind::Enum
                | TokenKind::Inputs
                | TokenKind::Outputs
                | TokenKind::Locals
                | TokenKind::Code
        )
    }

    /// Whether a line break after this token ends the statement.
    pub fn ends_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::Money
                | TokenKind::Percent
                | TokenKind::Period
                | TokenKind::Text
                | TokenKind::Date
                | TokenKind::Time
                | TokenKind::RParen
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    /// Decoded text: comment markers stripped, digit separators removed,
    /// fences and backticks dropped.
    pub literal: String,
    pub range: Range,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            literal: literal.into(),
            range,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Classify an identifier as a keyword or a plain `Ident`.
pub fn lookup_ident(ident: &str) -> TokenKind {
    match ident {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "set" => TokenKind::Set,
        "to" => TokenKind::To,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "list" => TokenKind::List,
        _ => TokenKind::Ident,
    }
}

/// Look up an `@`-prefixed block keyword.
pub fn lookup_block_keyword(word: &str) -> Option<TokenKind> {
    match word {
        "@meta" => Some(TokenKind::Meta),
        "@define" => Some(TokenKind::Define),
        "@enum" => Some(TokenKind::Enum),
        "@inputs" => Some(TokenKind::Inputs),
        "@outputs" => Some(TokenKind::Outputs),
        "@locals" => Some(TokenKind::Locals),
        "@code" => Some(TokenKind::Code),
        _ => None,
    }
}

/// Unit words accepted after an integer to form a period literal.
pub fn is_period_unit(word: &str) -> bool {
    matches!(
        word,
        "year"
            | "years"
            | "month"
            | "months"
            | "day"
            | "days"
            | "hour"
            | "hours"
            | "minute"
            | "minutes"
            | "second"
            | "seconds"
    )
}

/// Currency symbols that may prefix a money literal. Sorted by codepoint.
pub const CURRENCY_SYMBOLS: &[char] = &[
    '$', 'C', 'R', 'p', '\u{00A2}', '\u{00A3}', '\u{00A4}', '\u{00A5}',
    '\u{058F}', '\u{060B}', '\u{09F2}', '\u{09F3}', '\u{09FB}', '\u{0AF1}', '\u{0BF9}', '\u{0E3F}',
    '\u{17DB}', '\u{20A0}', '\u{20A1}', '\u{20A2}', '\u{20A3}', '\u{20A4}', '\u{20A5}', '\u{20A6}',
    '\u{20A7}', '\u{20A8}', '\u{20A9}', '\u{20AA}', '\u{20AB}', '\u{20AC}', '\u{20AD}', '\u{20AE}',
    '\u{20AF}', '\u{20B0}', '\u{20B1}', '\u{20B2}', '\u{20B3}', '\u{20B4}', '\u{20B5}', '\u{20B6}',
    '\u{20B7}', '\u{20B8}', '\u{20B9}', '\u{20BA}', '\u{20BB}', '\u{20BC}', '\u{20BD}', '\u{20BE}',
    '\u{20BF}', '\u{20C0}', '\u{5143}', '\u{5186}', '\u{5706}', '\u{5713}', '\u{FDFC}', '\u{FF04}',
    '\u{FFE0}', '\u{FFE1}', '\u{FFE5}', '\u{FFE6}',
];

pub fn is_currency_symbol(ch: char) -> bool {
    CURRENCY_SYMBOLS.binary_search(&ch).is_ok()
}
