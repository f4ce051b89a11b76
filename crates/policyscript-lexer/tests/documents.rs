//! End-to-end scanning of complete PolicyScript documents.

use policyscript_lexer::{LexErrorKind, Position, Scanner, ScannerMode, Token, TokenKind};
use tracing_subscriber::EnvFilter;

use TokenKind::*;

/// Print scanner logs when `RUST_LOG` is set, e.g. `RUST_LOG=policyscript=trace`.
fn init_test_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scan(source: &str) -> Vec<Token> {
    init_test_logger();
    let (tokens, errors) = Scanner::tokenize(source);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    tokens
}

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

const TAX_POLICY: &str = "\
_ Income tax

Residents pay a flat rate on income
above the threshold.

@meta {
  title : `Income tax`
  effective : |2024/07/01|
}

# Inputs supplied by the caller
@inputs {
  income : $0
}

@code {
  rate : 12.5%
  if income > $18_200 {
    set tax to (income - $18_200) * rate
  } else {
    tax : $0
  }
  grace : 30 days
}
";

#[test]
fn test_tax_policy_outline() {
    let tokens = scan(TAX_POLICY);
    let outline: Vec<_> = tokens
        .iter()
        .filter(|t| matches!(t.kind, Heading | Paragraph | Comment) || t.kind.is_block_keyword())
        .map(|t| t.kind)
        .collect();
    assert_eq!(outline, vec![Heading, Paragraph, Meta, Comment, Inputs, Code]);
    assert_eq!(tokens[1].literal, "Residents pay a flat rate on income\nabove the threshold.");
    assert_eq!(tokens.last().map(|t| t.kind), Some(Eof));
}

#[test]
fn test_tax_policy_code_block() {
    let tokens = scan(TAX_POLICY);
    let start = tokens.iter().position(|t| t.kind == Code).unwrap();
    let code: Vec<_> = kinds(&tokens[start..]);
    assert_eq!(
        code,
        vec![
            Code, LBrace, //
            Ident, Colon, Percent, Semicolon, //
            If, Ident, Gt, Money, LBrace, //
            Set, Ident, To, LParen, Ident, Minus, Money, RParen, Mult, Ident, Semicolon, //
            RBrace, Else, LBrace, //
            Ident, Colon, Money, Semicolon, //
            RBrace, //
            Ident, Colon, Period, Semicolon, //
            RBrace, Eof,
        ]
    );
    let threshold = &tokens[start + 9];
    assert_eq!(threshold.literal, "$18200");
}

#[test]
fn test_meta_block_literals() {
    let tokens = scan(TAX_POLICY);
    let text = tokens.iter().find(|t| t.kind == Text).unwrap();
    assert_eq!(text.literal, "Income tax");
    let date = tokens.iter().find(|t| t.kind == Date).unwrap();
    assert_eq!(date.literal, "2024/07/01");
    assert_eq!(date.range.start, Position::new(8, 14, 117));
}

#[test]
fn test_define_block_with_type_name() {
    let tokens = scan("@define Bracket {\n  lower : $0\n  upper : $18_200\n}\n");
    assert_eq!(kinds(&tokens[..4]), vec![Define, Ident, LBrace, Ident]);
    assert_eq!(tokens[1].literal, "Bracket");
}

#[test]
fn test_code_snippet_mode() {
    init_test_logger();
    let mut scanner = Scanner::with_mode("a : 1\nb : a * 2\n", ScannerMode::Block);
    let tokens = scanner.scan();
    assert_eq!(
        kinds(&tokens),
        vec![Ident, Colon, Integer, Semicolon, Ident, Colon, Ident, Mult, Integer, Eof]
    );
    assert_eq!(scanner.error_count(), 0);
    assert_eq!(scanner.mode(), ScannerMode::Block);
}

#[test]
fn test_errors_do_not_stop_scanning() {
    init_test_logger();
    let mut messages = Vec::new();
    let tokens = {
        let mut scanner = Scanner::new("@code {\n  a : ~\n  b : `open\n")
            .with_error_handler(|message, position| messages.push(format!("{position} {message}")));
        scanner.scan()
    };
    assert_eq!(tokens.last().map(|t| t.kind), Some(Eof));
    assert_eq!(
        messages,
        vec![
            "2:6 illegal character `~`".to_string(),
            "3:6 unterminated text, missing closing backtick".to_string(),
            "1:0 unterminated @code block, missing closing `}`".to_string(),
        ]
    );
}

#[test]
fn test_tokenize_collects_error_kinds() {
    let (_, errors) = Scanner::tokenize("@code {\n  d : |2024/01\n");
    let error_kinds: Vec<_> = errors.into_iter().map(|e| e.kind).collect();
    assert_eq!(
        error_kinds,
        vec![
            LexErrorKind::UnterminatedTemporalLiteral(Date),
            LexErrorKind::UnterminatedBlock(Code),
        ]
    );
}
