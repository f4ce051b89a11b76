//! End-to-end parsing of complete PolicyScript documents.

use policyscript_parser::{
    parse, parse_code, BlockKind, Expr, InfixOp, ParseErrorKind, Program, Stmt,
};
use pretty_assertions::assert_eq;

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

fn parse_ok(source: &str) -> Program {
    let output = parse(source);
    assert!(output.is_ok(), "errors: {:?} {:?}", output.lex_errors, output.errors);
    output.program
}

fn block(program: &Program, kind: BlockKind) -> &[Stmt] {
    program
        .statements
        .iter()
        .find_map(|stmt| match stmt {
            Stmt::Block(block) if block.kind == kind => Some(block.statements.as_slice()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no {kind} block"))
}

#[test]
fn test_document_outline() {
    let program = parse_ok(TAX_POLICY);
    let outline: Vec<String> = program
        .statements
        .iter()
        .map(|stmt| match stmt {
            Stmt::Heading { value, .. } => format!("heading {value}"),
            Stmt::Paragraph { .. } => "paragraph".to_string(),
            Stmt::Comment { .. } => "comment".to_string(),
            Stmt::Block(block) => format!("block {}", block.kind),
            other => panic!("unexpected top-level statement {other:?}"),
        })
        .collect();
    assert_eq!(
        outline,
        vec![
            "heading Income tax",
            "paragraph",
            "block @meta",
            "comment",
            "block @inputs",
            "block @code",
        ]
    );
}

#[test]
fn test_meta_declarations() {
    let program = parse_ok(TAX_POLICY);
    let meta = block(&program, BlockKind::Meta);
    assert_eq!(meta.len(), 2);
    let Stmt::Expression(Expr::Declare { ident, value }) = &meta[1] else {
        panic!("Expected declaration, got {:?}", meta[1]);
    };
    assert_eq!(ident.name, "effective");
    assert!(matches!(
        **value,
        Expr::Date {
            year: 2024,
            month: 7,
            day: 1,
            ..
        }
    ));
}

#[test]
fn test_code_block_statements() {
    let program = parse_ok(TAX_POLICY);
    let code = block(&program, BlockKind::Code);
    assert_eq!(code.len(), 4);

    let Stmt::If {
        condition,
        consequence,
        ..
    } = &code[1]
    else {
        panic!("Expected If, got {:?}", code[1]);
    };
    assert!(matches!(condition, Expr::Infix { op: InfixOp::Gt, .. }));

    let Stmt::Expression(Expr::Set { ident, value, .. }) = &consequence.statements[0] else {
        panic!("Expected set");
    };
    assert_eq!(ident.name, "tax");
    assert!(matches!(**value, Expr::Infix { op: InfixOp::Mul, .. }));

    assert!(matches!(&code[2], Stmt::Else { condition: None, .. }));
    assert!(matches!(
        &code[3],
        Stmt::Expression(Expr::Declare { value, .. })
            if matches!(**value, Expr::Period { value: 30, ref unit, .. } if unit == "days")
    ));
}

#[test]
fn test_program_range_covers_document() {
    let program = parse_ok(TAX_POLICY);
    let range = program.range();
    assert_eq!(range.start.offset, 0);
    assert_eq!(range.end.line, 24);
    assert_eq!(range.end.column, 1);
}

#[test]
fn test_errors_are_collected_not_fatal() {
    let output = parse_code("a : 1\n5 : 2\nb : (3\nc : 4");
    let kinds: Vec<_> = output.errors.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds[0], ParseErrorKind::InvalidDeclareTarget);
    assert!(matches!(kinds[1], ParseErrorKind::UnexpectedToken { .. }));
    assert_eq!(output.program.statements.len(), 2);
}

#[test]
fn test_unterminated_block_reports_from_both_stages() {
    let output = parse("@code {\n  a : 1\n");
    assert_eq!(output.lex_errors.len(), 1);
    assert_eq!(output.errors.len(), 1);
    assert_eq!(
        output.errors[0].to_string(),
        "3:0-3:0: expected `}`, found `EOF`"
    );
    let Stmt::Block(block) = &output.program.statements[0] else {
        panic!("Expected Block");
    };
    assert_eq!(block.close, None);
    assert_eq!(block.statements.len(), 1);
}

#[test]
fn test_bad_condition_stays_inside_its_block() {
    let output = parse("@code {\n  if * {\n    a : 1\n  }\n  b : 2\n}\n\nAfter");
    assert_eq!(
        output
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["2:5-2:6: no prefix parse function for `*`"]
    );
    assert_eq!(output.program.statements.len(), 2);
    let code = block(&output.program, BlockKind::Code);
    assert_eq!(code.len(), 1);
    let Stmt::Expression(Expr::Declare { ident, .. }) = &code[0] else {
        panic!("Expected declaration, got {:?}", code[0]);
    };
    assert_eq!(ident.name, "b");
    assert!(matches!(
        output.program.statements[1],
        Stmt::Paragraph { ref value, .. } if value == "After"
    ));
}

#[test]
fn test_bad_header_in_standalone_code() {
    for source in [
        "if * {\n  a : 1\n}\nb : 2",
        "for x in * {\n  a : x\n}\nb : 2",
    ] {
        let output = parse_code(source);
        assert_eq!(output.errors.len(), 1, "{source:?}: {:?}", output.errors);
        assert_eq!(output.program.statements.len(), 1);
    }
}
