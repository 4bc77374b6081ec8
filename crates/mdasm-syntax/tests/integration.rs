//! Integration tests for mdasm_syntax.
//!
//! These tests exercise the public API end-to-end, verifying that source text
//! is turned into the expected per-line syntax trees and located errors.

use mdasm_syntax::{
    parse, parse_bytes, parse_line, AsmError, AstNode, BlockDelimiter, ErrorPolicy, FrontEnd,
    LexError, Literal, NumericKind, NumericValue, OperatorKind, ResourceLimits, SourceCache,
    Span, SyntaxError,
};

fn nodes(src: &str) -> Vec<String> {
    parse(src)
        .unwrap()
        .iter()
        .map(|s| s.node.to_string())
        .collect()
}

fn node(line: &str) -> AstNode {
    match parse_line(line) {
        Ok(Some(node)) => node,
        other => panic!("{line:?} did not reduce: {other:?}"),
    }
}

// ============================================================================
// One-Shot API
// ============================================================================

#[test]
fn one_shot_expression() {
    assert_eq!(nodes(" x = 1 + 2 * 3\n"), ["(x = (1 + (2 * 3)))"]);
}

#[test]
fn one_shot_program() {
    let src = "\
; constants
size = 16
start:
 move.l d0, d1
.loop: dbra d0, .loop
 dc.b 'hi', 0
 rts
";
    let statements = parse(src).unwrap();
    let lines: Vec<u32> = statements.iter().map(|s| s.line).collect();
    assert_eq!(lines, [2, 3, 4, 5, 6, 7]);
    assert_eq!(
        statements
            .iter()
            .map(|s| s.node.to_string())
            .collect::<Vec<_>>(),
        [
            "size: (_ = 16)",
            "start:",
            "move.l(d0, d1)",
            ".loop: dbra(d0, .loop)",
            "dc.b(\"hi\", 0)",
            "rts",
        ]
    );
    assert!(statements.iter().all(|s| s.file == "<input>"));
}

#[test]
fn one_shot_empty_input() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("\n\n   \n; nothing\n").unwrap().is_empty());
}

#[test]
fn parse_bytes_names_the_file() {
    let file = parse_bytes("boot.asm", b" nop\n").unwrap();
    assert_eq!(file.name, "boot.asm");
    assert_eq!(file.statements[0].to_string(), "boot.asm:1: nop");
}

#[test]
fn parse_line_single() {
    assert_eq!(parse_line("").unwrap(), None);
    assert_eq!(node(" a << 2").to_string(), "(a << 2)");
}

// ============================================================================
// Builder API
// ============================================================================

#[test]
fn builder_fail_fast() {
    let mut fe = FrontEnd::new();
    fe.error_policy(ErrorPolicy::FailFast);
    let err = fe.parse_str("f.asm", " a)\n b]\n").unwrap_err();
    assert_eq!(err.to_string(), "f.asm:1:3: unexpected closing parenthesis");
}

#[test]
fn builder_collect_reports_every_line() {
    let err = parse_bytes("m.asm", b" a)\n ok\n b]\n").unwrap_err();
    match &err {
        AsmError::Multiple { errors } => assert_eq!(errors.len(), 2),
        other => panic!("expected Multiple error, got: {other}"),
    }
    let text = err.to_string();
    assert!(text.contains("m.asm:1:3: unexpected closing parenthesis"));
    assert!(text.contains("m.asm:3:3: unexpected closing square bracket"));
}

#[test]
fn builder_limits() {
    let mut fe = FrontEnd::new();
    fe.limits(ResourceLimits {
        max_errors: 2,
        ..ResourceLimits::default()
    });
    let err = fe.parse_str("f.asm", " 1 2\n 3 4\n 5 6\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "resource limit exceeded: errors (limit: 2)"
    );
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn precedence_and_associativity() {
    assert_eq!(node(" 1 + 2 * 3").to_string(), "(1 + (2 * 3))");
    assert_eq!(node(" 10 - 4 - 3").to_string(), "((10 - 4) - 3)");
    assert_eq!(node(" (1 + 2) * 3").to_string(), "((1 + 2) * 3)");
    assert_eq!(node(" a | b & c").to_string(), "(a | (b & c))");
    assert_eq!(node(" a >= b != c").to_string(), "((a >= b) != c)");
}

#[test]
fn operator_tree_shape() {
    let expected = AstNode::binary(
        OperatorKind::Add,
        AstNode::text("a"),
        AstNode::binary(OperatorKind::Mul, AstNode::text("b"), AstNode::text("c")),
    );
    assert_eq!(node(" a + b * c"), expected);
}

#[test]
fn unary_operators() {
    assert_eq!(
        node(" -x"),
        AstNode::unary(OperatorKind::Neg, AstNode::text("x"))
    );
    assert_eq!(node(" ~x").to_string(), "(~x)");
    assert_eq!(node(" !x").to_string(), "(!x)");
    assert_eq!(node(" 1 * -2").to_string(), "(1 * (-2))");
}

#[test]
fn numbers_carry_value_and_kind() {
    match node(" $FF + 0") {
        AstNode::Operator {
            left: Some(left), ..
        } => match *left {
            AstNode::Literal(Literal::Number(n)) => {
                assert_eq!(n.text, "$FF");
                assert_eq!(n.value, NumericValue::Integer(255));
                assert_eq!(n.kind, NumericKind::U8);
            }
            other => panic!("expected number, got {other:?}"),
        },
        other => panic!("expected operator, got {other:?}"),
    }
    match node(" 1.5") {
        AstNode::Literal(Literal::Number(n)) => {
            assert_eq!(n.value, NumericValue::Float(1.5));
            assert_eq!(n.kind, NumericKind::Float);
        }
        other => panic!("expected float, got {other:?}"),
    }
}

#[test]
fn subscripts_and_fields() {
    assert_eq!(node(" table[i * 2]").to_string(), "table[(i * 2)]");
    assert_eq!(node(" x = obj.field").to_string(), "(x = obj.field)");
    assert_eq!(node(" x = val::b").to_string(), "(x = (val :: b))");
}

#[test]
fn strings_are_unescaped() {
    assert_eq!(node(r#" x = "a\"b""#).to_string(), r#"(x = "a\"b")"#);
    assert_eq!(
        node(r" x = 'tab\there'"),
        AstNode::binary(
            OperatorKind::Set,
            AstNode::text("x"),
            AstNode::string("tab\there")
        )
    );
}

#[test]
fn block_delimiters() {
    assert_eq!(node(" {"), AstNode::Block(BlockDelimiter::Start));
    assert_eq!(node(" }"), AstNode::Block(BlockDelimiter::End));
}

// ============================================================================
// Macro Calls
// ============================================================================

#[test]
fn parenthesised_call() {
    match node(" f(1, 2 + 3)") {
        AstNode::MacroCall {
            name,
            size_suffix,
            args,
        } => {
            assert_eq!(name, "f");
            assert_eq!(size_suffix, None);
            assert_eq!(args.len(), 2);
            assert_eq!(args[1].to_string(), "(2 + 3)");
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn bare_call_with_size_suffix() {
    match node(" move.w d0, (a1)") {
        AstNode::MacroCall {
            name,
            size_suffix,
            args,
        } => {
            assert_eq!(name, "move");
            assert_eq!(size_suffix.as_deref(), Some("w"));
            assert_eq!(args, [AstNode::text("d0"), AstNode::text("a1")]);
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn nested_calls() {
    assert_eq!(
        node(" x = max(min(a, b), 0)").to_string(),
        "(x = max(min(a, b), 0))"
    );
}

// ============================================================================
// Labels
// ============================================================================

#[test]
fn label_forms() {
    assert_eq!(node("main:").to_string(), "main:");
    assert_eq!(node("main: rts").to_string(), "main: rts");
    assert_eq!(node("main rts").to_string(), "main: rts");
    assert_eq!(node("count: = 3").to_string(), "count: (_ = 3)");
}

#[test]
fn label_node_shape() {
    match node("entry: nop") {
        AstNode::LabelCreate { name, target } => {
            assert_eq!(*name, AstNode::text("entry"));
            assert_eq!(target.as_deref(), Some(&AstNode::text("nop")));
        }
        other => panic!("expected label, got {other:?}"),
    }
}

// ============================================================================
// Errors
// ============================================================================

fn line_err(line: &str) -> SyntaxError {
    match parse_line(line) {
        Err(mdasm_syntax::LineError::Syntax(e)) => e,
        other => panic!("expected syntax error for {line:?}, got {other:?}"),
    }
}

#[test]
fn label_errors() {
    assert_eq!(line_err(": x"), SyntaxError::EmptyLabel { offset: 0 });
    assert_eq!(line_err("a: b: c"), SyntaxError::MultipleLabels { offset: 4 });
}

#[test]
fn delimiter_errors() {
    assert_eq!(line_err(" a)"), SyntaxError::UnmatchedCloseParen { offset: 2 });
    assert_eq!(line_err(" (a]"), SyntaxError::UnmatchedCloseBracket { offset: 3 });
    assert_eq!(
        line_err(" (a"),
        SyntaxError::UnclosedDelimiter {
            delimiter: '(',
            offset: 1
        }
    );
}

#[test]
fn unresolved_and_argument_errors() {
    assert_eq!(line_err(" 1 +"), SyntaxError::UnresolvedExpression);
    assert!(matches!(
        line_err(" f(1 2)"),
        SyntaxError::InvalidMacroArgument { .. }
    ));
    assert!(matches!(
        line_err(" x = 1, 2"),
        SyntaxError::InvalidMacroArgument { .. }
    ));
}

#[test]
fn lex_errors_are_located() {
    let err = parse_bytes("a.asm", b" nop\n x = 1 ` 2\n").unwrap_err();
    assert_eq!(
        err,
        AsmError::Lex {
            error: LexError::UnrecognizedCharacter { ch: '`', offset: 7 },
            file: "a.asm".into(),
            span: Span::at(2, 7, 1),
        }
    );
}

#[test]
fn unterminated_string_reports_opening_line() {
    let err = parse_bytes("s.asm", b" nop\n dc.b 'abc\n\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "s.asm:2: string starting at line 2 not terminated"
    );
}

#[test]
fn multiline_string_keeps_first_line() {
    let statements = parse(" dc.b 'one\ntwo'\n nop\n").unwrap();
    assert_eq!(statements[0].line, 1);
    assert_eq!(statements[0].node.to_string(), "dc.b(\"onetwo\")");
    assert_eq!(statements[1].line, 3);
}

// ============================================================================
// Source Cache
// ============================================================================

#[test]
fn cache_parses_once() {
    let mut cache = SourceCache::new();
    let mut loads = 0;
    for _ in 0..2 {
        cache
            .get_or_create_with("macros.i", |_| {
                loads += 1;
                Ok::<_, AsmError>(" x = 1\n y = 2\n")
            })
            .unwrap();
    }
    assert_eq!(loads, 1);
    assert_eq!(cache.get("macros.i").map(|f| f.len()), Some(2));
}
