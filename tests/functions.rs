// Integration tests for built-in functions, expressions and diagnostics.

use pretty_assertions::assert_eq;

use layout_lang::{
    ArrayDecl, ArraySize, AstNode, BuiltinType, Endianness, Evaluator, Expr, LayoutValue, Literal,
    LogLevel, Operator, SliceSource, TypeExpr, VarDecl,
};

fn lit(v: u128) -> Expr {
    Expr::Literal(Literal::Unsigned(v))
}

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.into(),
        args,
    }
}

fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn var(name: &str, ty: BuiltinType) -> AstNode {
    AstNode::Variable(VarDecl {
        name: name.into(),
        ty: TypeExpr::Builtin(ty),
        placement: None,
    })
}

/// Array sized by an expression; handy for observing computed values.
fn sized_array(name: &str, count: Expr) -> AstNode {
    AstNode::Array(ArrayDecl {
        name: name.into(),
        ty: TypeExpr::Builtin(BuiltinType::U8),
        size: ArraySize::Fixed(count),
        placement: None,
    })
}

#[test]
fn test_find_sequence_returns_first_match_offset() {
    // u8 data[findSequence(0x50, 0x4E)];
    let ast = vec![sized_array(
        "prefix",
        call("findSequence", vec![lit(0x50), lit(0x4E)]),
    )];
    let data = [0x89u8, 0x50, 0x4E, 0x47, 0x50, 0x4E];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();
    // First occurrence is at offset 1
    assert_eq!(nodes[0].children.len(), 1);
}

#[test]
fn test_find_sequence_miss_is_minus_one_not_an_error() {
    // assert(findSequence(0xEE) == 0 - 1, "sentinel expected");
    let sentinel = binary(
        Operator::Sub,
        lit(0),
        lit(1),
    );
    let ast = vec![AstNode::ExprStmt(call(
        "assert",
        vec![
            binary(
                Operator::Eq,
                call("findSequence", vec![lit(0xEE)]),
                sentinel,
            ),
            Expr::StringLiteral("sentinel expected".into()),
        ],
    ))];
    let data = [0x01u8, 0x02, 0x03];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_some());
}

#[test]
fn test_read_unsigned_at_explicit_address_with_endianness() {
    // u8 pad[readUnsigned(2, 2, 1)]; big-endian read of [0x00, 0x03] = 3
    let ast = vec![sized_array(
        "pad",
        call("readUnsigned", vec![lit(2), lit(2), lit(1)]),
    )];
    let data = [0xFFu8, 0xFF, 0x00, 0x03, 0xAA, 0xBB, 0xCC];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();
    assert_eq!(nodes[0].children.len(), 3);
    // The out-of-band read did not move the cursor
    assert_eq!(nodes[0].offset, 0);
}

#[test]
fn test_read_signed_sign_extends() {
    // assert(readSigned(0, 1) == 0 - 1, "expected -1");
    let ast = vec![AstNode::ExprStmt(call(
        "assert",
        vec![
            binary(
                Operator::Eq,
                call("readSigned", vec![lit(0), lit(1)]),
                binary(Operator::Sub, lit(0), lit(1)),
            ),
            Expr::StringLiteral("expected -1".into()),
        ],
    ))];
    let data = [0xFFu8];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_some());
}

#[test]
fn test_read_with_unsupported_size_fails() {
    let ast = vec![AstNode::ExprStmt(call(
        "readUnsigned",
        vec![lit(0), lit(3)],
    ))];
    let data = [0u8; 8];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());
    assert!(eval.console().to_string().contains("invalid size"));
}

#[test]
fn test_arity_mismatch_is_reported() {
    let ast = vec![AstNode::ExprStmt(call("readUnsigned", vec![lit(0)]))];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());
    assert!(eval
        .console()
        .to_string()
        .contains("'readUnsigned' expects at least 2 argument(s), got 1"));
}

#[test]
fn test_undefined_function_is_reported() {
    let ast = vec![AstNode::ExprStmt(call("frobnicate", vec![lit(1)]))];
    let data = [0u8];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());
    assert!(eval
        .console()
        .to_string()
        .contains("undefined function 'frobnicate'"));
}

#[test]
fn test_failed_assert_aborts_but_keeps_earlier_diagnostics() {
    // u8 magic; print("checking"); assert(magic == 0x7F, "bad magic"); u8 rest;
    let ast = vec![
        var("magic", BuiltinType::U8),
        AstNode::ExprStmt(call(
            "print",
            vec![Expr::StringLiteral("checking".into())],
        )),
        AstNode::ExprStmt(call(
            "assert",
            vec![
                binary(Operator::Eq, Expr::RValue("magic".into()), lit(0x7F)),
                Expr::StringLiteral("bad magic".into()),
            ],
        )),
        var("rest", BuiltinType::U8),
    ];
    let data = [0x00u8, 0x01];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());

    let log = eval.console();
    assert_eq!(log.count(LogLevel::Info), 1);
    assert_eq!(log.count(LogLevel::Error), 1);
    let text = log.to_string();
    assert!(text.contains("[i] checking"));
    assert!(text.contains("assertion failed: bad magic"));
}

#[test]
fn test_passing_assert_is_silent() {
    let ast = vec![
        var("magic", BuiltinType::U8),
        AstNode::ExprStmt(call(
            "assert",
            vec![
                binary(Operator::Eq, Expr::RValue("magic".into()), lit(0x7F)),
                Expr::StringLiteral("bad magic".into()),
            ],
        )),
    ];
    let data = [0x7Fu8];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_some());
    assert_eq!(eval.console().count(LogLevel::Error), 0);
    assert_eq!(eval.console().count(LogLevel::Warning), 0);
}

#[test]
fn test_failed_warn_assert_logs_and_continues() {
    let ast = vec![
        var("magic", BuiltinType::U8),
        AstNode::ExprStmt(call(
            "warnAssert",
            vec![
                binary(Operator::Eq, Expr::RValue("magic".into()), lit(0x7F)),
                Expr::StringLiteral("unexpected magic".into()),
            ],
        )),
        var("rest", BuiltinType::U8),
    ];
    let data = [0x00u8, 0x42];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();

    // Both declarations evaluated despite the failed soft assertion
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].value, LayoutValue::Unsigned(0x42));
    assert_eq!(eval.console().count(LogLevel::Warning), 1);
    assert!(eval
        .console()
        .to_string()
        .contains("[*] assertion failed: unexpected magic"));
}

#[test]
fn test_print_joins_arguments_into_one_info_entry() {
    let ast = vec![
        var("version", BuiltinType::U8),
        AstNode::ExprStmt(call(
            "print",
            vec![
                Expr::StringLiteral("version:".into()),
                Expr::RValue("version".into()),
            ],
        )),
    ];
    let data = [0x03u8];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_some());
    assert!(eval.console().to_string().contains("[i] version: 3"));
}

#[test]
fn test_print_result_is_not_a_value() {
    // u8 pad[print("hi")]; -- print has no return value
    let ast = vec![sized_array(
        "pad",
        call("print", vec![Expr::StringLiteral("hi".into())]),
    )];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());
    assert!(eval
        .console()
        .to_string()
        .contains("does not return a value"));
}

#[test]
fn test_division_by_zero_is_an_error() {
    let ast = vec![sized_array("x", binary(Operator::Div, lit(4), lit(0)))];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());
    assert!(eval.console().to_string().contains("division by zero"));
}

#[test]
fn test_ternary_evaluates_only_the_taken_branch() {
    // x[1 != 0 ? 2 : 1 / 0] -- untaken branch would divide by zero
    let cond = binary(Operator::Ne, lit(1), lit(0));
    let ast = vec![sized_array(
        "x",
        Expr::Ternary {
            cond: Box::new(cond),
            then_expr: Box::new(lit(2)),
            else_expr: Box::new(binary(Operator::Div, lit(1), lit(0))),
        },
    )];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();
    assert_eq!(nodes[0].children.len(), 2);
}

#[test]
fn test_untaken_ternary_branch_leaves_log_untouched() {
    // x[0 != 0 ? print("never") : 1]: the print call in the untaken branch
    // must not log (and its missing return value must not error)
    let ast = vec![sized_array(
        "x",
        Expr::Ternary {
            cond: Box::new(binary(Operator::Ne, lit(0), lit(0))),
            then_expr: Box::new(call("print", vec![Expr::StringLiteral("never".into())])),
            else_expr: Box::new(lit(1)),
        },
    )];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();
    assert_eq!(nodes[0].children.len(), 1);
    assert_eq!(eval.console().count(LogLevel::Info), 0);
}

#[test]
fn test_logical_operators_short_circuit() {
    // false && (1 / 0): rhs never evaluated
    let and_expr = binary(
        Operator::LogAnd,
        binary(Operator::Ne, lit(0), lit(0)),
        binary(Operator::Div, lit(1), lit(0)),
    );
    // (true || err) selects 1 element via ternary
    let or_expr = binary(
        Operator::LogOr,
        binary(Operator::Eq, lit(1), lit(1)),
        binary(Operator::Div, lit(1), lit(0)),
    );
    let ast = vec![
        sized_array(
            "a",
            Expr::Ternary {
                cond: Box::new(and_expr),
                then_expr: Box::new(lit(3)),
                else_expr: Box::new(lit(1)),
            },
        ),
        sized_array(
            "b",
            Expr::Ternary {
                cond: Box::new(or_expr),
                then_expr: Box::new(lit(2)),
                else_expr: Box::new(lit(3)),
            },
        ),
    ];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();
    assert_eq!(nodes[0].children.len(), 1);
    assert_eq!(nodes[1].children.len(), 2);
}

#[test]
fn test_arithmetic_with_member_references() {
    // u8 w; u8 h; u8 pixels[w * h + 1];
    let ast = vec![
        var("w", BuiltinType::U8),
        var("h", BuiltinType::U8),
        sized_array(
            "pixels",
            binary(
                Operator::Add,
                binary(
                    Operator::Mul,
                    Expr::RValue("w".into()),
                    Expr::RValue("h".into()),
                ),
                lit(1),
            ),
        ),
    ];
    let mut data = vec![2u8, 3];
    data.extend_from_slice(&[0u8; 7]);
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();
    assert_eq!(nodes[2].children.len(), 7);
}

#[test]
fn test_enum_scope_resolution_in_expressions() {
    use layout_lang::EnumDef;
    // enum Kind : u8 { A, B, C }; u8 pad[Kind::C];
    let ast = vec![
        AstNode::Enum(EnumDef {
            name: "Kind".into(),
            underlying: BuiltinType::U8,
            entries: vec![("A".into(), None), ("B".into(), None), ("C".into(), None)],
        }),
        sized_array(
            "pad",
            Expr::ScopeResolution {
                type_name: "Kind".into(),
                member: "C".into(),
            },
        ),
    ];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    let nodes = eval.evaluate(&ast).unwrap();
    assert_eq!(nodes[0].children.len(), 2);
}

#[test]
fn test_scope_resolution_on_missing_member_fails() {
    use layout_lang::EnumDef;
    let ast = vec![
        AstNode::Enum(EnumDef {
            name: "Kind".into(),
            underlying: BuiltinType::U8,
            entries: vec![("A".into(), None)],
        }),
        sized_array(
            "pad",
            Expr::ScopeResolution {
                type_name: "Kind".into(),
                member: "Missing".into(),
            },
        ),
    ];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());
    assert!(eval
        .console()
        .to_string()
        .contains("type 'Kind' has no member 'Missing'"));
}

#[test]
fn test_string_arguments_are_not_numbers() {
    let ast = vec![sized_array("x", Expr::StringLiteral("four".into()))];
    let data = [0u8; 4];
    let source = SliceSource::new(&data);
    let mut eval = Evaluator::new(&source, Endianness::Little);
    assert!(eval.evaluate(&ast).is_none());
}
