//! Query syntax and compile errors.

use pretty_assertions::assert_eq;
use whorl_calc::calc_grammar;

use super::{calc_error, calc_query};
use crate::{Query, QueryErrorKind};

#[test]
fn patterns_and_captures_are_numbered_in_order() {
    let query = calc_query("(number) @x (identifier) @x (expr) @y");
    assert_eq!(query.pattern_count(), 3);
    assert_eq!(query.capture_names(), ["x", "y"]);
    assert_eq!(query.capture_index_for_name("y"), Some(1));
    assert_eq!(query.capture_index_for_name("z"), None);
    assert_eq!(query.start_byte_for_pattern(1), Some(12));
    assert_eq!(query.start_byte_for_pattern(3), None);
}

#[test]
fn comments_and_whitespace_are_ignored() {
    let query = calc_query("; only a comment\n\n   ; another\n");
    assert_eq!(query.pattern_count(), 0);

    let query = calc_query(
        "; numbers\n(number) @n ; trailing\n\n(expr\n  left: (expr) ; lhs\n  right: (expr))",
    );
    assert_eq!(query.pattern_count(), 2);
}

#[test]
fn every_construct_compiles() {
    let source = r#"
        (program (statement)* @s)
        (expr left: (_) operator: _ @op right: (expr (number)?))
        (expr ((expr) "+")+ (expr))
        [(number) (identifier) (raw_string)] @leaf
        "*" @star
        (ERROR (ERROR)) @error
        (MISSING) @missing
        (MISSING ";")
        ((identifier) @id (#any-of? @id "a" "b"))
        ((expr (expr) @l (expr) @r) (#eq? @l @r) (#not-eq? @l "x"))
    "#;
    assert_eq!(calc_query(source).pattern_count(), 10);
}

#[test]
fn unknown_node_kinds() {
    let error = calc_error("(nonsense)");
    assert_eq!(error.kind, QueryErrorKind::NodeKind);
    assert_eq!(error.offset, 1);
    assert_eq!(
        error.to_string(),
        "unknown node kind at byte 1: unknown node kind `nonsense`"
    );

    let error = calc_error("(expr \"/\")");
    assert_eq!(error.kind, QueryErrorKind::NodeKind);
    assert_eq!(error.offset, 6);

    // `+` exists, but only as an anonymous node.
    assert_eq!(calc_error("(+)").kind, QueryErrorKind::Syntax);
    assert_eq!(calc_error("(MISSING bogus)").kind, QueryErrorKind::NodeKind);
}

#[test]
fn unknown_fields() {
    let error = calc_error("(expr lhs: (number))");
    assert_eq!(error.kind, QueryErrorKind::Field);
    assert_eq!(error.offset, 6);
}

#[test]
fn predicates_must_name_bound_captures() {
    let error = calc_error("((number) @n (#eq? @m \"1\"))");
    assert_eq!(error.kind, QueryErrorKind::Capture);
    assert_eq!(error.offset, 20);

    // Captures of other patterns do not count.
    let error = calc_error("(identifier) @m ((number) @n (#eq? @m \"1\"))");
    assert_eq!(error.kind, QueryErrorKind::Capture);
}

#[test]
fn malformed_predicates() {
    let error = calc_error("((number) @n (#match? @n \"1\"))");
    assert_eq!(error.kind, QueryErrorKind::Predicate);
    assert_eq!(error.offset, 14);

    for source in [
        "((number) @n (#eq? @n))",
        "((number) @n (#eq? @n \"1\" \"2\"))",
        "((number) @n (#eq? \"1\" @n))",
        "((number) @n (#any-of? @n))",
        "((number) @n (#any-of? @n @n))",
    ] {
        assert_eq!(calc_error(source).kind, QueryErrorKind::Predicate, "{source}");
    }
}

#[test]
fn syntax_errors_point_at_the_problem() {
    let cases: &[(&str, u32)] = &[
        ("(number", 7),
        ("(number)*", 0),
        ("number", 0),
        ("()", 0),
        ("\"+", 0),
        ("((number) (number))", 0),
        ("(expr ((number)?)*)", 17),
        ("(expr left: [(number) right: (identifier)])", 22),
        ("(number) @", 10),
        ("(expr ((number) (number)) @pair)", 26),
        ("left: (number)", 0),
        ("[]", 0),
        ("(expr \"\\q\")", 8),
    ];
    for &(source, offset) in cases {
        let error = Query::new(&calc_grammar(), source).unwrap_err();
        assert_eq!(error.kind, QueryErrorKind::Syntax, "{source}: {error}");
        assert_eq!(error.offset, offset, "{source}: {error}");
    }
}

#[test]
fn end_of_query_is_named_in_messages() {
    let error = calc_error("(expr (number)");
    assert!(error.message.contains("end of query"), "{}", error.message);
}
