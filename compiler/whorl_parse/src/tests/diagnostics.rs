//! Syntax issues read back from trees.

use pretty_assertions::assert_eq;
use whorl_ir::{Point, Span};

use super::{calc, parse_ok, sum};
use crate::{render_issue, syntax_issues, IssueKind, SyntaxIssue};

#[test]
fn clean_tree_has_no_issues() {
    let output = parse_ok(&calc(), "1 + 2;\n# ok\n");
    assert!(syntax_issues(&output.tree).is_empty());
}

#[test]
fn missing_and_lexical_issues_in_document_order() {
    let text = "1+x";
    let output = parse_ok(&sum(), text);
    let issues = syntax_issues(&output.tree);
    assert_eq!(
        issues,
        vec![
            SyntaxIssue {
                kind: IssueKind::LexError,
                span: Span::new(2, 3),
                start: Point::new(0, 2),
            },
            SyntaxIssue {
                kind: IssueKind::Missing {
                    expected: "number".to_owned()
                },
                span: Span::new(3, 3),
                start: Point::new(0, 3),
            },
        ]
    );
    let messages: Vec<_> = issues.iter().map(|i| i.message(text.as_bytes())).collect();
    assert_eq!(messages, ["unexpected character `x`", "missing number"]);
}

#[test]
fn missing_anonymous_token_is_quoted() {
    let text = "1 2";
    let output = parse_ok(&sum(), text);
    let issues = syntax_issues(&output.tree);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message(text.as_bytes()), "missing `+`");
}

#[test]
fn skipped_input_is_one_issue() {
    let text = ") $ ) 1;";
    let output = parse_ok(&calc(), text);
    let issues = syntax_issues(&output.tree);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::Unexpected);
    assert_eq!(issues[0].span, Span::new(0, 5));
    assert_eq!(issues[0].message(text.as_bytes()), "unexpected `) $ )`");
}

#[test]
fn render_points_at_the_issue() {
    let text = "1;\n1+x";
    let output = parse_ok(&calc(), text);
    let issues = syntax_issues(&output.tree);
    let missing = issues
        .iter()
        .find(|i| matches!(i.kind, IssueKind::Missing { .. }))
        .unwrap();
    assert_eq!(
        render_issue(missing, "input.calc", text.as_bytes()),
        "error: missing `;`\n --> input.calc:2:4\n  |\n2 | 1+x\n  |    ^"
    );
}

#[test]
fn render_underlines_the_whole_span_on_its_line() {
    let text = ")) 1;";
    let output = parse_ok(&calc(), text);
    let issues = syntax_issues(&output.tree);
    assert_eq!(issues.len(), 1);
    assert_eq!(
        render_issue(&issues[0], "a.calc", text.as_bytes()),
        "error: unexpected `))`\n --> a.calc:1:1\n  |\n1 | )) 1;\n  | ^^"
    );
}
