//! Cursor settings and iteration.

use pretty_assertions::assert_eq;
use whorl_calc::sum_grammar;

use super::{calc_query, calc_tree, sum_tree};
use crate::{matches, Query, QueryCursor, QueryErrorKind, QueryMatches};

fn numbers(matches: QueryMatches<'_, '_, '_>, text: &str) -> Vec<String> {
    matches
        .flat_map(|m| m.captures)
        .map(|c| c.node.utf8_text(text.as_bytes()).unwrap().to_owned())
        .collect()
}

#[test]
fn byte_range_limits_matches() {
    let text = "1;\n2;\n3;";
    let tree = calc_tree(text);
    let query = calc_query("(statement) @s");
    let mut cursor = QueryCursor::new();
    cursor.set_byte_range(3..5);
    assert_eq!(cursor.byte_range(), 3..5);
    let found = numbers(cursor.matches(&query, &tree, text.as_bytes()).unwrap(), text);
    assert_eq!(found, ["2;"]);

    // Statements overlapping the range at either end count.
    cursor.set_byte_range(1..7);
    let found = numbers(cursor.matches(&query, &tree, text.as_bytes()).unwrap(), text);
    assert_eq!(found, ["1;", "2;", "3;"]);

    // Touching is not overlapping.
    cursor.set_byte_range(2..3);
    let found = numbers(cursor.matches(&query, &tree, text.as_bytes()).unwrap(), text);
    assert!(found.is_empty());
}

#[test]
fn empty_range_matches_nothing() {
    let text = "1;";
    let tree = calc_tree(text);
    let query = calc_query("_ @any");
    let mut cursor = QueryCursor::new();
    cursor.set_byte_range(0..0);
    assert_eq!(cursor.matches(&query, &tree, text.as_bytes()).unwrap().count(), 0);
}

#[test]
fn zero_width_nodes_inside_the_range_match() {
    let text = "1+";
    let tree = sum_tree(text);
    let query = Query::new(&sum_grammar(), "(MISSING) @m").unwrap();
    let mut cursor = QueryCursor::new();
    cursor.set_byte_range(2..3);
    assert_eq!(cursor.matches(&query, &tree, text.as_bytes()).unwrap().count(), 1);
    cursor.set_byte_range(0..2);
    assert_eq!(cursor.matches(&query, &tree, text.as_bytes()).unwrap().count(), 0);
}

#[test]
fn resuming_from_an_offset() {
    let text = "1;\n2;\n3;";
    let tree = calc_tree(text);
    let query = calc_query("(number) @n");
    let cursor = QueryCursor::new();
    let found = numbers(cursor.matches_from(&query, &tree, text.as_bytes(), 3).unwrap(), text);
    assert_eq!(found, ["2", "3"]);
    let found = numbers(cursor.matches_from(&query, &tree, text.as_bytes(), 8).unwrap(), text);
    assert!(found.is_empty());
}

#[test]
fn resume_offset_skips_nothing() {
    let text = "1;\n2;\n3;";
    let tree = calc_tree(text);
    let query = calc_query("(number) @n");
    let cursor = QueryCursor::new();

    let mut iter = cursor.matches(&query, &tree, text.as_bytes()).unwrap();
    assert_eq!(iter.resume_offset(), 0);
    iter.next().unwrap();
    let second = iter.next().unwrap();
    let offset = iter.resume_offset();
    assert_eq!(offset, second.captures[0].node.start_byte());

    let resumed = numbers(cursor.matches_from(&query, &tree, text.as_bytes(), offset).unwrap(), text);
    assert_eq!(resumed, ["2", "3"]);

    assert_eq!(iter.by_ref().count(), 1);
    assert_eq!(iter.resume_offset(), u32::MAX);
    assert!(iter.next().is_none());
}

#[test]
fn clones_continue_independently() {
    let text = "1 + 2;\n3;";
    let tree = calc_tree(text);
    let query = calc_query("(number) @n");
    let mut iter = query.matches(&tree, text.as_bytes()).unwrap();
    iter.next().unwrap();
    let snapshot = iter.clone();
    assert_eq!(numbers(iter, text), ["2", "3"]);
    assert_eq!(numbers(snapshot, text), ["2", "3"]);
}

#[test]
fn iteration_is_repeatable() {
    let text = "a + 1;\n(b);";
    let tree = calc_tree(text);
    let query = calc_query("(expr) @e (identifier) @i");
    let first: Vec<_> = matches(&tree, &query, text.as_bytes()).unwrap().collect();
    let second: Vec<_> = matches(&tree, &query, text.as_bytes()).unwrap().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
}

#[test]
fn match_limit_cuts_off_expensive_attempts() {
    let text = "1 + 2;";
    let tree = calc_tree(text);
    let mut cursor = QueryCursor::new();
    cursor.set_match_limit(1);
    assert_eq!(cursor.match_limit(), 1);

    // A childless pattern needs a single step.
    let query = calc_query("(number) @n");
    let mut iter = cursor.matches(&query, &tree, text.as_bytes()).unwrap();
    assert_eq!(iter.by_ref().count(), 2);
    assert!(!iter.did_exceed_match_limit());

    let query = calc_query("(expr (number) @n)");
    let mut iter = cursor.matches(&query, &tree, text.as_bytes()).unwrap();
    assert_eq!(iter.by_ref().count(), 0);
    assert!(iter.did_exceed_match_limit());

    let mut iter = QueryCursor::new()
        .matches(&query, &tree, text.as_bytes())
        .unwrap();
    assert_eq!(iter.by_ref().count(), 2);
    assert!(!iter.did_exceed_match_limit());
}

#[test]
fn trees_from_other_grammars_are_rejected() {
    let tree = calc_tree("1;");
    let query = Query::new(&sum_grammar(), "(number) @n").unwrap();
    let error = query.matches(&tree, b"1;").err().unwrap();
    assert_eq!(error.kind, QueryErrorKind::GrammarMismatch);
    assert!(error.message.contains("sum"), "{}", error.message);
}

#[test]
fn a_query_outlives_its_trees() {
    let query = calc_query("(identifier) @id");
    for text in ["a;", "b + c;", ""] {
        let tree = calc_tree(text);
        let count = query.matches(&tree, text.as_bytes()).unwrap().count();
        assert_eq!(count, text.chars().filter(char::is_ascii_alphabetic).count());
    }
}
