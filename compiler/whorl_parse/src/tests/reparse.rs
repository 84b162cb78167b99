//! Incremental reparsing.

use pretty_assertions::assert_eq;
use whorl_calc::sum_grammar;
use whorl_ir::{InputEdit, TextChange};
use whorl_tree::{Tree, MAX_CHUNKS};

use super::{apply, calc, parse_ok, reparse_matches, sum};

#[test]
fn operator_replacement_reuses_the_suffix() {
    let parser = sum();
    let prior = parse_ok(&parser, "1+2+3");
    let (new, edit) = apply("1+2+3", 1, 2, "-");
    assert_eq!(new, "1-2+3");

    let output = parser.reparse(&prior.tree, &edit, new.as_bytes()).unwrap();
    assert_eq!(output.tree, parse_ok(&parser, "1-2+3").tree);

    let root = output.tree.root_node();
    let inner = root.child_by_field_name("left").unwrap();
    assert_eq!(inner.child(1).unwrap().kind(), "-");

    // `1` and `-` are lexed again, then only END; the rest comes from the
    // prior tree.
    assert_eq!(output.stats.tokens_lexed, 3);
    assert_eq!(output.stats.nodes_reused, 2);
    assert_eq!(output.stats.bytes_reused, 2);
    assert_eq!(output.stats.nodes_created, 6);

    let old_root = prior.tree.root_node();
    assert_eq!(root.child(1).unwrap().id(), old_root.child(1).unwrap().id());
    assert_eq!(root.child(2).unwrap().id(), old_root.child(2).unwrap().id());
}

#[test]
fn prior_tree_is_unchanged_by_a_reparse() {
    let parser = sum();
    let prior = parse_ok(&parser, "1+2+3");
    let before = prior.tree.to_sexp();
    let (new, edit) = apply("1+2+3", 4, 5, "4-5");
    let output = parser.reparse(&prior.tree, &edit, new.as_bytes()).unwrap();
    drop(output);
    prior.tree.verify().unwrap();
    assert_eq!(prior.tree.to_sexp(), before);
    assert_eq!(prior.tree.text_len().bytes, 5);
}

#[test]
fn noop_edit_returns_the_prior_tree() {
    let parser = calc();
    let prior = parse_ok(&parser, "1;\n2;");
    let edit = InputEdit::from_change(TextChange::insert(2, 0), b"1;\n2;", b"1;\n2;");
    let output = parser.reparse(&prior.tree, &edit, b"1;\n2;").unwrap();
    assert!(Tree::ptr_eq(&output.tree, &prior.tree));
    assert_eq!(output.stats.tokens_lexed, 0);
    assert_eq!(output.stats.reuse_rate(), 100.0);
    assert_eq!(
        output.stats.nodes_reused,
        prior.tree.root_node().descendant_count() as usize
    );
}

#[test]
fn editing_one_statement_reuses_the_first() {
    let old = "a;\nb + 1;\nc;";
    let (incremental, fresh) = reparse_matches(&calc(), old, 7, 8, "22");
    assert!(incremental.stats.nodes_reused > 0);
    assert!(incremental.stats.subtrees_reused > 0);
    assert!(incremental.stats.tokens_lexed < fresh.stats.tokens_lexed);
}

#[test]
fn insertion_and_deletion() {
    let parser = calc();
    // Append a statement.
    reparse_matches(&parser, "1;\n2;", 5, 5, "\n3;");
    // Prepend one.
    reparse_matches(&parser, "1;\n2;", 0, 0, "0;\n");
    // Delete one.
    reparse_matches(&parser, "1;\n2;\n3;", 3, 6, "");
    // Delete everything.
    reparse_matches(&parser, "1;\n2;", 0, 5, "");
    // Fill an empty text.
    reparse_matches(&parser, "", 0, 0, "x * 2;");
}

#[test]
fn edits_that_merge_or_split_tokens() {
    let parser = calc();
    // `1 2` becomes the number `12`.
    reparse_matches(&parser, "1 2;", 1, 2, "");
    // `ab` splits into `a b`.
    reparse_matches(&parser, "ab;", 1, 1, " ");
    // An identifier becomes a raw string.
    reparse_matches(&parser, "r;\nx;", 1, 1, "\"q\"");
    // Commenting out the rest of a line.
    reparse_matches(&parser, "1 + 2;\n3;", 2, 2, "# ");
}

#[test]
fn edits_that_change_the_structure() {
    let parser = calc();
    reparse_matches(&parser, "1+2*3;", 1, 2, "*");
    reparse_matches(&parser, "1*2+3;", 0, 0, "(");
    reparse_matches(&parser, "(1*2+3;", 4, 4, ")");
    reparse_matches(&parser, "a;b;c;", 3, 4, "");
}

#[test]
fn edits_that_introduce_or_fix_errors() {
    let parser = calc();
    // Break a statement.
    let (output, _) = reparse_matches(&parser, "1;\n2;\n3;", 4, 5, "");
    assert!(output.tree.root_node().has_error());
    // Fix it again.
    let (output, _) = reparse_matches(&parser, "1;\n2\n3;", 4, 4, ";");
    assert!(!output.tree.root_node().has_error());
    // Errors far from the edit stay put.
    reparse_matches(&parser, ") 1;\n2;", 5, 6, "7");
    reparse_matches(&parser, "1 $ 2;\n3;", 7, 8, "4");
}

#[test]
fn reuse_beside_skipped_tokens_keeps_error_grouping() {
    let parser = calc();
    let (output, _) = reparse_matches(&parser, "1$)1", 3, 3, "1");
    let errors: Vec<_> = output
        .tree
        .preorder()
        .filter(|n| n.is_error() && n.child_count() > 0)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!((errors[0].start_byte(), errors[0].end_byte()), (1, 3));
    // Leading separators before the error.
    reparse_matches(&parser, " 1", 0, 0, " (");
    reparse_matches(&parser, "1 $ ) 2;", 7, 7, "3");
}

#[test]
fn edits_inside_comments_and_raw_strings() {
    let parser = calc();
    reparse_matches(&parser, "# note\n1;", 2, 6, "changed");
    reparse_matches(&parser, "r#\"a\"#;\n1;", 3, 4, "bb");
    // Breaking the closing delimiter turns the raw string back into an
    // identifier and an error.
    reparse_matches(&parser, "r#\"a\"#;\n1;", 5, 6, "");
}

#[test]
fn sum_edits() {
    let parser = sum();
    reparse_matches(&parser, "1+2+3", 4, 5, "30");
    reparse_matches(&parser, "1+2+3", 0, 1, "10");
    reparse_matches(&parser, "1+2+3", 3, 5, "");
    reparse_matches(&parser, "1+2", 3, 3, "+");
    reparse_matches(&parser, "1+", 2, 2, "2");
}

#[test]
fn reparse_change_measures_points() {
    let parser = calc();
    let prior = parse_ok(&parser, "1;\n2;");
    let output = parser
        .reparse_change(&prior.tree, TextChange::replace(3, 1, 2), b"1;\n2;", b"1;\n22;")
        .unwrap();
    assert_eq!(output.tree, parse_ok(&parser, "1;\n22;").tree);
}

#[test]
fn chains_of_reparses_stay_compact() {
    let parser = calc();
    let mut text = String::from("0;");
    let mut tree = parse_ok(&parser, &text).tree;
    for i in 1..40 {
        let start = text.len();
        let (new, edit) = apply(&text, start, start, &format!("\n{i};"));
        let output = parser.reparse(&tree, &edit, new.as_bytes()).unwrap();
        output.tree.verify().unwrap();
        assert!(output.tree.chunk_count() <= MAX_CHUNKS);
        assert_eq!(output.tree, parse_ok(&parser, &new).tree);
        text = new;
        tree = output.tree;
    }
}

#[test]
fn reparse_from_a_cached_tree() {
    let parser = sum();
    let prior = parse_ok(&parser, "1+2+3");
    let bytes = prior.tree.to_cache_bytes().unwrap();
    let loaded = Tree::from_cache_bytes(&bytes, sum_grammar()).unwrap();

    let (new, edit) = apply("1+2+3", 1, 2, "-");
    let output = parser.reparse(&loaded, &edit, new.as_bytes()).unwrap();
    assert_eq!(output.tree, parse_ok(&parser, &new).tree);
    assert_eq!(output.stats.nodes_reused, 2);
}

#[test]
fn glr_parser_still_reparses_correctly() {
    let parser = super::calc_glr();
    reparse_matches(&parser, "1+2*3;\n4;", 8, 8, "+5");
    reparse_matches(&parser, "1;\n2-3-4;", 0, 0, "0;");
}
