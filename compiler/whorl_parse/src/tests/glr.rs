//! GLR forking and merging.

use pretty_assertions::assert_eq;

use super::{calc, calc_glr, parse_ok};

#[test]
fn unambiguous_input_never_forks() {
    let output = parse_ok(&calc_glr(), "1;\n(2);\nx * 3;");
    assert_eq!(output.stats.forks, 0);
    assert_eq!(output.stats.merges, 0);
    assert_eq!(output.tree, parse_ok(&calc(), "1;\n(2);\nx * 3;").tree);
}

#[test]
fn ambiguity_forks_and_merges() {
    let output = parse_ok(&calc_glr(), "1+2*3;");
    assert_eq!(output.stats.forks, 1);
    assert_eq!(output.stats.merges, 1);
    assert_eq!(output.stats.peak_versions, 2);
}

#[test]
fn earliest_version_wins_and_the_other_reading_is_kept() {
    let output = parse_ok(&calc_glr(), "1+2*3;");
    // Shifting is listed first in the cell, so the winner groups `2*3`.
    assert_eq!(
        output.tree.to_sexp(),
        "(program (program) (statement (expr left: (expr (number)) \
         right: (expr left: (expr (number)) right: (expr (number))))))"
    );

    let statement = output.tree.root_node().named_child(1).unwrap();
    let expr = statement.named_child(0).unwrap();
    let alternatives = expr.alternatives();
    assert_eq!(alternatives.len(), 1);
    assert_eq!(
        alternatives[0].to_sexp(),
        "(expr left: (expr left: (expr (number)) right: (expr (number))) right: (expr (number)))"
    );
    assert_eq!(alternatives[0].span(), expr.span());
}

#[test]
fn glr_can_disagree_with_precedence() {
    // Precedence makes `-` left associative; the first GLR version shifts.
    let glr = parse_ok(&calc_glr(), "1-2-3;");
    let resolved = parse_ok(&calc(), "1-2-3;");
    assert_ne!(glr.tree, resolved.tree);

    let expr = glr
        .tree
        .root_node()
        .named_child(1)
        .and_then(|s| s.named_child(0))
        .unwrap();
    let alternatives = expr.alternatives();
    assert_eq!(alternatives.len(), 1);
    assert_eq!(
        alternatives[0].to_sexp(),
        resolved
            .tree
            .root_node()
            .named_child(1)
            .and_then(|s| s.named_child(0))
            .unwrap()
            .to_sexp()
    );
}

#[test]
fn nodes_built_while_forked_are_fragile() {
    let output = parse_ok(&calc_glr(), "1+2*3;");
    let expr = output
        .tree
        .root_node()
        .named_child(1)
        .and_then(|s| s.named_child(0))
        .unwrap();
    assert!(expr.info().is_fragile());
    // The empty program was reduced before the fork.
    let empty = output.tree.root_node().named_child(0).unwrap();
    assert!(!empty.info().is_fragile());
}

#[test]
fn glr_parse_is_deterministic() {
    let text = "1+2*3-4;\na*b+c;";
    let first = parse_ok(&calc_glr(), text);
    let second = parse_ok(&calc_glr(), text);
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn long_ambiguous_chains_stay_under_the_version_cap() {
    let parser = calc_glr();
    for text in ["1+2*3-4*5+6;", "1+2+3+4+5+6+7;", "1*2-3*4-5*6-7*8-9;"] {
        let output = parse_ok(&parser, text);
        assert!(!output.tree.root_node().has_error(), "{text}");
        assert!(output.stats.peak_versions <= parser.options().max_versions);
        assert!(output.stats.forks > 0);
    }
}
