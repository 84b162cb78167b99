#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use whorl_calc::{calc_grammar, sum_grammar};
use whorl_ir::TextChange;

use super::*;
use crate::Parser;

fn sum_tree(text: &str) -> Tree {
    Parser::new(sum_grammar()).parse(text.as_bytes()).unwrap().tree
}

fn calc_tree(text: &str) -> Tree {
    Parser::new(calc_grammar()).parse(text.as_bytes()).unwrap().tree
}

fn marker(change: TextChange) -> ChangeMarker {
    ChangeMarker::from_change(&change)
}

fn lens(chain: &ReusableChain) -> Vec<u32> {
    chain.outer.iter().map(|c| c.info.len.bytes).collect()
}

#[test]
fn chain_lists_outer_nodes_outermost_first() {
    // "1+2+3": ((1 + 2) + 3)
    let tree = sum_tree("1+2+3");
    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::insert(5, 1)));

    let chain = nodes.chain_at(0).unwrap();
    assert_eq!(tree.grammar().symbol_name(chain.leaf.info.symbol), "number");
    // The root is never offered.
    assert_eq!(lens(&chain), vec![3, 1]);

    let chain = nodes.chain_at(1).unwrap();
    assert_eq!(tree.grammar().symbol_name(chain.leaf.info.symbol), "+");
    assert!(chain.outer.is_empty());
}

#[test]
fn damaged_leaf_rejects_the_chain() {
    let tree = sum_tree("1+2+3");
    // The last number looked at the end of the text, where the insertion is.
    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::insert(5, 1)));
    assert!(nodes.chain_at(4).is_none());

    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::replace(1, 1, 1)));
    assert!(nodes.chain_at(0).is_none());
    let chain = nodes.chain_at(2).unwrap();
    assert!(chain.outer.is_empty());
}

#[test]
fn cursor_only_moves_forward() {
    let tree = sum_tree("1+2+3");
    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::insert(0, 1)));
    assert!(nodes.chain_at(3).is_some());
    assert!(nodes.chain_at(1).is_none());
    assert!(nodes.chain_at(40).is_none());
}

#[test]
fn positions_inside_a_token_have_no_chain() {
    let tree = sum_tree("12+3");
    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::insert(4, 1)));
    assert!(nodes.chain_at(1).is_none());
    assert!(nodes.chain_at(2).is_some());
}

#[test]
fn zero_width_nodes_are_skipped() {
    // The empty program at 0 is passed over in favor of the statement.
    let tree = calc_tree("1;");
    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::insert(0, 0)));
    let chain = nodes.chain_at(0).unwrap();
    let kinds: Vec<_> = chain
        .outer
        .iter()
        .map(|c| tree.grammar().symbol_name(c.info.symbol))
        .collect();
    assert_eq!(kinds, ["statement", "expr"]);
}

#[test]
fn nodes_that_saw_the_end_are_damaged_by_an_append() {
    // The statement was reduced on END, which examined past the text.
    let tree = calc_tree("1;");
    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::insert(2, 1)));
    let chain = nodes.chain_at(0).unwrap();
    let kinds: Vec<_> = chain
        .outer
        .iter()
        .map(|c| tree.grammar().symbol_name(c.info.symbol))
        .collect();
    assert_eq!(kinds, ["expr"]);
}

#[test]
fn erroneous_nodes_are_not_offered() {
    // "1 2" gets a missing `+`; the inner expr was reduced for it.
    let tree = sum_tree("1 2");
    let mut nodes = ReusableNodes::new(&tree, marker(TextChange::insert(3, 1)));
    let chain = nodes.chain_at(0).unwrap();
    assert!(chain.outer.is_empty());
    assert_eq!(tree.grammar().symbol_name(chain.leaf.info.symbol), "number");
}
