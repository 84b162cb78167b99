//! Parser tests.
//!
//! Tests are organized into modules by category:
//! - `parser`: full parses of well-formed input, extras and external tokens
//! - `recovery`: `ERROR` and `MISSING` nodes for malformed input
//! - `glr`: forking, merging and alternatives on ambiguous cells
//! - `reparse`: incremental reparsing and subtree reuse
//! - `limits`: resource limits, cancellation and invalid calls
//! - `diagnostics`: reading issues back out of trees
//! - `properties`: randomized equivalence and termination checks

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod diagnostics;
mod glr;
mod limits;
mod reparse;

use whorl_calc::{calc_grammar, sum_grammar};
use whorl_ir::{InputEdit, TextChange};

use crate::{AmbiguityPolicy, ParseOptions, ParseOutput, Parser};

fn sum() -> Parser {
    Parser::new(sum_grammar())
}

fn calc() -> Parser {
    Parser::new(calc_grammar())
}

fn calc_glr() -> Parser {
    Parser::with_options(
        calc_grammar(),
        ParseOptions::default().with_policy(AmbiguityPolicy::Glr),
    )
}

/// Parse `text`, check the tree's invariants and return it.
fn parse_ok(parser: &Parser, text: &str) -> ParseOutput {
    let output = parser.parse(text.as_bytes()).unwrap();
    output.tree.verify().unwrap();
    output
}

fn sexp(parser: &Parser, text: &str) -> String {
    parse_ok(parser, text).tree.to_sexp()
}

/// Replace `old[start..end]` with `insert`.
fn apply(old: &str, start: usize, end: usize, insert: &str) -> (String, InputEdit) {
    let new = format!("{}{insert}{}", &old[..start], &old[end..]);
    let change = TextChange::new(start as u32, end as u32, insert.len() as u32);
    let edit = InputEdit::from_change(change, old.as_bytes(), new.as_bytes());
    (new, edit)
}

/// Reparse after an edit and check the result against a fresh parse.
fn reparse_matches(
    parser: &Parser,
    old: &str,
    start: usize,
    end: usize,
    insert: &str,
) -> (ParseOutput, ParseOutput) {
    let prior = parse_ok(parser, old);
    let (new, edit) = apply(old, start, end, insert);
    let incremental = parser.reparse(&prior.tree, &edit, new.as_bytes()).unwrap();
    incremental.tree.verify().unwrap();
    let fresh = parse_ok(parser, &new);
    assert_eq!(incremental.tree, fresh.tree, "reparse of {new:?} after editing {old:?}");
    assert_eq!(incremental.tree.to_sexp(), fresh.tree.to_sexp());
    (incremental, fresh)
}
