//! Query tests.
//!
//! - `compile`: query syntax, name resolution and compile errors
//! - `matching`: pattern semantics against parsed calc and sum trees
//! - `cursor`: byte ranges, resumption, limits and iteration
//! - `properties`: randomized checks over arbitrary calc input

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod compile;
mod cursor;

use whorl_calc::{calc_grammar, sum_grammar};
use whorl_parse::Parser;
use whorl_tree::Tree;

use crate::{Query, QueryError};

fn calc_tree(text: &str) -> Tree {
    Parser::new(calc_grammar()).parse(text.as_bytes()).unwrap().tree
}

fn sum_tree(text: &str) -> Tree {
    Parser::new(sum_grammar()).parse(text.as_bytes()).unwrap().tree
}

fn calc_query(source: &str) -> Query {
    Query::new(&calc_grammar(), source).unwrap()
}

fn sum_query(source: &str) -> Query {
    Query::new(&sum_grammar(), source).unwrap()
}

fn calc_error(source: &str) -> QueryError {
    Query::new(&calc_grammar(), source).unwrap_err()
}

/// Every match as `(capture, text)` pairs.
fn run(query: &Query, tree: &Tree, text: &str) -> Vec<Vec<(String, String)>> {
    query
        .matches(tree, text.as_bytes())
        .unwrap()
        .map(|m| {
            m.captures
                .iter()
                .map(|c| {
                    (
                        query.capture_name(c.index).unwrap().to_owned(),
                        c.node.utf8_text(text.as_bytes()).unwrap().to_owned(),
                    )
                })
                .collect()
        })
        .collect()
}

/// Texts of all captures, in match order.
fn texts(query: &Query, tree: &Tree, text: &str) -> Vec<String> {
    run(query, tree, text)
        .into_iter()
        .flatten()
        .map(|(_, text)| text)
        .collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
        .collect()
}
