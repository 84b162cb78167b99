//! Pattern queries over whorl syntax trees.
//!
//! A query is a list of s-expression patterns compiled against one grammar:
//!
//! ```text
//! ; binary expressions whose left side is a literal
//! (expr left: (expr (number) @lhs) operator: _ @op)
//!
//! ; identifiers named like keywords
//! ((identifier) @kw (#any-of? @kw "if" "else"))
//! ```
//!
//! # Syntax
//!
//! - `(kind child…)` matches a named node of that kind; `(_)` any named
//!   node; `_` any node; `"+"` an anonymous node.
//! - `(ERROR)` matches error nodes; `(MISSING)` and `(MISSING kind)` match
//!   nodes inserted by error recovery.
//! - `field: pattern` requires the child to fill that field.
//! - `*`, `+` and `?` quantify a child or a parenthesized group of
//!   siblings; `[ … ]` matches the first branch that fits.
//! - `@name` captures the node. `(#eq? @a @b)`, `(#eq? @a "text")`,
//!   `(#not-eq? …)` and `(#any-of? @a "x" "y")` filter on captured text.
//! - `;` starts a comment.
//!
//! Child patterns match children in order, skipping children in between.
//! Each child list compiles to a small program of node, split, jump and
//! done instructions, run by a backtracking matcher.
//!
//! # Running
//!
//! [`QueryCursor::matches`] returns a lazy [`QueryMatches`] iterator in
//! document order. It can be cloned to restart from the same point or
//! resumed from a byte offset with [`QueryCursor::matches_from`].

mod compile;
mod cursor;
mod error;
mod query;
mod syntax;
mod vm;

pub use cursor::{QueryCapture, QueryCursor, QueryMatch, QueryMatches, DEFAULT_MATCH_LIMIT};
pub use error::{QueryError, QueryErrorKind};
pub use query::Query;

use whorl_tree::Tree;

/// Every match of `query` in `tree`.
///
/// # Errors
/// [`QueryErrorKind::GrammarMismatch`] when `tree` was built by another
/// grammar than `query`.
pub fn matches<'q, 't, 's>(
    tree: &'t Tree,
    query: &'q Query,
    source: &'s [u8],
) -> Result<QueryMatches<'q, 't, 's>, QueryError> {
    query.matches(tree, source)
}

#[cfg(test)]
mod tests;
