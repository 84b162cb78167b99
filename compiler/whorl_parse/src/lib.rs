//! Table-driven GLR parsing with error recovery and incremental reparsing.
//!
//! # Parsing
//!
//! [`Parser::parse`] runs the grammar's LR tables over a text. Cells with
//! several actions are resolved by static precedence, or with
//! [`AmbiguityPolicy::Glr`] explored in parallel stack versions that merge
//! again once they agree; the losing parse of a merge stays reachable as an
//! alternative of the winning node. Syntax errors are recovered from and
//! recorded in the tree, so a parse only fails on exhausted limits,
//! cancellation or a malformed table.
//!
//! # Reparsing
//!
//! [`Parser::reparse`] takes the previous tree and the edit that produced
//! the new text. Subtrees the edit cannot have affected are pushed onto the
//! stack whole instead of being lexed and reduced again, and the new tree
//! shares them with the previous one. The result equals a fresh parse.
//!
//! # Diagnostics
//!
//! [`syntax_issues`] lists the recovered errors of a tree; [`render_issue`]
//! formats one with its source line.

mod diagnostics;
mod driver;
mod error;
pub mod incremental;
mod options;
mod parser;
mod stack;
mod stats;

pub use diagnostics::{render_issue, syntax_issues, IssueKind, SyntaxIssue};
pub use driver::MAX_INSERTIONS_PER_POSITION;
pub use error::{Limit, ParseError};
pub use options::{AmbiguityPolicy, CancellationFlag, OptionOverrides, ParseOptions};
pub use parser::{ParseOutput, Parser, MAX_SOURCE_LEN};
pub use stats::ParseStats;

use whorl_grammar::GrammarHandle;

/// Parse `text` with default options.
pub fn parse(grammar: &GrammarHandle, text: &[u8]) -> Result<ParseOutput, ParseError> {
    Parser::new(grammar.clone()).parse(text)
}

#[cfg(test)]
mod tests;
