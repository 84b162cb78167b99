//! Parse errors.
//!
//! Syntax errors never show up here: they are recovered from and recorded
//! in the tree as `ERROR` and `MISSING` nodes. These are the failures that
//! abort a parse call.

use std::fmt;

/// A bounded resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Limit {
    Forks,
    StackDepth,
    Tokens,
    ReductionsPerToken,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Limit::Forks => "forks",
            Limit::StackDepth => "stack entries",
            Limit::Tokens => "tokens",
            Limit::ReductionsPerToken => "reductions without consuming input",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("resource limit exceeded: more than {max} {limit}")]
    ResourceExhausted { limit: Limit, max: usize },

    #[error("tree was parsed with grammar {tree}, but this parser uses {parser}")]
    GrammarMismatch { tree: String, parser: String },

    #[error("parse cancelled")]
    Cancelled,

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("source is {len} bytes; at most {max} bytes are supported")]
    SourceTooLarge { len: usize, max: usize },

    #[error("parse table has no goto from state {state} on '{symbol}'")]
    InvalidTable { state: u16, symbol: String },
}
