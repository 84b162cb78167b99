//! Query compilation errors.

use std::fmt;

use thiserror::Error;

/// What went wrong while compiling a query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Malformed query text.
    Syntax,
    /// A node kind the grammar does not define.
    NodeKind,
    /// A field the grammar does not define.
    Field,
    /// A predicate names a capture its pattern never binds.
    Capture,
    /// Unknown predicate, or wrong arguments for a known one.
    Predicate,
    /// The tree was built by a different grammar than the query.
    GrammarMismatch,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryErrorKind::Syntax => "syntax error",
            QueryErrorKind::NodeKind => "unknown node kind",
            QueryErrorKind::Field => "unknown field",
            QueryErrorKind::Capture => "unknown capture",
            QueryErrorKind::Predicate => "invalid predicate",
            QueryErrorKind::GrammarMismatch => "grammar mismatch",
        })
    }
}

/// A query error at a byte offset of the query text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}: {message}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub offset: u32,
    pub message: String,
}

impl QueryError {
    pub(crate) fn new(kind: QueryErrorKind, offset: usize, message: impl Into<String>) -> Self {
        QueryError {
            kind,
            offset: whorl_ir::to_u32(offset, "query offset"),
            message: message.into(),
        }
    }

    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        QueryError::new(QueryErrorKind::Syntax, offset, message)
    }
}
