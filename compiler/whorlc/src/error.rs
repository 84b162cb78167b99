//! Driver errors.

use std::path::PathBuf;

use thiserror::Error;
use whorl_grammar::GrammarError;
use whorl_parse::ParseError;
use whorl_query::QueryError;

#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command line; the message says what was expected.
    #[error("{0}")]
    Usage(String),

    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("unknown grammar '{name}' (available: {available})")]
    UnknownGrammar { name: String, available: String },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("{path}: {source}")]
    Parse { path: PathBuf, source: ParseError },

    #[error("{path}: {source}")]
    Query { path: PathBuf, source: QueryError },

    /// An incremental reparse disagreed with a fresh parse.
    #[error("reparse of '{path}' differs from a fresh parse")]
    Diverged { path: PathBuf },
}

impl CliError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(message.into())
    }
}
