//! Grammar construction and loading errors.

use thiserror::Error;

/// A grammar that fails validation, or serialized tables that cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// More symbols than fit in a `SymbolId` (one value is reserved for `ERROR`).
    #[error("too many symbols: {0} (at most 65534)")]
    TooManySymbols(usize),

    /// A table refers to a symbol id that does not exist or has the wrong kind.
    #[error("unknown symbol {symbol} in {context}")]
    UnknownSymbol { symbol: u16, context: &'static str },

    /// Tokens must be numbered before non-terminals.
    #[error("token '{name}' is declared after the first non-terminal")]
    SymbolOrder { name: String },

    /// Symbol 0 must be the end-of-input terminal.
    #[error("symbol 0 must be the end-of-input terminal")]
    MissingEndSymbol,

    #[error("start symbol {0} is not a non-terminal")]
    InvalidStartSymbol(u16),

    #[error("parse state {state} out of range ({count} states)")]
    StateOutOfRange { state: u16, count: usize },

    #[error("rule {rule} out of range ({count} rules)")]
    RuleOutOfRange { rule: u16, count: usize },

    #[error("lex state {state} out of range ({count} lex states)")]
    LexStateOutOfRange { state: u16, count: usize },

    #[error("external lex state {state} out of range ({count} rows)")]
    ExternalStateOutOfRange { state: u16, count: usize },

    #[error("goto from state {state} on token '{name}'")]
    GotoOnToken { state: u16, name: String },

    #[error("action in state {state} on non-terminal '{name}'")]
    ActionOnNonTerminal { state: u16, name: String },

    #[error("rule {rule} names child {child_index} but has only {rhs_len} children")]
    FieldOutOfRange {
        rule: u16,
        child_index: u16,
        rhs_len: u16,
    },

    #[error("unknown field {0}")]
    UnknownField(u16),

    /// An external symbol missing from the external-token list, or the reverse.
    #[error("external token '{name}' is not declared consistently")]
    UndeclaredExternal { name: String },

    /// Table dimensions do not agree with the symbol and state counts.
    #[error("malformed table: {0}")]
    MalformedTable(&'static str),

    #[error("not a serialized grammar (bad magic)")]
    BadMagic,

    #[error("unsupported grammar format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to decode grammar tables: {0}")]
    Decode(String),

    #[error("failed to encode grammar tables: {0}")]
    Encode(String),
}
