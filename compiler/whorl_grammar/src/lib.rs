//! Compiled grammars for the whorl runtime.
//!
//! A [`Grammar`] is the immutable output of a grammar compiler:
//! - a symbol table (tokens before non-terminals, `END` as symbol 0)
//! - production rules with precedence and field maps
//! - an LR parse table: action cells per state × token, gotos per
//!   state × non-terminal, and a lex mode per state
//! - a lex table: a character-class DFA plus a separator class
//! - optionally, external tokens recognised by a native [`ExternalScanner`]
//!
//! Grammars are built with [`GrammarBuilder`] or loaded from bytes with
//! [`Grammar::from_bytes`], then shared through a [`GrammarHandle`].

mod action;
mod builder;
mod charclass;
mod error;
mod external;
mod grammar;
mod handle;
mod lex;
mod rule;
mod symbol;

pub use action::{resolve, Action, ParseAction};
pub use builder::{GrammarBuilder, END_NAME};
pub use charclass::CharClass;
pub use error::GrammarError;
pub use external::{ExternalScanner, ScanContext};
pub use grammar::{Grammar, GrammarTag, ERROR_NAME, FORMAT_VERSION};
pub use handle::GrammarHandle;
pub use lex::{LexMode, LexState};
pub use rule::{FieldMapping, Rule};
pub use symbol::{Assoc, Precedence, SymbolInfo, SymbolKind};

#[cfg(test)]
mod tests;
