//! Symbol table entries and precedence annotations.

use serde::{Deserialize, Serialize};

/// Where a symbol comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Produced by the built-in lex DFA.
    Terminal,
    /// Produced by the grammar's external scanner.
    External,
    /// Produced by a reduction.
    NonTerminal,
}

/// One entry of the symbol table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Named symbols appear in s-expressions and match `(_)` in queries;
    /// anonymous ones are punctuation and keywords.
    pub named: bool,
    /// Extras (comments, etc.) may appear anywhere and are shifted without
    /// changing the parse state.
    pub extra: bool,
}

impl SymbolInfo {
    #[inline]
    pub fn is_token(&self) -> bool {
        !matches!(self.kind, SymbolKind::NonTerminal)
    }
}

/// Associativity of an operator precedence level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assoc {
    Left,
    Right,
    /// Chaining two operators of this level is an error.
    NonAssoc,
}

/// Static precedence: a level plus associativity. Higher levels bind tighter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Precedence {
    pub level: i16,
    pub assoc: Assoc,
}

impl Precedence {
    pub const fn left(level: i16) -> Self {
        Precedence {
            level,
            assoc: Assoc::Left,
        }
    }

    pub const fn right(level: i16) -> Self {
        Precedence {
            level,
            assoc: Assoc::Right,
        }
    }

    pub const fn non_assoc(level: i16) -> Self {
        Precedence {
            level,
            assoc: Assoc::NonAssoc,
        }
    }
}
