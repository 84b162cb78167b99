//! Lex table: the character-class DFA that produces terminals.

use serde::{Deserialize, Serialize};
use whorl_ir::{LexStateId, SymbolId};

use crate::CharClass;

/// One DFA state.
///
/// Transitions are tried in order; the first class containing the
/// lookahead character wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LexState {
    /// Terminal recognised if lexing stops here.
    pub accept: Option<SymbolId>,
    pub transitions: Vec<(CharClass, LexStateId)>,
}

impl LexState {
    pub fn new() -> Self {
        LexState::default()
    }

    #[must_use]
    pub fn accept(mut self, symbol: SymbolId) -> Self {
        self.accept = Some(symbol);
        self
    }

    #[must_use]
    pub fn on(mut self, class: CharClass, target: LexStateId) -> Self {
        self.transitions.push((class, target));
        self
    }

    /// Target state for a character.
    #[inline]
    pub fn next(&self, c: char) -> Option<LexStateId> {
        self.transitions
            .iter()
            .find(|(class, _)| class.contains(c))
            .map(|&(_, target)| target)
    }
}

/// How to lex in a given parse state.
///
/// Two parse states with equal lex modes produce identical tokens from the
/// same input, which is what makes a cached leaf reusable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LexMode {
    /// DFA start state.
    pub lex_state: LexStateId,
    /// Row of the external-token validity table; 0 means no external token
    /// is valid and the external scanner is not consulted.
    pub external_lex_state: u16,
}

impl LexMode {
    pub const fn new(lex_state: LexStateId) -> Self {
        LexMode {
            lex_state,
            external_lex_state: 0,
        }
    }

    #[must_use]
    pub const fn with_externals(mut self, external_lex_state: u16) -> Self {
        self.external_lex_state = external_lex_state;
        self
    }
}

impl Default for LexMode {
    fn default() -> Self {
        LexMode::new(LexStateId::new(0))
    }
}
