//! Compact ids for grammar entities.
//!
//! All grammar tables index by `u16`. A grammar is limited to 65534 symbols;
//! `u16::MAX` is reserved for the built-in `ERROR` symbol.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(pub u16);

        impl $name {
            /// Create an id from a raw index.
            #[inline]
            pub const fn new(raw: u16) -> Self {
                $name(raw)
            }

            /// Raw index as `usize`, for table lookups.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Raw `u16` value.
            #[inline]
            pub const fn raw(self) -> u16 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Grammar symbol: terminal, external token or non-terminal.
    SymbolId,
    "sym"
);
define_id!(
    /// Parse state in the LR automaton.
    StateId,
    "s"
);
define_id!(
    /// State of the lexing DFA.
    LexStateId,
    "L"
);
define_id!(
    /// Production rule.
    RuleId,
    "r"
);
define_id!(
    /// Field name (`left:`, `operator:`, ...).
    FieldId,
    "f"
);

impl SymbolId {
    /// End of input. Always symbol 0.
    pub const END: SymbolId = SymbolId(0);
    /// Built-in error symbol, valid in every grammar.
    pub const ERROR: SymbolId = SymbolId(u16::MAX);

    #[inline]
    pub const fn is_end(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == u16::MAX
    }
}

impl StateId {
    /// Initial parse state.
    pub const START: StateId = StateId(0);
}

impl RuleId {
    /// Marker for leaf nodes and error nodes, which have no production.
    pub const NONE: RuleId = RuleId(u16::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u16::MAX
    }
}

impl LexStateId {
    /// Lex state used when no state is recorded (zero-width inserted tokens).
    pub const NONE: LexStateId = LexStateId(u16::MAX);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_symbols() {
        assert!(SymbolId::END.is_end());
        assert!(SymbolId::ERROR.is_error());
        assert!(!SymbolId::new(3).is_error());
        assert_eq!(SymbolId::new(3).index(), 3);
    }

    #[test]
    fn debug_uses_short_prefix() {
        assert_eq!(format!("{:?}", StateId::new(12)), "s12");
        assert_eq!(format!("{:?}", RuleId::NONE), "r65535");
    }

    #[test]
    fn ids_are_two_bytes() {
        assert_eq!(std::mem::size_of::<SymbolId>(), 2);
        assert_eq!(std::mem::size_of::<Option<StateId>>(), 4);
    }
}
