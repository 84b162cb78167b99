//! Parse stack versions.
//!
//! Each GLR version owns a plain vector of entries. Forking clones the
//! vector; versions are few and short-lived, and entries are `Copy`.

use smallvec::SmallVec;
use whorl_grammar::{LexMode, ParseAction};
use whorl_ir::{StateId, SymbolId, TextLength};
use whorl_lexer::Token;
use whorl_tree::{NodeId, NodeInfo};

use crate::incremental::Candidate;

/// A node on a stack, with its absolute position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Subtree {
    pub id: NodeId,
    pub symbol: SymbolId,
    pub start: TextLength,
    pub len: TextLength,
    pub extra: bool,
    pub error: bool,
    pub error_cost: u32,
    pub dynamic_precedence: i32,
}

impl Subtree {
    pub fn new(id: NodeId, start: TextLength, info: &NodeInfo) -> Self {
        Subtree {
            id,
            symbol: info.symbol,
            start,
            len: info.len,
            extra: info.is_extra(),
            error: info.is_error(),
            error_cost: info.error_cost,
            dynamic_precedence: info.dynamic_precedence,
        }
    }

    #[inline]
    pub fn end(&self) -> TextLength {
        self.start + self.len
    }
}

/// The state entered after pushing `subtree`. Extras keep the state below.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Entry {
    pub state: StateId,
    pub subtree: Subtree,
}

/// The next token of a version, lexed or taken from the prior tree.
#[derive(Clone, Debug)]
pub(crate) struct Lookahead {
    pub token: Token,
    /// The prior tree's leaf for this token.
    pub leaf: Option<Candidate>,
    /// Internal nodes of the prior tree starting with `leaf`, outermost
    /// first.
    pub outer: SmallVec<[Candidate; 4]>,
}

impl Lookahead {
    pub fn lexed(token: Token) -> Self {
        Lookahead {
            token,
            leaf: None,
            outer: SmallVec::new(),
        }
    }
}

/// One GLR stack.
#[derive(Clone, Debug)]
pub(crate) struct Version {
    /// Creation order; earlier versions win ties when merging.
    pub seq: u32,
    pub entries: Vec<Entry>,
    /// End of the input consumed so far.
    pub position: TextLength,
    pub lookahead: Option<Lookahead>,
    /// Lex mode for the next token, set after pushing a reused subtree.
    pub lex_override: Option<LexMode>,
    /// The top entry is an `ERROR` node that further skipped tokens extend.
    pub error_run: bool,
    /// Position of the last recovery insertion and how many were made there.
    pub insertions: (u32, u8),
    /// Reductions since the last consumed token.
    pub reductions: usize,
    /// Action a freshly forked version takes before consulting the table.
    pub forced: Option<ParseAction>,
}

impl Version {
    pub fn new(seq: u32) -> Self {
        Version {
            seq,
            entries: Vec::new(),
            position: TextLength::ZERO,
            lookahead: None,
            lex_override: None,
            error_run: false,
            insertions: (0, 0),
            reductions: 0,
            forced: None,
        }
    }

    #[inline]
    pub fn state(&self) -> StateId {
        self.entries.last().map_or(StateId::START, |e| e.state)
    }

    /// End of the topmost node, or zero on an empty stack.
    pub fn top_end(&self) -> TextLength {
        self.entries
            .last()
            .map_or(TextLength::ZERO, |e| e.subtree.end())
    }

    pub fn error_cost(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.subtree.error_cost))
    }

    pub fn dynamic_precedence(&self) -> i32 {
        self.entries
            .iter()
            .fold(0i32, |acc, e| acc.saturating_add(e.subtree.dynamic_precedence))
    }

    /// States of the non-extra entries above the start state.
    pub fn states(&self) -> Vec<StateId> {
        let mut states = Vec::with_capacity(self.entries.len() + 1);
        states.push(StateId::START);
        states.extend(
            self.entries
                .iter()
                .filter(|e| !e.subtree.extra)
                .map(|e| e.state),
        );
        states
    }

    /// Whether `other` can be merged into this version: same input position,
    /// same pending token and the same shape of stack.
    pub fn same_configuration(&self, other: &Version) -> bool {
        self.forced.is_none()
            && other.forced.is_none()
            && self.position.bytes == other.position.bytes
            && self.lex_override == other.lex_override
            && self.lookahead.as_ref().map(|l| l.token) == other.lookahead.as_ref().map(|l| l.token)
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.state == b.state && a.subtree.extra == b.subtree.extra)
    }

    /// Whether this version is preferred over `other` when they merge.
    pub fn preferred_over(&self, other: &Version) -> bool {
        let key = |v: &Version| {
            (
                v.error_cost(),
                std::cmp::Reverse(v.dynamic_precedence()),
                v.seq,
            )
        };
        key(self) < key(other)
    }
}
