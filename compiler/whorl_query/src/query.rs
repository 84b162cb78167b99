//! Compiled queries.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use whorl_grammar::GrammarHandle;
use whorl_ir::{FieldId, SymbolId};
use whorl_tree::Tree;

use crate::compile::Compiler;
use crate::cursor::{QueryCursor, QueryMatches};
use crate::error::QueryError;
use crate::syntax;

/// Index of a [`NodeMatcher`] in [`Query::nodes`].
pub(crate) type MatcherId = usize;

/// The test a single node must pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Symbol(SymbolId),
    /// `(_)`
    Named,
    /// `_`
    Any,
    Missing(Option<SymbolId>),
    Alternation(Vec<MatcherId>),
}

/// One instruction of a child-sequence program.
///
/// A program runs over a node's children left to right. `Node` consumes
/// the first remaining child that matches, skipping the ones before it;
/// `Split` tries its first target and falls back to the second.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Instr {
    Node(MatcherId),
    Split(usize, usize),
    Jump(usize),
    Done,
}

#[derive(Clone, Debug)]
pub(crate) struct NodeMatcher {
    pub test: NodeTest,
    pub field: Option<FieldId>,
    pub captures: SmallVec<[u32; 2]>,
    /// Empty when the pattern says nothing about children.
    pub program: Vec<Instr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Operand {
    Capture(u32),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Predicate {
    /// `#eq?` or, when `negated`, `#not-eq?`.
    Eq {
        capture: u32,
        other: Operand,
        negated: bool,
    },
    /// `#any-of?`
    AnyOf { capture: u32, values: Vec<String> },
}

#[derive(Clone, Debug)]
pub(crate) struct PatternInfo {
    pub root: MatcherId,
    pub predicates: Vec<Predicate>,
    pub start_byte: u32,
}

/// A set of patterns compiled against one grammar.
///
/// Patterns are numbered in the order they appear in the query text.
/// Capture names are shared by all patterns: `@name` gets the same index
/// wherever it is written.
#[derive(Clone, Debug)]
pub struct Query {
    pub(crate) grammar: GrammarHandle,
    pub(crate) nodes: Vec<NodeMatcher>,
    pub(crate) patterns: Vec<PatternInfo>,
    pub(crate) capture_names: Vec<String>,
    pub(crate) capture_map: FxHashMap<String, u32>,
}

impl Query {
    /// Compile `source` against `grammar`.
    ///
    /// # Errors
    /// A [`QueryError`] at the offending byte of `source`.
    #[tracing::instrument(level = "debug", skip_all, fields(grammar = %grammar.tag()))]
    pub fn new(grammar: &GrammarHandle, source: &str) -> Result<Self, QueryError> {
        let patterns = syntax::parse(source)?;
        let query = Compiler::new(grammar).compile(&patterns)?;
        tracing::debug!(
            patterns = query.patterns.len(),
            captures = query.capture_names.len(),
            matchers = query.nodes.len(),
            "compiled query"
        );
        Ok(query)
    }

    pub fn grammar(&self) -> &GrammarHandle {
        &self.grammar
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Byte offset of a pattern in the query text.
    pub fn start_byte_for_pattern(&self, pattern_index: usize) -> Option<u32> {
        self.patterns.get(pattern_index).map(|p| p.start_byte)
    }

    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn capture_index_for_name(&self, name: &str) -> Option<u32> {
        self.capture_map.get(name).copied()
    }

    pub fn capture_name(&self, index: u32) -> Option<&str> {
        self.capture_names.get(index as usize).map(String::as_str)
    }

    /// All matches in `tree` with a default [`QueryCursor`].
    ///
    /// # Errors
    /// [`QueryErrorKind::GrammarMismatch`](crate::QueryErrorKind) when the
    /// tree was built by another grammar.
    pub fn matches<'q, 't, 's>(
        &'q self,
        tree: &'t Tree,
        source: &'s [u8],
    ) -> Result<QueryMatches<'q, 't, 's>, QueryError> {
        QueryCursor::new().matches(self, tree, source)
    }
}
