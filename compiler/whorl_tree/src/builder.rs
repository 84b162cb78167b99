//! Tree construction.
//!
//! The parser is the only producer of trees. It creates leaves and branches
//! through a [`TreeBuilder`], which derives the aggregate data (flags, error
//! cost, dynamic precedence, first leaf, examined range, descendant count)
//! from the children, and finally publishes an immutable [`Tree`].

use std::sync::Arc;

use rustc_hash::FxHashSet;
use whorl_grammar::{GrammarHandle, LexMode};
use whorl_ir::{RuleId, StateId, SymbolId, TextLength};

use crate::chunk::{closure, find_chunk, next_generation, Chunk, NodeMeta, NodeStore, Nodes};
use crate::{ChildRef, NodeFlags, NodeId, NodeInfo, Tree};

/// Cost of a zero-width token inserted by recovery.
pub const ERROR_COST_PER_MISSING: u32 = 110;
/// Cost of each subtree skipped by recovery, on top of its byte length.
pub const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;
/// Cost of opening an `ERROR` node.
pub const ERROR_COST_PER_RECOVERY: u32 = 500;

/// Trees referencing more chunks than this are compacted when published.
pub const MAX_CHUNKS: usize = 8;

/// A token becoming a leaf.
#[derive(Copy, Clone, Debug)]
pub struct LeafSpec {
    pub symbol: SymbolId,
    pub len: TextLength,
    /// `EXTRA`, `MISSING` or `FRAGILE`; `ERROR` is implied by the symbol.
    pub flags: NodeFlags,
    pub pre_state: StateId,
    pub lex_mode: LexMode,
    pub lookahead_bytes: u32,
}

/// A reduction becoming a branch.
#[derive(Copy, Clone, Debug)]
pub struct BranchSpec<'a> {
    pub symbol: SymbolId,
    pub rule: RuleId,
    pub children: &'a [ChildRef],
    /// `EXTRA` or `FRAGILE`; `ERROR` is implied by the symbol.
    pub flags: NodeFlags,
    pub pre_state: StateId,
    /// Bytes past the node's end examined by the token that triggered the
    /// reduction.
    pub follow_examined: u32,
    pub follow_lex_mode: LexMode,
}

/// Allocates the nodes of one parse.
pub struct TreeBuilder {
    grammar: GrammarHandle,
    generation: u32,
    nodes: Nodes,
    /// Chunks of the trees nodes may be reused from.
    prior: Vec<Arc<Chunk>>,
}

impl NodeStore for TreeBuilder {
    fn nodes_of(&self, generation: u32) -> Option<&Nodes> {
        if generation == self.generation {
            Some(&self.nodes)
        } else {
            find_chunk(&self.prior, generation).map(|c| &c.nodes)
        }
    }
}

impl TreeBuilder {
    pub fn new(grammar: GrammarHandle) -> Self {
        TreeBuilder {
            grammar,
            generation: next_generation(),
            nodes: Nodes::default(),
            prior: Vec::new(),
        }
    }

    /// A builder whose new nodes may point into `prior`'s nodes.
    pub fn with_prior(grammar: GrammarHandle, prior: &Tree) -> Self {
        let mut builder = TreeBuilder::new(grammar);
        builder.prior = prior.chunks().to_vec();
        builder
    }

    pub fn grammar(&self) -> &GrammarHandle {
        &self.grammar
    }

    /// Nodes allocated so far by this builder.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn id(&self, index: u32) -> NodeId {
        NodeId::new(self.generation, index)
    }

    pub fn info(&self, id: NodeId) -> Option<NodeInfo> {
        NodeStore::info(self, id)
    }

    pub fn children(&self, id: NodeId) -> &[ChildRef] {
        NodeStore::children(self, id)
    }

    pub fn leaf(&mut self, spec: LeafSpec) -> NodeId {
        let mut flags = spec.flags & (NodeFlags::EXTRA | NodeFlags::MISSING | NodeFlags::FRAGILE);
        let mut error_cost = 0;
        if spec.symbol.is_error() {
            flags |= NodeFlags::ERROR | NodeFlags::HAS_ERROR;
            error_cost = ERROR_COST_PER_SKIPPED_TREE + spec.len.bytes;
        }
        if flags.contains(NodeFlags::MISSING) {
            flags |= NodeFlags::HAS_ERROR;
            error_cost = ERROR_COST_PER_MISSING;
        }
        let first_leaf = if spec.len.is_zero() {
            SymbolId::END
        } else {
            spec.symbol
        };
        let meta = NodeMeta {
            rule: RuleId::NONE,
            pre_state: spec.pre_state,
            lex_mode: spec.lex_mode,
            first_leaf,
            follow_lex_mode: spec.lex_mode,
            lookahead_bytes: spec.lookahead_bytes,
            error_cost,
            dynamic_precedence: 0,
            descendant_count: 1,
        };
        let index = self.nodes.push(spec.symbol, spec.len, flags, &[], meta);
        self.id(index)
    }

    pub fn branch(&mut self, spec: BranchSpec<'_>) -> NodeId {
        let mut flags = spec.flags & (NodeFlags::EXTRA | NodeFlags::FRAGILE);
        let is_error = spec.symbol.is_error();
        if is_error {
            flags |= NodeFlags::ERROR | NodeFlags::HAS_ERROR;
        }

        let mut len = TextLength::ZERO;
        let mut examined_end = 0u32;
        let mut error_cost = if is_error { ERROR_COST_PER_RECOVERY } else { 0 };
        let mut dynamic_precedence = self
            .grammar
            .rule(spec.rule)
            .map_or(0, |r| i32::from(r.dynamic_precedence));
        let mut descendant_count = 1u32;
        let mut first: Option<(SymbolId, LexMode)> = None;

        for child in spec.children {
            let Some(info) = NodeStore::info(self, child.node) else {
                continue;
            };
            let end = child.offset + info.len;
            if end.bytes >= len.bytes {
                len = end;
            }
            examined_end = examined_end.max(end.bytes.saturating_add(info.lookahead_bytes));
            flags |= info.flags.inherited();
            error_cost = error_cost.saturating_add(info.error_cost);
            if is_error {
                error_cost = error_cost
                    .saturating_add(ERROR_COST_PER_SKIPPED_TREE)
                    .saturating_add(info.len.bytes);
            }
            dynamic_precedence = dynamic_precedence.saturating_add(info.dynamic_precedence);
            descendant_count = descendant_count.saturating_add(info.descendant_count);
            if first.is_none() && !info.len.is_zero() {
                first = Some((info.first_leaf, info.lex_mode));
            }
        }

        let follow_end = len.bytes.saturating_add(spec.follow_examined);
        let lookahead_bytes = examined_end.max(follow_end) - len.bytes;
        let (first_leaf, lex_mode) = first.unwrap_or((SymbolId::END, spec.follow_lex_mode));
        let meta = NodeMeta {
            rule: spec.rule,
            pre_state: spec.pre_state,
            lex_mode,
            first_leaf,
            follow_lex_mode: spec.follow_lex_mode,
            lookahead_bytes,
            error_cost,
            dynamic_precedence,
            descendant_count,
        };
        let index = self
            .nodes
            .push(spec.symbol, len, flags, spec.children, meta);
        self.id(index)
    }

    /// Record `alternative` as another parse of the same text as `node`.
    ///
    /// Only nodes allocated by this builder can gain alternatives; returns
    /// `false` otherwise.
    pub fn add_alternative(&mut self, node: NodeId, alternative: NodeId) -> bool {
        if node.generation != self.generation || node == alternative {
            return false;
        }
        let list = self.nodes.alternatives.entry(node.index).or_default();
        if !list.contains(&alternative) {
            list.push(alternative);
        }
        true
    }

    /// Publish the tree rooted at `root`.
    ///
    /// `root_start` is the absolute position of the root's first byte and
    /// `text_len` the length of the whole text.
    pub fn finish(self, root: NodeId, root_start: TextLength, text_len: TextLength) -> Tree {
        let mut referenced = FxHashSet::default();
        referenced.insert(root.generation);
        for child in &self.nodes.child_refs {
            referenced.insert(child.node.generation);
        }
        for alternatives in self.nodes.alternatives.values() {
            referenced.extend(alternatives.iter().map(|a| a.generation));
        }
        let deps = self
            .prior
            .iter()
            .filter(|c| referenced.contains(&c.generation))
            .cloned()
            .collect();

        let chunk = Arc::new(Chunk::new(self.generation, self.nodes, deps));
        let chunks = closure(&chunk);
        let tree = Tree::from_parts(root, root_start, text_len, self.grammar, chunks);
        if tree.chunk_count() > MAX_CHUNKS {
            tracing::debug!(chunks = tree.chunk_count(), "compacting tree");
            tree.compact()
        } else {
            tree
        }
    }
}
