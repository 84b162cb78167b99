//! Arena chunks.
//!
//! Every parse allocates its nodes into one fresh [`Chunk`], stored as
//! struct-of-arrays. Nodes reused from an earlier tree stay in that tree's
//! chunk; the new chunk keeps it alive through `deps`. A tree's chunk list is
//! the closure of its root chunk's dependencies.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use whorl_grammar::LexMode;
use whorl_ir::{to_u32, RuleId, StateId, SymbolId, TextLength};

use crate::{ChildRef, NodeFlags, NodeId};

/// Allocate a process-wide unique chunk generation.
pub(crate) fn next_generation() -> u32 {
    static NEXT: AtomicU32 = AtomicU32::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Cold per-node data used by error recovery and incremental reuse.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NodeMeta {
    pub rule: RuleId,
    pub pre_state: StateId,
    pub lex_mode: LexMode,
    pub first_leaf: SymbolId,
    pub follow_lex_mode: LexMode,
    pub lookahead_bytes: u32,
    pub error_cost: u32,
    pub dynamic_precedence: i32,
    pub descendant_count: u32,
}

impl NodeMeta {
    pub fn from_info(info: &NodeInfo) -> Self {
        NodeMeta {
            rule: info.rule,
            pre_state: info.pre_state,
            lex_mode: info.lex_mode,
            first_leaf: info.first_leaf,
            follow_lex_mode: info.follow_lex_mode,
            lookahead_bytes: info.lookahead_bytes,
            error_cost: info.error_cost,
            dynamic_precedence: info.dynamic_precedence,
            descendant_count: info.descendant_count,
        }
    }
}

/// Everything the tree records about one node, except its children.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    pub symbol: SymbolId,
    pub len: TextLength,
    pub flags: NodeFlags,
    /// Rule that produced the node; `RuleId::NONE` for leaves and errors.
    pub rule: RuleId,
    /// State on top of the stack below the node when it was pushed.
    pub pre_state: StateId,
    /// Lex mode of the node's first leaf.
    pub lex_mode: LexMode,
    /// Symbol of the first non-empty leaf; `END` for empty nodes.
    pub first_leaf: SymbolId,
    /// Lex mode of the token that followed the node when it was reduced.
    pub follow_lex_mode: LexMode,
    /// Bytes past the node's end that were examined while building it.
    pub lookahead_bytes: u32,
    pub error_cost: u32,
    pub dynamic_precedence: i32,
    /// Nodes in the subtree, this one included.
    pub descendant_count: u32,
}

impl NodeInfo {
    /// Stand-in for a node id that resolves to nothing.
    pub const DANGLING: NodeInfo = NodeInfo {
        symbol: SymbolId::ERROR,
        len: TextLength::ZERO,
        flags: NodeFlags::ERROR,
        rule: RuleId::NONE,
        pre_state: StateId::START,
        lex_mode: LexMode::new(whorl_ir::LexStateId::new(0)),
        first_leaf: SymbolId::END,
        follow_lex_mode: LexMode::new(whorl_ir::LexStateId::new(0)),
        lookahead_bytes: 0,
        error_cost: 0,
        dynamic_precedence: 0,
        descendant_count: 1,
    };

    #[inline]
    pub fn is_extra(&self) -> bool {
        self.flags.contains(NodeFlags::EXTRA)
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.flags.contains(NodeFlags::MISSING)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.flags.contains(NodeFlags::ERROR)
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.flags
            .intersects(NodeFlags::HAS_ERROR | NodeFlags::ERROR | NodeFlags::MISSING)
    }

    #[inline]
    pub fn is_fragile(&self) -> bool {
        self.flags.contains(NodeFlags::FRAGILE)
    }
}

/// Struct-of-arrays node storage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct Nodes {
    pub symbols: Vec<SymbolId>,
    pub lens: Vec<TextLength>,
    pub flags: Vec<NodeFlags>,
    /// `(start, count)` into `child_refs`.
    pub children: Vec<(u32, u32)>,
    pub meta: Vec<NodeMeta>,
    pub child_refs: Vec<ChildRef>,
    pub alternatives: FxHashMap<u32, Vec<NodeId>>,
}

impl Nodes {
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn push(
        &mut self,
        symbol: SymbolId,
        len: TextLength,
        flags: NodeFlags,
        children: &[ChildRef],
        meta: NodeMeta,
    ) -> u32 {
        let index = to_u32(self.symbols.len(), "nodes in chunk");
        let start = to_u32(self.child_refs.len(), "child references in chunk");
        self.child_refs.extend_from_slice(children);
        self.symbols.push(symbol);
        self.lens.push(len);
        self.flags.push(flags);
        self.children
            .push((start, to_u32(children.len(), "children of node")));
        self.meta.push(meta);
        index
    }

    pub fn info(&self, index: u32) -> Option<NodeInfo> {
        let i = index as usize;
        let meta = self.meta.get(i)?;
        Some(NodeInfo {
            symbol: self.symbols[i],
            len: self.lens[i],
            flags: self.flags[i],
            rule: meta.rule,
            pre_state: meta.pre_state,
            lex_mode: meta.lex_mode,
            first_leaf: meta.first_leaf,
            follow_lex_mode: meta.follow_lex_mode,
            lookahead_bytes: meta.lookahead_bytes,
            error_cost: meta.error_cost,
            dynamic_precedence: meta.dynamic_precedence,
            descendant_count: meta.descendant_count,
        })
    }

    pub fn children(&self, index: u32) -> &[ChildRef] {
        match self.children.get(index as usize) {
            Some(&(start, count)) => self
                .child_refs
                .get(start as usize..(start + count) as usize)
                .unwrap_or(&[]),
            None => &[],
        }
    }

    pub fn alternatives(&self, index: u32) -> &[NodeId] {
        self.alternatives.get(&index).map_or(&[], Vec::as_slice)
    }
}

/// One arena of nodes.
#[derive(Debug)]
pub(crate) struct Chunk {
    pub generation: u32,
    pub nodes: Nodes,
    /// Chunks that nodes in this chunk point into.
    pub deps: Vec<Arc<Chunk>>,
}

impl Chunk {
    pub fn new(generation: u32, nodes: Nodes, deps: Vec<Arc<Chunk>>) -> Self {
        Chunk {
            generation,
            nodes,
            deps,
        }
    }
}

/// Find a chunk by generation in a list sorted by generation.
#[inline]
pub(crate) fn find_chunk(chunks: &[Arc<Chunk>], generation: u32) -> Option<&Chunk> {
    chunks
        .binary_search_by_key(&generation, |c| c.generation)
        .ok()
        .map(|i| &*chunks[i])
}

/// All chunks reachable from `root` through `deps`, sorted by generation.
pub(crate) fn closure(root: &Arc<Chunk>) -> Vec<Arc<Chunk>> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    let mut stack = vec![Arc::clone(root)];
    while let Some(chunk) = stack.pop() {
        if !seen.insert(chunk.generation) {
            continue;
        }
        stack.extend(chunk.deps.iter().cloned());
        out.push(chunk);
    }
    out.sort_by_key(|c| c.generation);
    out
}

/// Read access to nodes spread across chunks.
pub(crate) trait NodeStore {
    fn nodes_of(&self, generation: u32) -> Option<&Nodes>;

    fn info(&self, id: NodeId) -> Option<NodeInfo> {
        self.nodes_of(id.generation)?.info(id.index)
    }

    fn children(&self, id: NodeId) -> &[ChildRef] {
        self.nodes_of(id.generation)
            .map_or(&[], |nodes| nodes.children(id.index))
    }

    fn alternatives(&self, id: NodeId) -> &[NodeId] {
        self.nodes_of(id.generation)
            .map_or(&[], |nodes| nodes.alternatives(id.index))
    }
}
