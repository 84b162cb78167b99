//! The published, immutable syntax tree.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use whorl_grammar::GrammarHandle;
use whorl_ir::TextLength;

use crate::chunk::{find_chunk, next_generation, Chunk, NodeMeta, NodeStore, Nodes};
use crate::{ChildRef, Node, NodeFlags, NodeId, NodeInfo, TreeCursor, TreeError};

/// Flags that take part in structural equality.
const STRUCTURAL_FLAGS: NodeFlags = NodeFlags::EXTRA
    .union(NodeFlags::MISSING)
    .union(NodeFlags::ERROR);

/// A syntax tree.
///
/// Cloning is cheap: the nodes live in reference-counted chunks shared with
/// every other tree that reuses them. Trees are `Send + Sync`.
#[derive(Clone)]
pub struct Tree {
    root: NodeId,
    root_start: TextLength,
    text_len: TextLength,
    grammar: GrammarHandle,
    /// Sorted by generation.
    chunks: Arc<[Arc<Chunk>]>,
}

impl NodeStore for Tree {
    #[inline]
    fn nodes_of(&self, generation: u32) -> Option<&Nodes> {
        find_chunk(&self.chunks, generation).map(|c| &c.nodes)
    }
}

impl Tree {
    pub(crate) fn from_parts(
        root: NodeId,
        root_start: TextLength,
        text_len: TextLength,
        grammar: GrammarHandle,
        chunks: Vec<Arc<Chunk>>,
    ) -> Self {
        Tree {
            root,
            root_start,
            text_len,
            grammar,
            chunks: chunks.into(),
        }
    }

    pub(crate) fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    pub fn grammar(&self) -> &GrammarHandle {
        &self.grammar
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::new(self, self.root, self.root_start)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Absolute position of the root's first byte.
    pub fn root_start(&self) -> TextLength {
        self.root_start
    }

    /// Length of the text the tree was parsed from.
    pub fn text_len(&self) -> TextLength {
        self.text_len
    }

    /// Number of arena chunks the tree's nodes live in.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Raw node data, for the parser's reuse logic.
    pub fn info(&self, id: NodeId) -> Option<NodeInfo> {
        NodeStore::info(self, id)
    }

    pub(crate) fn info_or_dangling(&self, id: NodeId) -> NodeInfo {
        NodeStore::info(self, id).unwrap_or(NodeInfo::DANGLING)
    }

    /// Children of a node with offsets relative to the node's start.
    pub fn children(&self, id: NodeId) -> &[ChildRef] {
        NodeStore::children(self, id)
    }

    pub fn alternative_ids(&self, id: NodeId) -> &[NodeId] {
        NodeStore::alternatives(self, id)
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        TreeCursor::new(self.root_node())
    }

    /// All nodes in document order, parents before children.
    pub fn preorder(&self) -> crate::Preorder<'_> {
        self.root_node().preorder()
    }

    /// Whether both values are the same tree, not just equal ones.
    pub fn ptr_eq(a: &Tree, b: &Tree) -> bool {
        a.root == b.root && a.root_start == b.root_start && Arc::ptr_eq(&a.chunks, &b.chunks)
    }

    /// Find the parent of the node with `id` starting at `start` by
    /// descending from the root.
    pub(crate) fn parent_of(&self, id: NodeId, start: TextLength) -> Option<(NodeId, TextLength)> {
        if id == self.root && start.bytes == self.root_start.bytes {
            return None;
        }
        let mut stack = vec![(self.root, self.root_start)];
        while let Some((current, current_start)) = stack.pop() {
            for child in self.children(current) {
                let child_start = current_start + child.offset;
                if child.node == id && child_start.bytes == start.bytes {
                    return Some((current, current_start));
                }
                let child_end = child_start.bytes + self.info_or_dangling(child.node).len.bytes;
                if child_start.bytes <= start.bytes
                    && start.bytes <= child_end
                    && !self.children(child.node).is_empty()
                {
                    stack.push((child.node, child_start));
                }
            }
        }
        None
    }

    /// Copy every node reachable from the root into a single fresh chunk.
    ///
    /// Nodes are written children first, so every child and alternative has
    /// a lower index than the node that refers to it.
    #[must_use]
    pub fn compact(&self) -> Tree {
        enum Visit {
            Enter(NodeId),
            Exit(NodeId),
        }

        let generation = next_generation();
        let mut nodes = Nodes::default();
        let mut map: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut entered: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack = vec![Visit::Enter(self.root)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(id) => {
                    if !entered.insert(id) {
                        continue;
                    }
                    stack.push(Visit::Exit(id));
                    for alternative in self.alternative_ids(id).iter().rev() {
                        stack.push(Visit::Enter(*alternative));
                    }
                    for child in self.children(id).iter().rev() {
                        stack.push(Visit::Enter(child.node));
                    }
                }
                Visit::Exit(id) => {
                    let Some(info) = self.info(id) else {
                        continue;
                    };
                    let children: SmallVec<[ChildRef; 8]> = self
                        .children(id)
                        .iter()
                        .filter_map(|c| map.get(&c.node).map(|&n| ChildRef::new(n, c.offset)))
                        .collect();
                    let index = nodes.push(
                        info.symbol,
                        info.len,
                        info.flags,
                        &children,
                        NodeMeta::from_info(&info),
                    );
                    let alternatives: Vec<NodeId> = self
                        .alternative_ids(id)
                        .iter()
                        .filter_map(|a| map.get(a).copied())
                        .collect();
                    if !alternatives.is_empty() {
                        nodes.alternatives.insert(index, alternatives);
                    }
                    map.insert(id, NodeId::new(generation, index));
                }
            }
        }

        let root = map
            .get(&self.root)
            .copied()
            .unwrap_or(NodeId::new(generation, 0));
        let chunk = Arc::new(Chunk::new(generation, nodes, Vec::new()));
        Tree::from_parts(
            root,
            self.root_start,
            self.text_len,
            self.grammar.clone(),
            vec![chunk],
        )
    }

    /// Compare shape, symbols, lengths and recovery flags.
    ///
    /// Node identity, examined ranges and parse states are ignored, so a
    /// reparsed tree equals a fresh parse of the same text. Shared subtrees
    /// compare in constant time.
    pub fn structurally_eq(&self, other: &Tree) -> bool {
        if self.root_start != other.root_start || self.text_len != other.text_len {
            return false;
        }
        let mut stack = vec![(self.root, other.root)];
        while let Some((a, b)) = stack.pop() {
            if a == b {
                continue;
            }
            let (Some(x), Some(y)) = (self.info(a), other.info(b)) else {
                return false;
            };
            if x.symbol != y.symbol
                || x.len != y.len
                || (x.flags & STRUCTURAL_FLAGS) != (y.flags & STRUCTURAL_FLAGS)
            {
                return false;
            }
            let (ca, cb) = (self.children(a), other.children(b));
            if ca.len() != cb.len() {
                return false;
            }
            for (l, r) in ca.iter().zip(cb) {
                if l.offset != r.offset {
                    return false;
                }
                stack.push((l.node, r.node));
            }
        }
        true
    }

    /// Check the structural invariants.
    ///
    /// - every node id resolves and every symbol exists in the grammar
    /// - children start at the parent's start, are ordered and do not overlap
    /// - a parent's length covers its last child
    /// - the root lies within the text
    /// - `HAS_ERROR` agrees with the subtree
    pub fn verify(&self) -> Result<(), TreeError> {
        let invariant = |offset: u32, message: String| TreeError::Invariant { offset, message };

        let root = self
            .info(self.root)
            .ok_or_else(|| invariant(self.root_start.bytes, "root does not resolve".into()))?;
        if self.root_start.bytes + root.len.bytes > self.text_len.bytes {
            return Err(invariant(
                self.root_start.bytes,
                format!(
                    "root ends at {} past the text length {}",
                    self.root_start.bytes + root.len.bytes,
                    self.text_len.bytes
                ),
            ));
        }

        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack = vec![(self.root, self.root_start)];
        while let Some((id, start)) = stack.pop() {
            let info = self
                .info(id)
                .ok_or_else(|| invariant(start.bytes, format!("node {id:?} does not resolve")))?;
            if !self.grammar.is_valid_symbol(info.symbol) {
                return Err(invariant(
                    start.bytes,
                    format!("symbol {:?} is not in the grammar", info.symbol),
                ));
            }
            let children = self.children(id);
            if children.is_empty() {
                continue;
            }
            if !visited.insert(id) {
                return Err(invariant(start.bytes, format!("node {id:?} appears twice")));
            }

            let mut previous_end = 0u32;
            let mut child_errors = false;
            for (i, child) in children.iter().enumerate() {
                let child_info = self.info(child.node).ok_or_else(|| {
                    invariant(start.bytes, format!("child {:?} does not resolve", child.node))
                })?;
                let child_start = child.offset.bytes;
                if i == 0 && child_start != 0 {
                    return Err(invariant(
                        start.bytes,
                        "first child does not start at its parent".into(),
                    ));
                }
                if child_start < previous_end {
                    return Err(invariant(
                        start.bytes + child_start,
                        format!("child {i} overlaps its previous sibling"),
                    ));
                }
                previous_end = child_start + child_info.len.bytes;
                if previous_end > info.len.bytes {
                    return Err(invariant(
                        start.bytes + child_start,
                        format!("child {i} ends past its parent"),
                    ));
                }
                child_errors |= child_info.has_error();
                stack.push((child.node, start + child.offset));
            }
            if previous_end != info.len.bytes {
                return Err(invariant(
                    start.bytes,
                    "node length does not end at its last child".into(),
                ));
            }
            let own_error = info.is_error() || info.is_missing();
            if info.flags.contains(NodeFlags::HAS_ERROR) != (own_error || child_errors) {
                return Err(invariant(
                    start.bytes,
                    "error flag disagrees with the subtree".into(),
                ));
            }
        }
        Ok(())
    }

    /// S-expression of the named nodes, with field names.
    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.grammar.tag() == other.grammar.tag() && self.structurally_eq(other)
    }
}

impl Eq for Tree {}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("grammar", &self.grammar.tag().to_string())
            .field("root", &self.root)
            .field("text_len", &self.text_len)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}
