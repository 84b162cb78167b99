//! Finding reusable subtrees in a prior tree.
//!
//! [`ReusableNodes`] walks the prior tree in document order, in step with
//! the parser. At each position the parser asks for the chain of nodes that
//! start there: the outermost node, its first child, and so on down to a
//! leaf. Nodes the edit could have changed are filtered out by their
//! examined range `[start, end + lookahead)`: a node is kept only if that
//! range lies entirely outside the edit.
//!
//! The cursor only moves forward. Positions are old-text offsets, mapped
//! from the new text by the caller.

use smallvec::SmallVec;
use whorl_ir::incremental::ChangeMarker;
use whorl_tree::{NodeId, NodeInfo, Tree};

/// A node of the prior tree offered for reuse.
#[derive(Copy, Clone, Debug)]
pub struct Candidate {
    pub id: NodeId,
    pub info: NodeInfo,
}

/// The reusable nodes starting at one position.
#[derive(Clone, Debug)]
pub struct ReusableChain {
    /// The first leaf.
    pub leaf: Candidate,
    /// Undamaged internal nodes beginning with `leaf`, outermost first.
    pub outer: SmallVec<[Candidate; 4]>,
}

#[derive(Copy, Clone, Debug)]
struct Frame {
    id: NodeId,
    /// Old-text byte offset.
    start: u32,
    /// Index among the parent's children.
    index: usize,
}

/// Forward-only cursor over a prior tree.
pub struct ReusableNodes<'old> {
    tree: &'old Tree,
    marker: ChangeMarker,
    stack: Vec<Frame>,
}

impl<'old> ReusableNodes<'old> {
    pub fn new(tree: &'old Tree, marker: ChangeMarker) -> Self {
        ReusableNodes {
            tree,
            marker,
            stack: vec![Frame {
                id: tree.root_id(),
                start: tree.root_start().bytes,
                index: 0,
            }],
        }
    }

    pub fn marker(&self) -> &ChangeMarker {
        &self.marker
    }

    /// The reusable nodes starting at old offset `pos`.
    ///
    /// The root is never offered. Returns `None` when no non-empty node
    /// starts at `pos`, or when the first leaf there is damaged, contains an
    /// error or was built while the parse was ambiguous.
    pub fn chain_at(&mut self, pos: u32) -> Option<ReusableChain> {
        let top = self.seek(pos)?;

        let mut chain: SmallVec<[Candidate; 8]> = SmallVec::new();
        let mut id = top.id;
        loop {
            let info = self.tree.info(id)?;
            chain.push(Candidate { id, info });
            let children = self.tree.children(id);
            if children.is_empty() {
                break;
            }
            let first = children
                .iter()
                .find(|c| self.tree.info(c.node).is_some_and(|i| !i.len.is_zero()))?;
            if !first.offset.is_zero() {
                return None;
            }
            id = first.node;
        }

        let leaf = chain.pop()?;
        if !self.reusable(pos, &leaf.info) {
            return None;
        }
        let outer = chain
            .into_iter()
            .filter(|c| !c.info.is_extra() && self.reusable(pos, &c.info))
            .collect();
        Some(ReusableChain { leaf, outer })
    }

    fn reusable(&self, start: u32, info: &NodeInfo) -> bool {
        let examined_end = start
            .saturating_add(info.len.bytes)
            .saturating_add(info.lookahead_bytes);
        !info.len.is_zero()
            && !info.has_error()
            && !info.is_fragile()
            && !self.marker.damages(start, examined_end)
    }

    /// Move to the outermost non-root node starting at `pos`.
    fn seek(&mut self, pos: u32) -> Option<Frame> {
        loop {
            let top = *self.stack.last()?;
            let is_root = self.stack.len() == 1;
            let Some(info) = self.tree.info(top.id) else {
                self.step_over();
                continue;
            };
            let end = top.start.saturating_add(info.len.bytes);
            if top.start > pos {
                return None;
            }
            if top.start == pos && !info.len.is_zero() && !is_root {
                return Some(top);
            }
            if end > pos {
                if let Some(first) = self.tree.children(top.id).first() {
                    self.stack.push(Frame {
                        id: first.node,
                        start: top.start + first.offset.bytes,
                        index: 0,
                    });
                    continue;
                }
            }
            self.step_over();
        }
    }

    /// Move to the next node after the current one's subtree.
    fn step_over(&mut self) {
        while let Some(done) = self.stack.pop() {
            let Some(parent) = self.stack.last().copied() else {
                return;
            };
            if let Some(next) = self.tree.children(parent.id).get(done.index + 1) {
                self.stack.push(Frame {
                    id: next.node,
                    start: parent.start + next.offset.bytes,
                    index: done.index + 1,
                });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests;
