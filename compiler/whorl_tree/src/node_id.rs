//! Node handles, child references and node flags.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use whorl_ir::{static_assert_size, TextLength};

/// Address of a node: the chunk that owns it and its index in that chunk.
///
/// Chunks are never mutated after a tree is published, so a `NodeId` stays
/// valid for as long as any tree holding its chunk is alive.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub generation: u32,
    pub index: u32,
}

static_assert_size!(NodeId, 8);

impl NodeId {
    #[inline]
    pub const fn new(generation: u32, index: u32) -> Self {
        NodeId { generation, index }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}.{}", self.generation, self.index)
    }
}

/// A child slot: the child node and its offset from the parent's start.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChildRef {
    pub node: NodeId,
    pub offset: TextLength,
}

impl ChildRef {
    #[inline]
    pub const fn new(node: NodeId, offset: TextLength) -> Self {
        ChildRef { node, offset }
    }
}

bitflags! {
    /// Per-node flags.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NodeFlags: u8 {
        /// May appear anywhere (comments, skipped input).
        const EXTRA = 1 << 0;
        /// Zero-width token inserted by error recovery.
        const MISSING = 1 << 1;
        /// An `ERROR` node or an unlexable character.
        const ERROR = 1 << 2;
        /// This node or a descendant is an error or missing node.
        const HAS_ERROR = 1 << 3;
        /// Built while the parse was ambiguous; never reused.
        const FRAGILE = 1 << 4;
    }
}

impl NodeFlags {
    /// Flags a parent inherits from a child.
    #[inline]
    pub fn inherited(self) -> NodeFlags {
        let mut out = self & NodeFlags::FRAGILE;
        if self.intersects(NodeFlags::HAS_ERROR | NodeFlags::ERROR | NodeFlags::MISSING) {
            out |= NodeFlags::HAS_ERROR;
        }
        out
    }
}
