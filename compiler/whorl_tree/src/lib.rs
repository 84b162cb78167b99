//! Syntax trees for the whorl parsing runtime.
//!
//! # Layout
//!
//! Nodes live in arena chunks addressed by [`NodeId`]. A node stores its
//! own length and its children's offsets relative to itself, never absolute
//! positions. A subtree is therefore valid at any position, and an
//! incremental reparse shares unchanged subtrees with the previous tree
//! instead of copying them. The previous tree stays valid and usable.
//!
//! Parents are not stored. [`Node::parent`] finds them by descending from
//! the root; [`TreeCursor`] keeps the path for cheap upward moves.
//!
//! # Construction
//!
//! Only the parser builds trees, through [`TreeBuilder`]. Published trees
//! are immutable and `Send + Sync`.
//!
//! # Caching
//!
//! [`Tree::to_cache_bytes`] writes a compacted tree tagged with its grammar;
//! [`Tree::from_cache_bytes`] rejects caches from other grammar revisions.

mod builder;
mod cache;
mod chunk;
mod cursor;
mod error;
mod node;
mod node_id;
mod sexp;
mod tree;

pub use builder::{
    BranchSpec, LeafSpec, TreeBuilder, ERROR_COST_PER_MISSING, ERROR_COST_PER_RECOVERY,
    ERROR_COST_PER_SKIPPED_TREE, MAX_CHUNKS,
};
pub use cache::CACHE_FORMAT_VERSION;
pub use chunk::NodeInfo;
pub use cursor::{Preorder, TreeCursor};
pub use error::TreeError;
pub use node::{Children, Node};
pub use node_id::{ChildRef, NodeFlags, NodeId};
pub use tree::Tree;
