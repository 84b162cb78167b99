//! Tree cache serialization.
//!
//! Layout: the magic bytes, a little-endian `u32` format version, then the
//! bincode-encoded compacted tree together with the tag of the grammar that
//! built it. Loading checks the tag, the index structure and finally the
//! tree invariants, so a cache from another grammar revision or a corrupted
//! file is rejected instead of producing a tree that lies about its text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use whorl_grammar::{GrammarHandle, GrammarTag};
use whorl_ir::TextLength;

use crate::chunk::{next_generation, Chunk, Nodes};
use crate::{NodeId, Tree, TreeError};

const MAGIC: &[u8; 8] = b"WHRLTREE";

/// Version of the cache layout.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ImageRef<'a> {
    tag: &'a GrammarTag,
    root: u32,
    root_start: TextLength,
    text_len: TextLength,
    nodes: &'a Nodes,
}

#[derive(Deserialize)]
struct Image {
    tag: GrammarTag,
    root: u32,
    root_start: TextLength,
    text_len: TextLength,
    nodes: Nodes,
}

impl Tree {
    /// Serialize the tree for a cache.
    pub fn to_cache_bytes(&self) -> Result<Vec<u8>, TreeError> {
        let compact = self.compact();
        let nodes = compact
            .chunks()
            .first()
            .map(|c| &c.nodes)
            .ok_or(TreeError::Corrupt("compacted tree has no chunk"))?;
        let image = ImageRef {
            tag: self.grammar().tag(),
            root: compact.root_id().index,
            root_start: self.root_start(),
            text_len: self.text_len(),
            nodes,
        };
        let body = bincode::serialize(&image).map_err(|e| TreeError::Encode(e.to_string()))?;
        let mut out = Vec::with_capacity(MAGIC.len() + 4 + body.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&CACHE_FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Load a cached tree for `grammar`.
    pub fn from_cache_bytes(bytes: &[u8], grammar: GrammarHandle) -> Result<Tree, TreeError> {
        if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
            return Err(TreeError::BadMagic);
        }
        let (version, body) = bytes[MAGIC.len()..].split_at(4);
        let found = u32::from_le_bytes([version[0], version[1], version[2], version[3]]);
        if found != CACHE_FORMAT_VERSION {
            return Err(TreeError::UnsupportedVersion {
                found,
                expected: CACHE_FORMAT_VERSION,
            });
        }

        let mut image: Image =
            bincode::deserialize(body).map_err(|e| TreeError::Decode(e.to_string()))?;
        if &image.tag != grammar.tag() {
            return Err(TreeError::StaleCache {
                expected: grammar.tag().to_string(),
                found: image.tag.to_string(),
            });
        }
        check_indices(&image.nodes, image.root)?;

        let generation = next_generation();
        for child in &mut image.nodes.child_refs {
            child.node.generation = generation;
        }
        for alternatives in image.nodes.alternatives.values_mut() {
            for alternative in alternatives {
                alternative.generation = generation;
            }
        }

        let chunk = Arc::new(Chunk::new(generation, image.nodes, Vec::new()));
        let tree = Tree::from_parts(
            NodeId::new(generation, image.root),
            image.root_start,
            image.text_len,
            grammar,
            vec![chunk],
        );
        tree.verify()?;
        debug!(grammar = %tree.grammar().tag(), "loaded tree cache");
        Ok(tree)
    }
}

/// Every child and alternative must come before the node referring to it,
/// which rules out cycles.
fn check_indices(nodes: &Nodes, root: u32) -> Result<(), TreeError> {
    let count = nodes.symbols.len();
    if nodes.lens.len() != count
        || nodes.flags.len() != count
        || nodes.children.len() != count
        || nodes.meta.len() != count
    {
        return Err(TreeError::Corrupt("node arrays differ in length"));
    }
    if root as usize >= count {
        return Err(TreeError::Corrupt("root index out of range"));
    }
    for (index, &(start, len)) in nodes.children.iter().enumerate() {
        let end = u64::from(start) + u64::from(len);
        if end > nodes.child_refs.len() as u64 {
            return Err(TreeError::Corrupt("child range out of range"));
        }
        for child in &nodes.child_refs[start as usize..end as usize] {
            if child.node.index as usize >= index {
                return Err(TreeError::Corrupt("child does not precede its parent"));
            }
        }
    }
    for (&index, alternatives) in &nodes.alternatives {
        if index as usize >= count || alternatives.iter().any(|a| a.index >= index) {
            return Err(TreeError::Corrupt("alternative does not precede its node"));
        }
    }
    Ok(())
}
