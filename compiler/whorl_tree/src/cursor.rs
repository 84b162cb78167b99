//! Stateful tree walking.

use whorl_ir::{FieldId, TextLength};

use crate::{Node, NodeId, Tree};

#[derive(Copy, Clone, Debug)]
struct Frame {
    id: NodeId,
    start: TextLength,
    /// Index among the parent's children.
    index: usize,
    /// Non-extra siblings before this one; the rule's child index.
    structural: usize,
}

/// A cursor that walks a tree keeping its path from the starting node.
///
/// Unlike [`Node`] navigation, moving to the parent or a sibling is
/// constant time.
#[derive(Clone)]
pub struct TreeCursor<'t> {
    tree: &'t Tree,
    stack: Vec<Frame>,
}

impl<'t> TreeCursor<'t> {
    pub fn new(node: Node<'t>) -> Self {
        TreeCursor {
            tree: node.tree(),
            stack: vec![Frame {
                id: node.id(),
                start: node.start(),
                index: 0,
                structural: 0,
            }],
        }
    }

    /// Restart at `node`.
    pub fn reset(&mut self, node: Node<'t>) {
        *self = TreeCursor::new(node);
    }

    fn top(&self) -> Frame {
        // The stack always holds the starting node.
        self.stack[self.stack.len() - 1]
    }

    pub fn node(&self) -> Node<'t> {
        let top = self.top();
        Node::new(self.tree, top.id, top.start)
    }

    /// Depth relative to the starting node.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn goto_first_child(&mut self) -> bool {
        let top = self.top();
        let Some(first) = self.tree.children(top.id).first() else {
            return false;
        };
        self.stack.push(Frame {
            id: first.node,
            start: top.start + first.offset,
            index: 0,
            structural: 0,
        });
        true
    }

    /// Move to the first child that ends after `byte`; returns its index.
    pub fn goto_first_child_for_byte(&mut self, byte: u32) -> Option<usize> {
        let top = self.top();
        let mut structural = 0;
        for (index, child) in self.tree.children(top.id).iter().enumerate() {
            let info = self.tree.info_or_dangling(child.node);
            let start = top.start + child.offset;
            if start.bytes + info.len.bytes > byte {
                self.stack.push(Frame {
                    id: child.node,
                    start,
                    index,
                    structural,
                });
                return Some(index);
            }
            if !info.is_extra() {
                structural += 1;
            }
        }
        None
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.stack.len() < 2 {
            return false;
        }
        let top = self.top();
        let parent = self.stack[self.stack.len() - 2];
        let Some(next) = self.tree.children(parent.id).get(top.index + 1) else {
            return false;
        };
        let structural = if self.tree.info_or_dangling(top.id).is_extra() {
            top.structural
        } else {
            top.structural + 1
        };
        let last = self.stack.len() - 1;
        self.stack[last] = Frame {
            id: next.node,
            start: parent.start + next.offset,
            index: top.index + 1,
            structural,
        };
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() < 2 {
            return false;
        }
        self.stack.pop();
        true
    }

    pub fn field_id(&self) -> Option<FieldId> {
        if self.stack.len() < 2 {
            return None;
        }
        let top = self.top();
        if self.tree.info_or_dangling(top.id).is_extra() {
            return None;
        }
        let parent = self.stack[self.stack.len() - 2];
        let rule = self.tree.info_or_dangling(parent.id).rule;
        self.tree.grammar().rule(rule)?.field_for_child(top.structural)
    }

    pub fn field_name(&self) -> Option<&'t str> {
        self.tree.grammar().field_name(self.field_id()?)
    }
}

/// Pre-order iterator over a subtree.
#[derive(Clone)]
pub struct Preorder<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> Preorder<'t> {
    pub(crate) fn new(node: Node<'t>) -> Self {
        Preorder {
            cursor: TreeCursor::new(node),
            done: false,
        }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        if !self.cursor.goto_first_child() {
            loop {
                if self.cursor.goto_next_sibling() {
                    break;
                }
                if !self.cursor.goto_parent() {
                    self.done = true;
                    break;
                }
            }
        }
        Some(node)
    }
}
