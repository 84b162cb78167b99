//! Read-only node handles.

use std::fmt;
use std::ops::Range;

use whorl_ir::{FieldId, Point, Span, SymbolId, TextLength};

use crate::{ChildRef, NodeId, NodeInfo, Preorder, Tree, TreeCursor};

/// A node together with its absolute position in one tree.
///
/// Handles are small `Copy` values borrowed from the tree. Parents are not
/// stored; [`Node::parent`] and the sibling accessors find them by
/// descending from the root. Use a [`TreeCursor`] for repeated navigation.
#[derive(Copy, Clone)]
pub struct Node<'t> {
    tree: &'t Tree,
    id: NodeId,
    start: TextLength,
    info: NodeInfo,
}

impl<'t> Node<'t> {
    pub(crate) fn new(tree: &'t Tree, id: NodeId, start: TextLength) -> Self {
        Node {
            tree,
            id,
            start,
            info: tree.info_or_dangling(id),
        }
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    // === Kind ===

    pub fn kind(&self) -> &'t str {
        self.tree.grammar().symbol_name(self.info.symbol)
    }

    pub fn kind_id(&self) -> SymbolId {
        self.info.symbol
    }

    pub fn is_named(&self) -> bool {
        self.tree.grammar().is_named(self.info.symbol)
    }

    pub fn is_extra(&self) -> bool {
        self.info.is_extra()
    }

    pub fn is_missing(&self) -> bool {
        self.info.is_missing()
    }

    pub fn is_error(&self) -> bool {
        self.info.is_error()
    }

    pub fn has_error(&self) -> bool {
        self.info.has_error()
    }

    // === Position ===

    pub fn start(&self) -> TextLength {
        self.start
    }

    pub fn end(&self) -> TextLength {
        self.start + self.info.len
    }

    pub fn start_byte(&self) -> u32 {
        self.start.bytes
    }

    pub fn end_byte(&self) -> u32 {
        self.start.bytes + self.info.len.bytes
    }

    pub fn start_position(&self) -> Point {
        self.start.extent
    }

    pub fn end_position(&self) -> Point {
        self.end().extent
    }

    pub fn span(&self) -> Span {
        Span::new(self.start_byte(), self.end_byte())
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.span().to_range()
    }

    /// The node's text, if `source` is the text the tree was parsed from.
    pub fn utf8_text<'s>(&self, source: &'s [u8]) -> Option<&'s str> {
        std::str::from_utf8(source.get(self.byte_range())?).ok()
    }

    // === Children ===

    pub fn child_count(&self) -> usize {
        self.tree.children(self.id).len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.tree
            .children(self.id)
            .get(index)
            .map(|c| self.child_node(c))
    }

    fn child_node(&self, child: &ChildRef) -> Node<'t> {
        Node::new(self.tree, child.node, self.start + child.offset)
    }

    pub fn children(&self) -> Children<'t> {
        Children {
            tree: self.tree,
            start: self.start,
            refs: self.tree.children(self.id).iter(),
        }
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> {
        self.children().filter(Node::is_named)
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'t>> {
        self.named_children().nth(index)
    }

    /// Field of each child; extras never carry one.
    pub fn child_fields(&self) -> impl Iterator<Item = (Node<'t>, Option<FieldId>)> + 't {
        let rule = self.tree.grammar().rule(self.info.rule);
        let mut structural = 0usize;
        self.children().map(move |child| {
            if child.is_extra() {
                return (child, None);
            }
            let field = rule.and_then(|r| r.field_for_child(structural));
            structural += 1;
            (child, field)
        })
    }

    pub fn child_by_field_id(&self, field: FieldId) -> Option<Node<'t>> {
        self.child_fields()
            .find(|(_, f)| *f == Some(field))
            .map(|(child, _)| child)
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'t>> {
        self.child_by_field_id(self.tree.grammar().field_id(name)?)
    }

    pub fn children_by_field_name(&self, name: &str) -> Vec<Node<'t>> {
        let Some(field) = self.tree.grammar().field_id(name) else {
            return Vec::new();
        };
        self.child_fields()
            .filter(|(_, f)| *f == Some(field))
            .map(|(child, _)| child)
            .collect()
    }

    pub fn field_name_for_child(&self, index: usize) -> Option<&'t str> {
        let (_, field) = self.child_fields().nth(index)?;
        self.tree.grammar().field_name(field?)
    }

    // === Family ===

    pub fn parent(&self) -> Option<Node<'t>> {
        let (id, start) = self.tree.parent_of(self.id, self.start)?;
        Some(Node::new(self.tree, id, start))
    }

    /// Siblings including this node, and this node's index among them.
    fn siblings(&self) -> Option<(Node<'t>, usize)> {
        let parent = self.parent()?;
        let index = parent
            .children()
            .position(|c| c.id == self.id && c.start.bytes == self.start.bytes)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.siblings()?;
        parent.child(index + 1)
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.siblings()?;
        parent.child(index.checked_sub(1)?)
    }

    pub fn next_named_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.siblings()?;
        parent.children().skip(index + 1).find(Node::is_named)
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.siblings()?;
        parent
            .children()
            .take(index)
            .filter(Node::is_named)
            .last()
    }

    /// Smallest node within this one that spans `start..end`.
    pub fn descendant_for_byte_range(&self, start: u32, end: u32) -> Option<Node<'t>> {
        self.descend(start, end, false)
    }

    /// Smallest named node within this one that spans `start..end`.
    pub fn named_descendant_for_byte_range(&self, start: u32, end: u32) -> Option<Node<'t>> {
        self.descend(start, end, true)
    }

    fn descend(&self, start: u32, end: u32, named: bool) -> Option<Node<'t>> {
        if start > end || start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = *self;
        let mut last_named = self.is_named().then_some(*self);
        'descend: loop {
            for child in node.children() {
                let covers = child.start_byte() <= start && end <= child.end_byte();
                // Prefer non-empty children; a zero-width node only spans an empty range.
                if covers && (child.end_byte() > child.start_byte() || start == end) {
                    node = child;
                    if child.is_named() {
                        last_named = Some(child);
                    }
                    continue 'descend;
                }
            }
            break;
        }
        if named {
            last_named
        } else {
            Some(node)
        }
    }

    /// Other parses of the same text found when GLR branches were merged.
    pub fn alternatives(&self) -> Vec<Node<'t>> {
        self.tree
            .alternative_ids(self.id)
            .iter()
            .map(|&id| Node::new(self.tree, id, self.start))
            .collect()
    }

    // === Traversal ===

    pub fn walk(&self) -> TreeCursor<'t> {
        TreeCursor::new(*self)
    }

    pub fn preorder(&self) -> Preorder<'t> {
        Preorder::new(*self)
    }

    pub fn descendant_count(&self) -> u32 {
        self.info.descendant_count
    }

    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        crate::sexp::write_sexp(*self, None, &mut out);
        out
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id && self.start == other.start
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Node {} {}}}", self.kind(), self.span())
    }
}

/// Iterator over a node's children.
#[derive(Clone)]
pub struct Children<'t> {
    tree: &'t Tree,
    start: TextLength,
    refs: std::slice::Iter<'t, ChildRef>,
}

impl<'t> Iterator for Children<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        let child = self.refs.next()?;
        Some(Node::new(self.tree, child.node, self.start + child.offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.refs.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

impl<'t> DoubleEndedIterator for Children<'t> {
    fn next_back(&mut self) -> Option<Node<'t>> {
        let child = self.refs.next_back()?;
        Some(Node::new(self.tree, child.node, self.start + child.offset))
    }
}
