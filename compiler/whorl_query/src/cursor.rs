//! Running queries over trees.

use std::ops::Range;

use whorl_tree::{Node, Tree, TreeCursor};

use crate::error::{QueryError, QueryErrorKind};
use crate::query::Query;
use crate::vm::Vm;

/// Matcher steps allowed for one pattern at one node.
pub const DEFAULT_MATCH_LIMIT: u32 = 64 * 1024;

/// A node bound to a capture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueryCapture<'t> {
    pub node: Node<'t>,
    /// Index into [`Query::capture_names`].
    pub index: u32,
}

/// One pattern matched at one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryMatch<'t> {
    pub pattern_index: usize,
    /// Captures in the order the pattern binds them.
    pub captures: Vec<QueryCapture<'t>>,
}

impl<'t> QueryMatch<'t> {
    pub fn nodes_for_capture(&self, index: u32) -> impl Iterator<Item = Node<'t>> + '_ {
        self.captures
            .iter()
            .filter(move |c| c.index == index)
            .map(|c| c.node)
    }
}

/// Settings for running a [`Query`].
///
/// The cursor holds no per-run state; each call to [`QueryCursor::matches`]
/// starts a fresh, independent iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryCursor {
    range: Range<u32>,
    match_limit: u32,
}

impl Default for QueryCursor {
    fn default() -> Self {
        QueryCursor {
            range: 0..u32::MAX,
            match_limit: DEFAULT_MATCH_LIMIT,
        }
    }
}

impl QueryCursor {
    pub fn new() -> Self {
        QueryCursor::default()
    }

    /// Only report matches whose node overlaps `range`.
    ///
    /// A zero-width node overlaps when it sits inside the range. An empty
    /// range matches nothing.
    pub fn set_byte_range(&mut self, range: Range<u32>) -> &mut Self {
        self.range = range;
        self
    }

    pub fn byte_range(&self) -> Range<u32> {
        self.range.clone()
    }

    /// Cap the matcher steps spent on one pattern at one node. An attempt
    /// that runs out counts as no match; see
    /// [`QueryMatches::did_exceed_match_limit`].
    pub fn set_match_limit(&mut self, limit: u32) -> &mut Self {
        self.match_limit = limit;
        self
    }

    pub fn match_limit(&self) -> u32 {
        self.match_limit
    }

    /// Matches in document order: by node in preorder, then by pattern
    /// index. Each pattern matches a node at most once.
    ///
    /// # Errors
    /// [`QueryErrorKind::GrammarMismatch`] when `tree` was built by another
    /// grammar than `query`.
    pub fn matches<'q, 't, 's>(
        &self,
        query: &'q Query,
        tree: &'t Tree,
        source: &'s [u8],
    ) -> Result<QueryMatches<'q, 't, 's>, QueryError> {
        self.matches_from(query, tree, source, 0)
    }

    /// Like [`QueryCursor::matches`], skipping matches at nodes that start
    /// before `offset`.
    ///
    /// # Errors
    /// As for [`QueryCursor::matches`].
    pub fn matches_from<'q, 't, 's>(
        &self,
        query: &'q Query,
        tree: &'t Tree,
        source: &'s [u8],
        offset: u32,
    ) -> Result<QueryMatches<'q, 't, 's>, QueryError> {
        if tree.grammar() != query.grammar() {
            return Err(QueryError::new(
                QueryErrorKind::GrammarMismatch,
                0,
                format!(
                    "query compiled for {}, tree built by {}",
                    query.grammar().tag(),
                    tree.grammar().tag()
                ),
            ));
        }
        Ok(QueryMatches {
            query,
            source,
            cursor: tree.walk(),
            range: self.range.clone(),
            resume: offset,
            limit: self.match_limit,
            current: None,
            next_pattern: 0,
            started: false,
            finished: false,
            exceeded: false,
        })
    }
}

/// Lazy iterator over the matches of a query.
///
/// Cloning it snapshots the position: the clone yields exactly the matches
/// the original has yet to yield.
#[derive(Clone)]
pub struct QueryMatches<'q, 't, 's> {
    query: &'q Query,
    source: &'s [u8],
    cursor: TreeCursor<'t>,
    range: Range<u32>,
    resume: u32,
    limit: u32,
    /// Node whose patterns are being tried.
    current: Option<Node<'t>>,
    next_pattern: usize,
    started: bool,
    finished: bool,
    exceeded: bool,
}

impl<'q, 't, 's> QueryMatches<'q, 't, 's> {
    /// Whether some attempt ran out of matcher steps. Matches may have been
    /// missed.
    pub fn did_exceed_match_limit(&self) -> bool {
        self.exceeded
    }

    /// Start byte of the node the iterator is at. Resuming from it with
    /// [`QueryCursor::matches_from`] yields no match this iterator has
    /// skipped, but may repeat matches at nodes starting at the same byte.
    pub fn resume_offset(&self) -> u32 {
        match self.current {
            Some(node) => node.start_byte(),
            None if self.finished => u32::MAX,
            None => self.resume,
        }
    }

    fn is_candidate(&self, node: Node<'_>) -> bool {
        let (start, end) = (node.start_byte(), node.end_byte());
        if start < self.resume {
            return false;
        }
        let overlaps = if start == end {
            self.range.start <= start
        } else {
            end > self.range.start
        };
        overlaps && start < self.range.end
    }

    /// Move to the next candidate node in preorder.
    fn advance(&mut self) -> Option<Node<'t>> {
        loop {
            if self.started {
                let node = self.cursor.node();
                // Subtrees ending before the range hold no candidates.
                let descend = node.end_byte() >= self.range.start;
                if !(descend && self.cursor.goto_first_child()) {
                    loop {
                        if self.cursor.goto_next_sibling() {
                            break;
                        }
                        if !self.cursor.goto_parent() {
                            return None;
                        }
                    }
                }
            }
            self.started = true;
            let node = self.cursor.node();
            // Preorder starts never decrease.
            if node.start_byte() >= self.range.end {
                return None;
            }
            if self.is_candidate(node) {
                return Some(node);
            }
        }
    }
}

impl<'t> Iterator for QueryMatches<'_, 't, '_> {
    type Item = QueryMatch<'t>;

    fn next(&mut self) -> Option<QueryMatch<'t>> {
        if self.finished {
            return None;
        }
        loop {
            let node = match self.current {
                Some(node) => node,
                None => match self.advance() {
                    Some(node) => {
                        self.current = Some(node);
                        self.next_pattern = 0;
                        node
                    }
                    None => {
                        self.finished = true;
                        return None;
                    }
                },
            };

            while self.next_pattern < self.query.pattern_count() {
                let pattern_index = self.next_pattern;
                self.next_pattern += 1;
                let mut vm = Vm::new(self.query, self.source, self.limit);
                let found = vm.match_pattern(node, pattern_index);
                if vm.exceeded {
                    self.exceeded = true;
                    tracing::debug!(pattern_index, node = ?node, "query match limit exceeded");
                }
                if let Some(captures) = found {
                    tracing::trace!(pattern_index, node = ?node, "query match");
                    return Some(QueryMatch {
                        pattern_index,
                        captures,
                    });
                }
            }
            self.current = None;
        }
    }
}
