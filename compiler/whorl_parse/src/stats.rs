//! Per-parse counters.

/// What one parse or reparse did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub tokens_lexed: usize,
    /// Nodes taken from the prior tree, counting every node of a reused
    /// subtree.
    pub nodes_reused: usize,
    /// Subtrees taken from the prior tree.
    pub subtrees_reused: usize,
    pub bytes_reused: usize,
    /// Nodes allocated by this parse.
    pub nodes_created: usize,
    pub reductions: usize,
    pub forks: usize,
    pub merges: usize,
    pub peak_versions: usize,
    pub recoveries: usize,
}

impl ParseStats {
    /// Share of the tree's nodes taken from the prior tree, in percent.
    #[allow(
        clippy::cast_precision_loss,
        reason = "counts won't approach 2^52; precision loss irrelevant for display"
    )]
    pub fn reuse_rate(&self) -> f64 {
        let total = self.nodes_reused + self.nodes_created;
        if total == 0 {
            0.0
        } else {
            (self.nodes_reused as f64 / total as f64) * 100.0
        }
    }
}
