//! Syntax issues recorded in a tree.
//!
//! Parsing never fails on bad input; recovery leaves `ERROR` and `MISSING`
//! nodes instead. [`syntax_issues`] reads them back as a list of issues in
//! document order and [`render_issue`] formats one for a terminal:
//!
//! ```text
//! error: missing `;`
//!  --> input.calc:1:4
//!   |
//! 1 | 1+2
//!   |    ^
//! ```

use std::fmt::Write as _;

use whorl_ir::{LineIndex, Point, Span};
use whorl_tree::{Node, Tree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueKind {
    /// Characters no token starts with.
    LexError,
    /// Input skipped by recovery.
    Unexpected,
    /// A token inserted by recovery, described by `expected`.
    Missing { expected: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub kind: IssueKind,
    pub span: Span,
    pub start: Point,
}

impl SyntaxIssue {
    fn new(kind: IssueKind, node: Node<'_>) -> Self {
        SyntaxIssue {
            kind,
            span: node.span(),
            start: node.start_position(),
        }
    }

    pub fn message(&self, source: &[u8]) -> String {
        let text = source
            .get(self.span.start as usize..self.span.end as usize)
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        match &self.kind {
            IssueKind::LexError => format!("unexpected character `{text}`"),
            IssueKind::Unexpected => format!("unexpected `{}`", abbreviate(&text)),
            IssueKind::Missing { expected } => format!("missing {expected}"),
        }
    }
}

fn abbreviate(text: &str) -> String {
    const MAX: usize = 32;
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > MAX || first_line.len() < text.len() {
        let head: String = first_line.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        first_line.to_owned()
    }
}

fn describe_missing(node: Node<'_>) -> String {
    if node.is_named() {
        node.kind().to_owned()
    } else {
        format!("`{}`", node.kind())
    }
}

/// Every syntax issue in `tree`, in document order.
///
/// Subtrees without errors are not visited. Lexical errors inside input
/// that is reported as unexpected as a whole are not reported again.
pub fn syntax_issues(tree: &Tree) -> Vec<SyntaxIssue> {
    let mut issues = Vec::new();
    let mut cursor = tree.walk();
    let mut unexpected_depth: Option<usize> = None;

    'walk: loop {
        let node = cursor.node();
        if node.is_missing() {
            issues.push(SyntaxIssue::new(
                IssueKind::Missing {
                    expected: describe_missing(node),
                },
                node,
            ));
        } else if node.is_error() && unexpected_depth.is_none() {
            if node.child_count() == 0 {
                issues.push(SyntaxIssue::new(IssueKind::LexError, node));
            } else if node
                .children()
                .any(|c| !c.is_error() || c.child_count() > 0)
            {
                issues.push(SyntaxIssue::new(IssueKind::Unexpected, node));
                unexpected_depth = Some(cursor.depth());
            }
        }

        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if unexpected_depth == Some(cursor.depth()) {
                unexpected_depth = None;
            }
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    issues
}

/// Format `issue` with the source line it points at.
pub fn render_issue(issue: &SyntaxIssue, path: &str, source: &[u8]) -> String {
    let index = LineIndex::new(source);
    let row = issue.start.row as usize;
    let line_range = index.line_range(row).unwrap_or(0..0);
    let line = source.get(line_range.clone()).unwrap_or_default();
    let line_text = String::from_utf8_lossy(line);
    let line_text = line_text.trim_end_matches('\r');

    let column = (issue.start.column as usize).min(line.len());
    let indent = String::from_utf8_lossy(&line[..column]).chars().count();
    let span_end = (issue.span.end as usize).clamp(line_range.start + column, line_range.end);
    let width = source
        .get(line_range.start + column..span_end)
        .map_or(0, |s| String::from_utf8_lossy(s).chars().count())
        .max(1);

    let number = (row + 1).to_string();
    let pad = " ".repeat(number.len());
    let mut out = String::new();
    let _ = writeln!(out, "error: {}", issue.message(source));
    let _ = writeln!(out, "{pad}--> {path}:{}:{}", row + 1, indent + 1);
    let _ = writeln!(out, "{pad} |");
    let _ = writeln!(out, "{number} | {line_text}");
    let _ = write!(out, "{pad} | {}{}", " ".repeat(indent), "^".repeat(width));
    out
}
