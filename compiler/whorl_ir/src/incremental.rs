//! Text edits and the old/new coordinate mapping used by reparsing.
//!
//! Types for describing text edits and deciding which parts of a prior tree
//! an edit affects.
//!
//! # Architecture
//!
//! 1. **Text Change** - a byte edit: `[start, old_end)` in the old text is
//!    replaced by `new_len` bytes.
//! 2. **Input Edit** - the same edit with row/column points, as editors
//!    report it.
//! 3. **Change Marker** - classifies prior-tree nodes as damaged or reusable
//!    and maps positions between old and new text.
//!
//! Damage is decided on a node's *examined* range, `[start, end + lookahead)`,
//! not its span: a token whose lexing peeked at bytes the edit touched may
//! lex differently now, even if its own bytes are unchanged.

use crate::{Point, TextLength};

/// A single byte edit.
///
/// Represents a change to a text where the region `[start, old_end)` in the
/// old text is replaced with `new_len` bytes of new text.
///
/// # Examples
///
/// ```
/// use whorl_ir::incremental::TextChange;
///
/// // Insert "hello" at position 10
/// let insert = TextChange::insert(10, 5);
/// assert_eq!(insert.delta(), 5);
///
/// // Delete 3 bytes starting at position 5
/// let delete = TextChange::delete(5, 3);
/// assert_eq!(delete.delta(), -3);
///
/// // Replace "foo" (3 bytes) with "hello" (5 bytes) at position 0
/// let replace = TextChange::replace(0, 3, 5);
/// assert_eq!(replace.delta(), 2);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TextChange {
    /// Start byte offset in old text.
    pub start: u32,
    /// End byte offset in old text (exclusive).
    pub old_end: u32,
    /// Length of replacement text in bytes.
    pub new_len: u32,
}

impl TextChange {
    /// Replace `start..old_end` with `new_len` bytes.
    #[inline]
    pub const fn new(start: u32, old_end: u32, new_len: u32) -> Self {
        TextChange {
            start,
            old_end,
            new_len,
        }
    }

    /// Create an insertion (no bytes removed).
    #[inline]
    pub const fn insert(at: u32, len: u32) -> Self {
        TextChange {
            start: at,
            old_end: at,
            new_len: len,
        }
    }

    /// Create a deletion (no bytes inserted).
    #[inline]
    pub const fn delete(start: u32, len: u32) -> Self {
        TextChange {
            start,
            old_end: start + len,
            new_len: 0,
        }
    }

    /// Create a replacement.
    #[inline]
    pub const fn replace(start: u32, old_len: u32, new_len: u32) -> Self {
        TextChange {
            start,
            old_end: start + old_len,
            new_len,
        }
    }

    /// Growth of the text in bytes; negative when it shrank.
    #[inline]
    pub fn delta(&self) -> i64 {
        i64::from(self.new_len) - i64::from(self.old_end - self.start)
    }

    /// Length of the removed region in the old text.
    #[inline]
    pub const fn old_len(&self) -> u32 {
        self.old_end - self.start
    }

    /// New end position after the change is applied.
    #[inline]
    pub const fn new_end(&self) -> u32 {
        self.start + self.new_len
    }

    /// An edit that removes nothing and inserts nothing.
    #[inline]
    pub const fn is_noop(&self) -> bool {
        self.start == self.old_end && self.new_len == 0
    }

    /// Merge `next`, expressed in the coordinates of the text *after* `self`,
    /// into one change over the original text.
    ///
    /// The result covers both edits; bytes between them that neither edit
    /// touched are treated as replaced, which is conservative but exact.
    #[must_use]
    pub fn compose(self, next: TextChange) -> TextChange {
        let first_new_end = i64::from(self.new_end());
        let start = self.start.min(next.start);
        let mid_end = first_new_end.max(i64::from(next.old_end));

        // Map the end of the combined region back to original coordinates.
        let old_end = if i64::from(next.old_end) > first_new_end {
            i64::from(next.old_end) - self.delta()
        } else {
            i64::from(self.old_end)
        };
        let final_end = mid_end + next.delta();

        TextChange {
            start,
            old_end: clamp_u32(old_end),
            new_len: clamp_u32(final_end - i64::from(start)),
        }
    }
}

#[allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "clamped to the u32 range first"
)]
fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// A text edit with row/column points.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct InputEdit {
    pub start_byte: u32,
    pub old_end_byte: u32,
    pub new_end_byte: u32,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl InputEdit {
    /// Attach points to a byte change, measuring them in the two texts.
    ///
    /// Offsets past the end of a text are clamped.
    pub fn from_change(change: TextChange, old_text: &[u8], new_text: &[u8]) -> Self {
        let start = (change.start as usize).min(old_text.len());
        let old_end = (change.old_end as usize).clamp(start, old_text.len());
        let new_end = (change.new_end() as usize).min(new_text.len());
        InputEdit {
            start_byte: change.start,
            old_end_byte: change.old_end,
            new_end_byte: change.new_end(),
            start_point: TextLength::of_text(&old_text[..start]).extent,
            old_end_point: TextLength::of_text(&old_text[..old_end]).extent,
            new_end_point: TextLength::of_text(&new_text[..new_end]).extent,
        }
    }

    /// The smallest edit turning `old_text` into `new_text`.
    ///
    /// Strips the common prefix, then the common suffix of what remains.
    pub fn from_texts(old_text: &[u8], new_text: &[u8]) -> Self {
        let prefix = old_text
            .iter()
            .zip(new_text)
            .take_while(|(a, b)| a == b)
            .count();
        let suffix = old_text[prefix..]
            .iter()
            .rev()
            .zip(new_text[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        let change = TextChange::new(
            crate::to_u32(prefix, "bytes in text"),
            crate::to_u32(old_text.len() - suffix, "bytes in text"),
            crate::to_u32(new_text.len() - suffix - prefix, "bytes in text"),
        );
        InputEdit::from_change(change, old_text, new_text)
    }

    /// The byte-only form of this edit.
    #[inline]
    pub fn change(&self) -> TextChange {
        TextChange::new(
            self.start_byte,
            self.old_end_byte,
            self.new_end_byte.saturating_sub(self.start_byte),
        )
    }
}

impl From<InputEdit> for TextChange {
    fn from(edit: InputEdit) -> Self {
        edit.change()
    }
}

/// Tracks which nodes of a prior tree an edit affects.
///
/// The marker is the edited region `[affected_start, affected_end)` in old
/// coordinates plus the length delta. Nodes whose examined range meets the
/// region must be re-parsed; every other node can be reused, shifted by
/// `delta` if it lies after the region.
///
/// # Examples
///
/// ```
/// use whorl_ir::incremental::{ChangeMarker, TextChange};
///
/// let change = TextChange::replace(100, 10, 15);
/// let marker = ChangeMarker::from_change(&change);
///
/// // Positions before the change region are unchanged
/// assert_eq!(marker.adjust_position(50), 50);
///
/// // Positions after the change region are shifted by delta
/// assert_eq!(marker.adjust_position(200), 205);
///
/// // A new-text position maps back only if it lies outside the new region
/// assert_eq!(marker.old_position(120), Some(115));
/// assert_eq!(marker.old_position(105), None);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChangeMarker {
    /// Start of the affected region in the old text.
    pub affected_start: u32,
    /// End of the affected region in the old text.
    pub affected_end: u32,
    /// Position adjustment delta for positions after the affected region.
    pub delta: i64,
}

impl ChangeMarker {
    /// Create a marker for a text change.
    #[inline]
    pub fn from_change(change: &TextChange) -> Self {
        ChangeMarker {
            affected_start: change.start,
            affected_end: change.old_end,
            delta: change.delta(),
        }
    }

    /// End of the affected region in the new text.
    #[inline]
    pub fn new_end(&self) -> u32 {
        clamp_u32(i64::from(self.affected_end) + self.delta)
    }

    /// Whether a node starting at `start` whose lexing examined bytes up to
    /// `examined_end` (exclusive) is invalidated by the edit.
    ///
    /// For a pure insertion the node is damaged only if the insertion point
    /// falls strictly inside its examined range: text inserted at a node's
    /// start lands before it, and text inserted at its examined end was never
    /// looked at.
    #[inline]
    pub fn damages(&self, start: u32, examined_end: u32) -> bool {
        let (s, e) = (self.affected_start, self.affected_end);
        if s < e {
            start < e && s < examined_end
        } else {
            start < s && s < examined_end
        }
    }

    /// Adjust a position from old text to new text.
    ///
    /// - Positions strictly before the affected region: unchanged
    /// - Positions at or after the affected end: shifted by delta
    /// - Positions inside the affected region: returned unchanged; they have
    ///   no counterpart in the new text and callers must not rely on them
    #[inline]
    pub fn adjust_position(&self, pos: u32) -> u32 {
        if pos < self.affected_start {
            pos
        } else if pos >= self.affected_end {
            clamp_u32(i64::from(pos) + self.delta)
        } else {
            pos
        }
    }

    /// Map a position in the new text back to the old text.
    ///
    /// Returns `None` for positions inside the inserted region, which have
    /// no old counterpart.
    #[inline]
    pub fn old_position(&self, new_pos: u32) -> Option<u32> {
        if new_pos < self.affected_start {
            Some(new_pos)
        } else if new_pos >= self.new_end() {
            Some(clamp_u32(i64::from(new_pos) - self.delta))
        } else {
            None
        }
    }
}
