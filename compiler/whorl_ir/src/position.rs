//! Row/column points and relative text lengths.
//!
//! Tree nodes never store absolute offsets. Each node stores its own
//! [`TextLength`] and each child stores its offset from the parent's start,
//! also as a `TextLength`. Absolute positions are recovered by adding lengths
//! while walking down from the root, which is what lets a subtree be reused
//! unchanged after an edit shifts it.
//!
//! Addition follows the usual rule for text extents: if the right operand
//! spans at least one newline, its column replaces the left column; otherwise
//! the columns add.

use std::fmt;
use std::ops::{Add, Sub};

/// A zero-based row and byte column.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    /// The origin (row 0, column 0).
    pub const ZERO: Point = Point { row: 0, column: 0 };

    /// Create a new point.
    #[inline]
    pub const fn new(row: u32, column: u32) -> Self {
        Point { row, column }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

impl fmt::Display for Point {
    /// One-based `line:column`, the form used in rendered diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// A byte count paired with the row/column extent of the same text.
///
/// Used both as an absolute position (length of the text before a point) and
/// as a relative length (size of a node, offset of a child).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TextLength {
    pub bytes: u32,
    pub extent: Point,
}

impl TextLength {
    /// The empty length.
    pub const ZERO: TextLength = TextLength {
        bytes: 0,
        extent: Point::ZERO,
    };

    /// Create a new length.
    #[inline]
    pub const fn new(bytes: u32, extent: Point) -> Self {
        TextLength { bytes, extent }
    }

    /// Measure a piece of text.
    pub fn of_text(text: &[u8]) -> Self {
        let mut rows = 0u32;
        let mut last_line_start = 0usize;
        for newline in memchr::memchr_iter(b'\n', text) {
            rows += 1;
            last_line_start = newline + 1;
        }
        let bytes = u32::try_from(text.len()).unwrap_or(u32::MAX);
        let column = u32::try_from(text.len() - last_line_start).unwrap_or(u32::MAX);
        TextLength {
            bytes,
            extent: Point::new(rows, column),
        }
    }

    /// Check if the length is zero bytes.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.bytes == 0
    }
}

impl Add for TextLength {
    type Output = TextLength;

    #[inline]
    fn add(self, rhs: TextLength) -> TextLength {
        let extent = if rhs.extent.row > 0 {
            Point::new(self.extent.row + rhs.extent.row, rhs.extent.column)
        } else {
            Point::new(self.extent.row, self.extent.column + rhs.extent.column)
        };
        TextLength {
            bytes: self.bytes + rhs.bytes,
            extent,
        }
    }
}

impl Sub for TextLength {
    type Output = TextLength;

    /// Length of the text between `rhs` and `self`.
    ///
    /// Saturates instead of underflowing; callers only subtract an earlier
    /// position from a later one.
    #[inline]
    fn sub(self, rhs: TextLength) -> TextLength {
        let extent = if self.extent.row > rhs.extent.row {
            Point::new(self.extent.row - rhs.extent.row, self.extent.column)
        } else {
            Point::new(0, self.extent.column.saturating_sub(rhs.extent.column))
        };
        TextLength {
            bytes: self.bytes.saturating_sub(rhs.bytes),
            extent,
        }
    }
}

impl fmt::Debug for TextLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}b{:?}", self.bytes, self.extent)
    }
}

#[cfg(test)]
mod tests;
