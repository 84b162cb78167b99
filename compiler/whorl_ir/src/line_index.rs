//! Byte offset ↔ row/column conversion.

use crate::Point;

/// Start offsets of every line in a text.
///
/// Built once per text; lookups are a binary search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    /// Index the lines of `text`.
    pub fn new(text: &[u8]) -> Self {
        let mut line_starts = Vec::with_capacity(text.len() / 32 + 1);
        line_starts.push(0);
        for newline in memchr::memchr_iter(b'\n', text) {
            line_starts.push(crate::to_u32(newline + 1, "bytes in text"));
        }
        LineIndex {
            line_starts,
            len: crate::to_u32(text.len(), "bytes in text"),
        }
    }

    /// Number of lines (a trailing newline starts an empty last line).
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Point of a byte offset. Offsets past the end clamp to the end.
    pub fn point(&self, offset: u32) -> Point {
        let offset = offset.min(self.len);
        let row = match self.line_starts.binary_search(&offset) {
            Ok(row) => row,
            Err(next) => next - 1,
        };
        Point::new(
            crate::to_u32(row, "lines"),
            offset - self.line_starts[row],
        )
    }

    /// Byte offset of a point, or `None` if the row does not exist.
    ///
    /// Columns past the end of the line clamp to the line end.
    pub fn offset(&self, point: Point) -> Option<u32> {
        let row = point.row as usize;
        let start = *self.line_starts.get(row)?;
        let end = self.line_end(row);
        Some((start + point.column).min(end))
    }

    /// Byte range of a line, excluding its terminating newline.
    pub fn line_range(&self, row: usize) -> Option<std::ops::Range<usize>> {
        let start = *self.line_starts.get(row)?;
        Some(start as usize..self.line_end(row) as usize)
    }

    fn line_end(&self, row: usize) -> u32 {
        match self.line_starts.get(row + 1) {
            Some(&next) => next - 1,
            None => self.len,
        }
    }
}
