//! Absolute byte ranges.
//!
//! Trees store relative lengths; a `Span` is what a node, token or
//! diagnostic reports once its absolute position is known.

use std::fmt;
use std::ops::Range;

/// A `usize` range that does not fit in 32-bit offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanError {
    pub range: Range<usize>,
}

impl fmt::Display for SpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "byte range {}..{} does not fit in 32-bit offsets",
            self.range.start, self.range.end
        )
    }
}

impl std::error::Error for SpanError {}

/// Half-open byte range `start..end` into the text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Zero-width span at `offset`, as used for missing nodes.
    #[inline]
    pub const fn point(offset: u32) -> Span {
        Span::new(offset, offset)
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether the byte at `offset` lies inside. The end is exclusive, so an
    /// empty span contains nothing.
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        (self.start..self.end).contains(&offset)
    }

    /// Whether `inner` lies within this span; edges may coincide.
    #[inline]
    pub fn contains_span(&self, inner: Span) -> bool {
        inner.start >= self.start && inner.end <= self.end
    }

    /// Smallest span covering both; the span of a node from its children.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl TryFrom<Range<usize>> for Span {
    type Error = SpanError;

    fn try_from(range: Range<usize>) -> Result<Self, SpanError> {
        match (u32::try_from(range.start), u32::try_from(range.end)) {
            (Ok(start), Ok(end)) => Ok(Span::new(start, end)),
            _ => Err(SpanError { range }),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

crate::static_assert_size!(Span, 8);
