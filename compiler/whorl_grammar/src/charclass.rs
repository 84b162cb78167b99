//! Character classes for lex transitions.

use serde::{Deserialize, Serialize};

/// A set of Unicode scalar values as sorted, non-overlapping inclusive ranges.
///
/// Membership is a binary search over the ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharClass {
    ranges: Vec<(u32, u32)>,
}

impl CharClass {
    /// The empty class.
    pub const fn empty() -> Self {
        CharClass { ranges: Vec::new() }
    }

    /// A single character.
    pub fn char(c: char) -> Self {
        CharClass::range(c, c)
    }

    /// An inclusive range of characters.
    pub fn range(lo: char, hi: char) -> Self {
        CharClass::from_ranges([(lo, hi)])
    }

    /// Any of the given characters.
    pub fn chars(chars: &str) -> Self {
        CharClass::from_ranges(chars.chars().map(|c| (c, c)))
    }

    /// Every character not in this class.
    #[must_use]
    pub fn negate(&self) -> Self {
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for &(lo, hi) in &self.ranges {
            if lo > next {
                ranges.push((next, lo - 1));
            }
            next = hi + 1;
        }
        if next <= char::MAX as u32 {
            ranges.push((next, char::MAX as u32));
        }
        CharClass { ranges }
    }

    /// Build a class from arbitrary (possibly overlapping) ranges.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (char, char)>) -> Self {
        let mut raw: Vec<(u32, u32)> = ranges
            .into_iter()
            .filter(|(lo, hi)| lo <= hi)
            .map(|(lo, hi)| (lo as u32, hi as u32))
            .collect();
        raw.sort_unstable();
        CharClass {
            ranges: coalesce(raw),
        }
    }

    /// Union of two classes.
    #[must_use]
    pub fn union(&self, other: &CharClass) -> Self {
        let mut raw = self.ranges.clone();
        raw.extend_from_slice(&other.ranges);
        raw.sort_unstable();
        CharClass {
            ranges: coalesce(raw),
        }
    }

    /// Check if the class contains a character.
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        let c = c as u32;
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < c {
                    std::cmp::Ordering::Less
                } else if lo > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The normalized ranges.
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub(crate) fn is_normalized(&self) -> bool {
        self.ranges.iter().all(|&(lo, hi)| lo <= hi)
            && self.ranges.windows(2).all(|w| w[0].1 + 1 < w[1].0)
    }
}

/// Merge sorted ranges that overlap or touch.
fn coalesce(sorted: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    let mut out: Vec<(u32, u32)> = Vec::with_capacity(sorted.len());
    for (lo, hi) in sorted {
        match out.last_mut() {
            Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
            _ => out.push((lo, hi)),
        }
    }
    out
}
