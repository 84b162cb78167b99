//! Checked narrowing for arena indices.
//!
//! Arenas hand out `u32`/`u16` indices. A collection that outgrows the index
//! width is a capacity bug, not a recoverable condition, so these helpers
//! panic with the name of the collection that overflowed.

/// Convert a collection length to a `u32` index.
///
/// # Panics
/// Panics if `len` exceeds `u32::MAX`.
#[inline]
pub fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("too many {what}: {len} exceeds u32::MAX"))
}

/// Convert a collection length to a `u16` index.
///
/// # Panics
/// Panics if `len` exceeds `u16::MAX`.
#[inline]
pub fn to_u16(len: usize, what: &str) -> u16 {
    u16::try_from(len).unwrap_or_else(|_| panic!("too many {what}: {len} exceeds u16::MAX"))
}
