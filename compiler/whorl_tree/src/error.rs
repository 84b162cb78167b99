//! Tree verification and cache errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A structural invariant does not hold.
    #[error("invalid tree at byte {offset}: {message}")]
    Invariant { offset: u32, message: String },

    /// The bytes are not a tree cache.
    #[error("not a tree cache (bad magic)")]
    BadMagic,

    #[error("unsupported tree cache format {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The cache was written for another grammar or grammar revision.
    #[error("stale tree cache: built by {found}, expected {expected}")]
    StaleCache { expected: String, found: String },

    /// The cache decoded but its node arrays are inconsistent.
    #[error("corrupt tree cache: {0}")]
    Corrupt(&'static str),

    #[error("failed to decode tree cache: {0}")]
    Decode(String),

    #[error("failed to encode tree cache: {0}")]
    Encode(String),
}
