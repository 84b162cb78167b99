//! Whorl IR - foundation types shared by every runtime crate.
//!
//! This crate contains the small value types the rest of the runtime is
//! built from:
//! - Byte spans and row/column points
//! - Relative text lengths (so subtrees are position-independent)
//! - Compact ids for symbols, parse states, lex states, rules and fields
//! - Text edits and the change marker used to classify reusable nodes
//! - A line index for byte offset ↔ point conversion
//!
//! # Design Philosophy
//!
//! - **Index Everything**: symbols, states and nodes are small integer ids
//! - **Relative Positions**: tree nodes store lengths, never absolute offsets
//! - **Copy Semantics**: every type here is `Copy` or cheap to clone
//!
//! With the `cache` feature enabled, the value types derive `serde` traits so
//! grammar tables and tree caches can be serialized.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod arena;
mod ids;
pub mod incremental;
mod line_index;
mod position;
mod span;
pub mod stack;

pub use arena::{to_u16, to_u32};
pub use ids::{FieldId, LexStateId, RuleId, StateId, SymbolId};
pub use incremental::{ChangeMarker, InputEdit, TextChange};
pub use line_index::LineIndex;
pub use position::{Point, TextLength};
pub use span::{Span, SpanError};
