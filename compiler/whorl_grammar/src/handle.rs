//! The shared, opaque grammar handle.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::Grammar;

/// Cheaply clonable reference to an immutable [`Grammar`].
///
/// Handles compare equal when their grammars carry the same tag.
#[derive(Clone)]
pub struct GrammarHandle(Arc<Grammar>);

impl GrammarHandle {
    pub fn new(grammar: Grammar) -> Self {
        GrammarHandle(Arc::new(grammar))
    }

    /// Whether two handles share the same allocation.
    pub fn ptr_eq(a: &GrammarHandle, b: &GrammarHandle) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for GrammarHandle {
    type Target = Grammar;

    #[inline]
    fn deref(&self) -> &Grammar {
        &self.0
    }
}

impl From<Grammar> for GrammarHandle {
    fn from(grammar: Grammar) -> Self {
        GrammarHandle::new(grammar)
    }
}

impl PartialEq for GrammarHandle {
    fn eq(&self, other: &Self) -> bool {
        GrammarHandle::ptr_eq(self, other) || self.tag() == other.tag()
    }
}

impl Eq for GrammarHandle {}

impl fmt::Debug for GrammarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GrammarHandle({})", self.tag())
    }
}
