//! Production rules.

use serde::{Deserialize, Serialize};
use whorl_ir::{FieldId, SymbolId};

use crate::Precedence;

/// A field name attached to one structural child of a rule.
///
/// `child_index` counts the rule's right-hand-side positions; extras that
/// end up between children are not counted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMapping {
    pub child_index: u16,
    pub field: FieldId,
}

/// A production `lhs → rhs` where only the right-hand side's length matters
/// to the runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub lhs: SymbolId,
    pub rhs_len: u16,
    pub precedence: Option<Precedence>,
    /// Preference between ambiguous parses; the higher total wins a merge.
    pub dynamic_precedence: i16,
    pub fields: Vec<FieldMapping>,
}

impl Rule {
    pub fn new(lhs: SymbolId, rhs_len: u16) -> Self {
        Rule {
            lhs,
            rhs_len,
            precedence: None,
            dynamic_precedence: 0,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = Some(precedence);
        self
    }

    #[must_use]
    pub fn with_dynamic_precedence(mut self, value: i16) -> Self {
        self.dynamic_precedence = value;
        self
    }

    #[must_use]
    pub fn with_field(mut self, child_index: u16, field: FieldId) -> Self {
        self.fields.push(FieldMapping { child_index, field });
        self
    }

    /// Field of the `index`-th structural child, if any.
    #[inline]
    pub fn field_for_child(&self, index: usize) -> Option<FieldId> {
        self.fields
            .iter()
            .find(|m| usize::from(m.child_index) == index)
            .map(|m| m.field)
    }
}
