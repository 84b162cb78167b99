//! Parse actions and static conflict resolution.

use serde::{Deserialize, Serialize};
use whorl_ir::{RuleId, StateId};

use crate::{Assoc, Precedence};

/// One entry of an action-table cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseAction {
    /// Consume the lookahead and enter the state.
    Shift(StateId),
    /// Consume an extra token without changing state.
    ShiftExtra,
    /// Reduce by the rule, keeping the lookahead.
    Reduce(RuleId),
    /// The input is a complete start symbol.
    Accept,
}

/// Result of an action-table lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action<'g> {
    Shift(StateId),
    ShiftExtra,
    Reduce(RuleId),
    Accept,
    /// No action: the lookahead is a syntax error in this state.
    Error,
    /// The cell holds more than one action.
    AmbiguousChoice(&'g [ParseAction]),
}

impl<'g> Action<'g> {
    /// Interpret a table cell.
    pub fn from_cell(cell: &'g [ParseAction]) -> Self {
        match cell {
            [] => Action::Error,
            [single] => Action::from(*single),
            many => Action::AmbiguousChoice(many),
        }
    }
}

impl From<ParseAction> for Action<'_> {
    fn from(action: ParseAction) -> Self {
        match action {
            ParseAction::Shift(state) => Action::Shift(state),
            ParseAction::ShiftExtra => Action::ShiftExtra,
            ParseAction::Reduce(rule) => Action::Reduce(rule),
            ParseAction::Accept => Action::Accept,
        }
    }
}

/// Pick one action out of an ambiguous cell using yacc rules.
///
/// - Accept always wins.
/// - Among reductions, the higher rule precedence wins, then the lower rule id.
/// - Shift against reduce: the higher precedence wins. At equal levels the
///   associativity decides: left reduces, right shifts, non-associative is a
///   syntax error (`None`).
/// - Without precedence on both sides, shift is preferred.
pub fn resolve(
    actions: &[ParseAction],
    lookahead_precedence: Option<Precedence>,
    rule_precedence: impl Fn(RuleId) -> Option<Precedence>,
) -> Option<ParseAction> {
    if actions.contains(&ParseAction::Accept) {
        return Some(ParseAction::Accept);
    }

    let shift = actions
        .iter()
        .copied()
        .find(|a| matches!(a, ParseAction::Shift(_)))
        .or_else(|| actions.iter().copied().find(|a| *a == ParseAction::ShiftExtra));

    let reduce = actions
        .iter()
        .filter_map(|a| match a {
            ParseAction::Reduce(rule) => Some(*rule),
            _ => None,
        })
        .min_by_key(|&rule| {
            let level = rule_precedence(rule).map_or(i32::MIN, |p| i32::from(p.level));
            (std::cmp::Reverse(level), rule)
        });

    match (shift, reduce) {
        (None, None) => None,
        (Some(shift), None) => Some(shift),
        (None, Some(rule)) => Some(ParseAction::Reduce(rule)),
        (Some(shift), Some(rule)) => match (lookahead_precedence, rule_precedence(rule)) {
            (Some(token), Some(prod)) => {
                if token.level > prod.level {
                    Some(shift)
                } else if token.level < prod.level {
                    Some(ParseAction::Reduce(rule))
                } else {
                    match prod.assoc {
                        Assoc::Left => Some(ParseAction::Reduce(rule)),
                        Assoc::Right => Some(shift),
                        Assoc::NonAssoc => None,
                    }
                }
            }
            _ => Some(shift),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prec(rule: RuleId) -> Option<Precedence> {
        match rule.raw() {
            // + at level 1, * at level 2, = right-assoc at 0, == non-assoc at 3
            1 => Some(Precedence::left(1)),
            2 => Some(Precedence::left(2)),
            3 => Some(Precedence::right(0)),
            4 => Some(Precedence::non_assoc(3)),
            _ => None,
        }
    }

    fn cell(shift_to: u16, rule: u16) -> [ParseAction; 2] {
        [
            ParseAction::Shift(StateId::new(shift_to)),
            ParseAction::Reduce(RuleId::new(rule)),
        ]
    }

    #[test]
    fn higher_token_precedence_shifts() {
        // 1 + 2 . * 3
        let chosen = resolve(&cell(9, 1), Some(Precedence::left(2)), prec);
        assert_eq!(chosen, Some(ParseAction::Shift(StateId::new(9))));
    }

    #[test]
    fn higher_rule_precedence_reduces() {
        // 1 * 2 . + 3
        let chosen = resolve(&cell(9, 2), Some(Precedence::left(1)), prec);
        assert_eq!(chosen, Some(ParseAction::Reduce(RuleId::new(2))));
    }

    #[test]
    fn equal_levels_use_associativity() {
        let left = resolve(&cell(9, 1), Some(Precedence::left(1)), prec);
        assert_eq!(left, Some(ParseAction::Reduce(RuleId::new(1))));

        let right = resolve(&cell(9, 3), Some(Precedence::right(0)), prec);
        assert_eq!(right, Some(ParseAction::Shift(StateId::new(9))));

        let none = resolve(&cell(9, 4), Some(Precedence::non_assoc(3)), prec);
        assert_eq!(none, None);
    }

    #[test]
    fn missing_precedence_prefers_shift() {
        let chosen = resolve(&cell(9, 7), Some(Precedence::left(1)), prec);
        assert_eq!(chosen, Some(ParseAction::Shift(StateId::new(9))));
        let chosen = resolve(&cell(9, 1), None, prec);
        assert_eq!(chosen, Some(ParseAction::Shift(StateId::new(9))));
    }

    #[test]
    fn reduce_reduce_prefers_precedence_then_lower_rule() {
        let actions = [
            ParseAction::Reduce(RuleId::new(8)),
            ParseAction::Reduce(RuleId::new(7)),
        ];
        assert_eq!(
            resolve(&actions, None, prec),
            Some(ParseAction::Reduce(RuleId::new(7)))
        );

        let actions = [
            ParseAction::Reduce(RuleId::new(0)),
            ParseAction::Reduce(RuleId::new(2)),
        ];
        assert_eq!(
            resolve(&actions, None, prec),
            Some(ParseAction::Reduce(RuleId::new(2)))
        );
    }

    #[test]
    fn cell_interpretation() {
        assert_eq!(Action::from_cell(&[]), Action::Error);
        assert_eq!(
            Action::from_cell(&[ParseAction::Accept]),
            Action::Accept
        );
        let both = cell(1, 1);
        assert_eq!(Action::from_cell(&both), Action::AmbiguousChoice(&both));
    }
}
