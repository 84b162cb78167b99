use std::sync::Arc;

use pretty_assertions::assert_eq;
use whorl_ir::{LexStateId, RuleId, StateId, SymbolId};

use super::*;

fn s(n: u16) -> StateId {
    StateId::new(n)
}

/// `expr := expr '+' NUMBER | NUMBER`, plus a `*` with precedence that only
/// appears in an ambiguous cell.
fn small_builder() -> GrammarBuilder {
    let mut b = GrammarBuilder::new("small");
    let number = b.terminal("number", true);
    let plus = b.terminal("+", false);
    let star = b.terminal("*", false);
    let expr = b.nonterminal("expr");
    let left = b.field("left");
    let right = b.field("right");

    let add = b.rule(
        Rule::new(expr, 3)
            .with_precedence(Precedence::left(1))
            .with_field(0, left)
            .with_field(2, right),
    );
    let single = b.rule(Rule::new(expr, 1));
    b.start(expr);
    b.precedence(plus, Precedence::left(1));
    b.precedence(star, Precedence::left(2));

    let (l0, l1, l2) = (LexStateId::new(0), LexStateId::new(1), LexStateId::new(2));
    b.separators(CharClass::chars(" \n"));
    b.set_lex_state(
        l0,
        LexState::new()
            .on(CharClass::range('0', '9'), l1)
            .on(CharClass::char('+'), l2),
    );
    b.set_lex_state(l1, LexState::new().accept(number).on(CharClass::range('0', '9'), l1));
    b.set_lex_state(l2, LexState::new().accept(plus));

    b.shift(s(0), number, s(1));
    b.goto(s(0), expr, s(2));
    b.reduce(s(1), &[SymbolId::END, plus, star], single);
    b.accept(s(2));
    b.shift(s(2), plus, s(3));
    b.shift(s(3), number, s(4));
    b.reduce(s(4), &[SymbolId::END, plus], add);
    // Ambiguous on '*': shift or reduce.
    b.shift(s(4), star, s(3));
    b.reduce(s(4), &[star], add);
    b
}

fn small() -> Grammar {
    small_builder().build().unwrap()
}

#[test]
fn symbol_table_lookups() {
    let g = small();
    assert_eq!(g.symbol_count(), 5);
    assert_eq!(g.token_count(), 4);
    assert_eq!(g.symbol_name(SymbolId::END), "end");
    assert_eq!(g.symbol_name(SymbolId::ERROR), "ERROR");
    assert_eq!(g.symbol_for_name("number", true), Some(SymbolId::new(1)));
    assert_eq!(g.symbol_for_name("+", false), Some(SymbolId::new(2)));
    assert_eq!(g.symbol_for_name("+", true), None);
    assert_eq!(g.symbol_for_name("ERROR", true), Some(SymbolId::ERROR));
    assert!(g.is_named(SymbolId::new(4)));
    assert!(!g.is_named(SymbolId::new(2)));
    assert!(g.is_token(SymbolId::new(3)));
    assert!(!g.is_token(SymbolId::new(4)));
    assert_eq!(g.start_symbol(), SymbolId::new(4));
}

#[test]
fn fields_and_rules() {
    let g = small();
    let left = g.field_id("left").unwrap();
    assert_eq!(g.field_name(left), Some("left"));
    let add = g.rule(RuleId::new(0)).unwrap();
    assert_eq!(add.rhs_len, 3);
    assert_eq!(add.field_for_child(0), Some(left));
    assert_eq!(add.field_for_child(1), None);
    assert_eq!(g.field_id("missing"), None);
}

#[test]
fn action_and_goto_lookups() {
    let g = small();
    let number = SymbolId::new(1);
    let plus = SymbolId::new(2);
    let star = SymbolId::new(3);
    let expr = SymbolId::new(4);

    assert_eq!(g.action(s(0), number), Action::Shift(s(1)));
    assert_eq!(g.action(s(0), plus), Action::Error);
    assert_eq!(g.action(s(1), plus), Action::Reduce(RuleId::new(1)));
    assert_eq!(g.action(s(2), SymbolId::END), Action::Accept);
    assert!(matches!(g.action(s(4), star), Action::AmbiguousChoice(a) if a.len() == 2));
    // Non-tokens and the error symbol have no actions.
    assert_eq!(g.action(s(0), expr), Action::Error);
    assert_eq!(g.action(s(0), SymbolId::ERROR), Action::Error);

    assert_eq!(g.goto(s(0), expr), Some(s(2)));
    assert_eq!(g.goto(s(1), expr), None);
    assert_eq!(g.goto(s(0), number), None);
    assert_eq!(g.goto(s(99), expr), None);
}

#[test]
fn grammar_resolves_ambiguous_cells() {
    let g = small();
    let star = SymbolId::new(3);
    // '*' binds tighter than the '+' rule.
    assert_eq!(
        g.resolve(g.actions(s(4), star), star),
        Some(ParseAction::Shift(s(3)))
    );
    // '+' at the same level, left associative.
    let cell = [ParseAction::Shift(s(3)), ParseAction::Reduce(RuleId::new(0))];
    assert_eq!(
        g.resolve(&cell, SymbolId::new(2)),
        Some(ParseAction::Reduce(RuleId::new(0)))
    );
}

#[test]
fn expected_tokens_skip_end_and_extras() {
    let g = small();
    let expected: Vec<_> = g.expected_tokens(s(2)).collect();
    assert_eq!(expected, vec![SymbolId::new(2)]);
    let expected: Vec<_> = g.expected_tokens(s(4)).collect();
    assert_eq!(expected, vec![SymbolId::new(2), SymbolId::new(3)]);
}

#[test]
fn lex_table_lookups() {
    let g = small();
    let mode = g.lex_mode(s(0));
    assert_eq!(mode, LexMode::default());
    let start = g.lex_state(mode.lex_state).unwrap();
    assert_eq!(start.next('7'), Some(LexStateId::new(1)));
    assert_eq!(start.next('x'), None);
    assert!(g.separators().contains(' '));
    assert_eq!(g.external_valid(0), &[] as &[bool]);
}

#[test]
fn serialization_round_trip_preserves_tag() {
    let g = small();
    let bytes = g.to_bytes().unwrap();
    let loaded = Grammar::from_bytes(&bytes).unwrap();
    assert_eq!(loaded.tag(), g.tag());
    assert_eq!(loaded.action(s(0), SymbolId::new(1)), Action::Shift(s(1)));
    assert_eq!(loaded.goto(s(0), SymbolId::new(4)), Some(s(2)));
}

#[test]
fn fingerprint_tracks_table_contents() {
    let a = small();
    let mut changed = small_builder();
    changed.shift(s(3), SymbolId::new(3), s(4));
    let b = changed.build().unwrap();
    assert_eq!(a.tag().name, b.tag().name);
    assert_ne!(a.tag().fingerprint, b.tag().fingerprint);
    assert_eq!(small().tag(), a.tag());
}

#[test]
fn from_bytes_rejects_garbage() {
    assert_eq!(Grammar::from_bytes(b"nope").unwrap_err(), GrammarError::BadMagic);

    let mut bytes = small().to_bytes().unwrap();
    bytes[8] = 99;
    assert!(matches!(
        Grammar::from_bytes(&bytes),
        Err(GrammarError::UnsupportedVersion { found: 99, .. })
    ));

    let bytes = small().to_bytes().unwrap();
    assert!(matches!(
        Grammar::from_bytes(&bytes[..bytes.len() / 2]),
        Err(GrammarError::Decode(_))
    ));
}

#[test]
fn build_rejects_tokens_after_nonterminals() {
    let mut b = small_builder();
    b.terminal("late", false);
    assert_eq!(
        b.build().unwrap_err(),
        GrammarError::SymbolOrder {
            name: "late".to_string()
        }
    );
}

#[test]
fn build_rejects_bad_references() {
    let mut b = small_builder();
    b.reduce(s(0), &[SymbolId::END], RuleId::new(40));
    assert!(matches!(
        b.build(),
        Err(GrammarError::RuleOutOfRange { rule: 40, .. })
    ));

    let mut b = small_builder();
    b.goto(s(0), SymbolId::new(1), s(1));
    assert!(matches!(b.build(), Err(GrammarError::GotoOnToken { .. })));

    let mut b = small_builder();
    b.action(s(0), SymbolId::new(4), ParseAction::ShiftExtra);
    assert!(matches!(
        b.build(),
        Err(GrammarError::ActionOnNonTerminal { .. })
    ));

    let mut b = small_builder();
    let expr = SymbolId::new(4);
    b.rule(Rule::new(expr, 1).with_field(3, whorl_ir::FieldId::new(0)));
    assert!(matches!(
        b.build(),
        Err(GrammarError::FieldOutOfRange { child_index: 3, .. })
    ));

    let mut b = small_builder();
    b.set_lex_state(
        LexStateId::new(2),
        LexState::new().on(CharClass::char('?'), LexStateId::new(9)),
    );
    assert!(matches!(
        b.build(),
        Err(GrammarError::LexStateOutOfRange { .. })
    ));
}

struct Never;

impl ExternalScanner for Never {
    fn scan(&self, _cx: &mut dyn ScanContext, _valid: &[bool]) -> Option<usize> {
        None
    }
}

#[test]
fn external_tokens_and_scanner() {
    let mut b = GrammarBuilder::new("ext");
    let word = b.terminal("word", true);
    let raw = b.external("raw", true);
    let doc = b.nonterminal("doc");
    let rule = b.rule(Rule::new(doc, 1));
    let ext = b.external_lex_state(&[raw]);
    b.set_lex_state(LexStateId::new(0), LexState::new().accept(word));
    b.lex_mode(s(0), LexMode::new(LexStateId::new(0)).with_externals(ext));
    b.shift(s(0), raw, s(1));
    b.reduce(s(1), &[SymbolId::END], rule);
    b.goto(s(0), doc, s(2));
    b.accept(s(2));
    let g = b.build().unwrap();

    assert_eq!(g.external_tokens(), &[raw]);
    assert!(g.is_external(raw));
    assert_eq!(g.external_valid(ext), &[true]);
    assert_eq!(g.external_valid(0), &[false]);
    assert!(g.external_scanner().is_none());

    let bytes = g.to_bytes().unwrap();
    let loaded = Grammar::from_bytes(&bytes)
        .unwrap()
        .with_external_scanner(Arc::new(Never));
    assert!(loaded.external_scanner().is_some());
    assert_eq!(loaded.tag(), g.tag());
}

#[test]
fn handles_compare_by_tag() {
    let a = GrammarHandle::new(small());
    let b = GrammarHandle::new(small());
    let a2 = a.clone();
    assert!(GrammarHandle::ptr_eq(&a, &a2));
    assert!(!GrammarHandle::ptr_eq(&a, &b));
    assert_eq!(a, b);
    assert_eq!(a.state_count(), 5);
    assert!(format!("{a:?}").starts_with("GrammarHandle(small@0#"));
}

#[test]
fn grammar_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Grammar>();
    assert_send_sync::<GrammarHandle>();
}
