use pretty_assertions::assert_eq;
use whorl_grammar::{Action, ExternalScanner, ParseAction, ScanContext};
use whorl_ir::{RuleId, StateId, SymbolId};

use super::*;

/// Minimal in-memory scan context.
struct Chars {
    chars: Vec<char>,
    pos: usize,
    start: usize,
    end: Option<usize>,
}

impl Chars {
    fn new(text: &str) -> Self {
        Chars {
            chars: text.chars().collect(),
            pos: 0,
            start: 0,
            end: None,
        }
    }

    fn token(&self) -> String {
        self.chars[self.start..self.end.unwrap_or(self.pos)]
            .iter()
            .collect()
    }
}

impl ScanContext for Chars {
    fn lookahead(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
    fn advance(&mut self) {
        self.pos += 1;
    }
    fn skip(&mut self) {
        self.pos += 1;
        self.start = self.pos;
    }
    fn mark_end(&mut self) {
        self.end = Some(self.pos);
    }
    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
    fn column(&self) -> u32 {
        self.pos as u32
    }
}

fn scan(text: &str) -> Option<String> {
    let mut cx = Chars::new(text);
    RawStringScanner
        .scan(&mut cx, &[true])
        .map(|_| cx.token())
}

#[test]
fn builtin_grammars_build() {
    assert!(build_sum().is_ok());
    assert!(build_calc().is_ok());
    assert_eq!(sum_grammar().name(), "sum");
    assert_eq!(calc_grammar().name(), "calc");
    assert!(grammar_by_name("nope").is_none());
    for name in GRAMMAR_NAMES {
        assert_eq!(grammar_by_name(name).unwrap().name(), *name);
    }
}

#[test]
fn accessors_return_shared_handles() {
    assert!(GrammarHandle::ptr_eq(&calc_grammar(), &calc_grammar()));
}

#[test]
fn sum_grammar_shape() {
    let g = sum_grammar();
    assert_eq!(g.state_count(), 7);
    assert_eq!(g.symbol_name(SymbolId::new(1)), "number");
    assert_eq!(g.start_symbol(), SymbolId::new(4));
    assert_eq!(g.action(StateId::new(2), SymbolId::END), Action::Accept);
    assert_eq!(
        g.action(StateId::new(5), SymbolId::new(2)),
        Action::Reduce(RuleId::new(0))
    );
    assert_eq!(g.field_id("operator").map(|f| f.raw()), Some(1));
}

#[test]
fn calc_grammar_shape() {
    let g = calc_grammar();
    assert_eq!(g.state_count(), 17);
    assert_eq!(g.token_count(), 11);
    let comment = g.symbol_for_name("comment", true).unwrap();
    let raw = g.symbol_for_name("raw_string", true).unwrap();
    let star = g.symbol_for_name("*", false).unwrap();
    assert!(g.is_extra(comment));
    assert!(g.is_external(raw));
    assert_eq!(g.external_tokens(), &[raw]);

    // Comments shift as extras everywhere.
    for state in 0..17 {
        assert_eq!(g.action(StateId::new(state), comment), Action::ShiftExtra);
    }
    // Raw strings are only lexed where they can appear.
    assert_ne!(g.lex_mode(StateId::new(1)).external_lex_state, 0);
    assert_eq!(g.lex_mode(StateId::new(7)).external_lex_state, 0);

    // `1 + 2 . * 3` shifts, `1 * 2 . * 3` reduces.
    let in_add = g.actions(StateId::new(14), star);
    assert_eq!(g.resolve(in_add, star), Some(ParseAction::Shift(StateId::new(12))));
    let in_mul = g.actions(StateId::new(16), star);
    assert_eq!(g.resolve(in_mul, star), Some(ParseAction::Reduce(RuleId::new(5))));
}

#[test]
fn serialized_tables_reload_with_scanner() {
    let bytes = calc_grammar().to_bytes().unwrap();
    let loaded = load_grammar(&bytes).unwrap();
    assert_eq!(loaded.tag(), calc_grammar().tag());
    assert!(loaded.external_scanner().is_some());
    assert!(scanner_for("sum").is_none());
}

#[test]
fn raw_string_scanner() {
    assert_eq!(scan(r#"r"abc""#), Some(r#"r"abc""#.to_string()));
    assert_eq!(scan(r###"r##"a"#b"## rest"###), Some(r###"r##"a"#b"##"###.to_string()));
    assert_eq!(scan(r##"  r#"x"# "##), Some(r##"r#"x"#"##.to_string()));
    // Not raw strings.
    assert_eq!(scan("rate"), None);
    assert_eq!(scan(r#"r#"unterminated"#), None);
    assert_eq!(scan("x"), None);
}

#[test]
fn raw_string_scanner_respects_validity() {
    let mut cx = Chars::new(r#"r"a""#);
    assert_eq!(RawStringScanner.scan(&mut cx, &[false]), None);
}
