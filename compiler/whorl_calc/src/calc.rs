//! A small calculator language.
//!
//! ```text
//! program   := program statement | ε
//! statement := expr ';'
//! expr      := expr '+' expr | expr '-' expr | expr '*' expr
//!            | '(' expr ')' | number | identifier | raw_string
//! ```
//!
//! `#` starts a comment running to the end of the line; comments are extras.
//! `*` binds tighter than `+` and `-`; all three are left associative. The
//! binary-operator states keep both the shift and the reduce in their cells,
//! so the grammar parses with precedence resolution or, in GLR mode, by
//! exploring both readings.
//!
//! Raw strings `r"…"`, `r#"…"#`, `r##"…"##`, … close with the same number
//! of hashes they open with, which a DFA cannot express; they are recognised
//! by [`RawStringScanner`](crate::RawStringScanner).
//!
//! LR automaton (`op` is any of `+ - *`, `atom` any of `number identifier
//! raw_string (`):
//!
//! ```text
//! s0:  program → .                 reduce r1 on end atom
//! s1:  program → program . stmt    end → accept, number → s2, identifier → s3,
//!                                  raw_string → s4, ( → s5, statement → s6, expr → s7
//! s2:  expr → number .             reduce r7 on ; op )
//! s3:  expr → identifier .         reduce r8 on ; op )
//! s4:  expr → raw_string .         reduce r9 on ; op )
//! s5:  expr → ( . expr )           atoms as s1, expr → s8
//! s6:  program → program stmt .    reduce r0 on end atom
//! s7:  stmt → expr . ;             ; → s9, + → s10, - → s11, * → s12
//! s8:  expr → ( expr . )           ) → s13, + → s10, - → s11, * → s12
//! s9:  stmt → expr ; .             reduce r2 on end atom
//! s10: expr → expr + . expr        atoms as s1, expr → s14
//! s11: expr → expr - . expr        atoms as s1, expr → s15
//! s12: expr → expr * . expr        atoms as s1, expr → s16
//! s13: expr → ( expr ) .           reduce r6 on ; op )
//! s14: expr → expr + expr .        reduce r3 on ; ), shift/reduce on op
//! s15: expr → expr - expr .        reduce r4 on ; ), shift/reduce on op
//! s16: expr → expr * expr .        reduce r5 on ; ), shift/reduce on op
//! ```

use whorl_grammar::{
    CharClass, Grammar, GrammarBuilder, GrammarError, LexMode, LexState, ParseAction, Precedence,
    Rule,
};
use whorl_ir::{LexStateId, StateId, SymbolId};

pub const NAME: &str = "calc";

/// Build the tables. The external scanner is attached separately.
pub fn build() -> Result<Grammar, GrammarError> {
    let mut b = GrammarBuilder::new(NAME);
    b.revision(1);

    // Tokens.
    let number = b.terminal("number", true);
    let identifier = b.terminal("identifier", true);
    let plus = b.terminal("+", false);
    let minus = b.terminal("-", false);
    let star = b.terminal("*", false);
    let lparen = b.terminal("(", false);
    let rparen = b.terminal(")", false);
    let semi = b.terminal(";", false);
    let comment = b.extra("comment", true);
    let raw = b.external("raw_string", true);

    // Non-terminals.
    let program = b.nonterminal("program");
    let statement = b.nonterminal("statement");
    let expr = b.nonterminal("expr");

    let left = b.field("left");
    let operator = b.field("operator");
    let right = b.field("right");

    b.precedence(plus, Precedence::left(1));
    b.precedence(minus, Precedence::left(1));
    b.precedence(star, Precedence::left(2));

    let r_program_more = b.rule(Rule::new(program, 2));
    let r_program_empty = b.rule(Rule::new(program, 0));
    let r_statement = b.rule(Rule::new(statement, 2));
    let binary = |level| {
        Rule::new(expr, 3)
            .with_precedence(Precedence::left(level))
            .with_field(0, left)
            .with_field(1, operator)
            .with_field(2, right)
    };
    let r_add = b.rule(binary(1));
    let r_sub = b.rule(binary(1));
    let r_mul = b.rule(binary(2));
    let r_parens = b.rule(Rule::new(expr, 3));
    let r_number = b.rule(Rule::new(expr, 1));
    let r_identifier = b.rule(Rule::new(expr, 1));
    let r_raw = b.rule(Rule::new(expr, 1));
    b.start(program);

    build_lex_table(&mut b, number, identifier, comment, [plus, minus, star, lparen, rparen, semi]);

    let s = StateId::new;
    let ext = b.external_lex_state(&[raw]);
    let with_raw = LexMode::new(LexStateId::new(0)).with_externals(ext);
    for state in [0, 1, 5, 6, 9, 10, 11, 12] {
        b.lex_mode(s(state), with_raw);
    }

    let program_follow = [SymbolId::END, number, identifier, lparen, raw];
    let expr_follow = [semi, plus, minus, star, rparen];

    let shift_atoms = |b: &mut GrammarBuilder, from: StateId| {
        b.shift(from, number, s(2));
        b.shift(from, identifier, s(3));
        b.shift(from, raw, s(4));
        b.shift(from, lparen, s(5));
    };

    b.reduce(s(0), &program_follow, r_program_empty);
    b.goto(s(0), program, s(1));

    b.accept(s(1));
    shift_atoms(&mut b, s(1));
    b.goto(s(1), statement, s(6));
    b.goto(s(1), expr, s(7));

    b.reduce(s(2), &expr_follow, r_number);
    b.reduce(s(3), &expr_follow, r_identifier);
    b.reduce(s(4), &expr_follow, r_raw);

    shift_atoms(&mut b, s(5));
    b.goto(s(5), expr, s(8));

    b.reduce(s(6), &program_follow, r_program_more);

    b.shift(s(7), semi, s(9));
    b.shift(s(8), rparen, s(13));
    for from in [s(7), s(8)] {
        b.shift(from, plus, s(10));
        b.shift(from, minus, s(11));
        b.shift(from, star, s(12));
    }

    b.reduce(s(9), &program_follow, r_statement);

    for (from, target) in [(10, 14), (11, 15), (12, 16)] {
        shift_atoms(&mut b, s(from));
        b.goto(s(from), expr, s(target));
    }

    b.reduce(s(13), &expr_follow, r_parens);

    for (state, rule) in [(14, r_add), (15, r_sub), (16, r_mul)] {
        b.reduce(s(state), &[semi, rparen], rule);
        for (op, target) in [(plus, 10), (minus, 11), (star, 12)] {
            b.action(s(state), op, ParseAction::Shift(s(target)));
            b.action(s(state), op, ParseAction::Reduce(rule));
        }
    }

    b.extra_everywhere(comment);
    b.build()
}

/// Lex states:
///
/// ```text
/// L0  start      digit → L1, [A-Za-z_] → L2, + - * ( ) ; → L3..L8, # → L9
/// L1  number     digit → L1, . → L10
/// L10            digit → L11
/// L11 number     digit → L11
/// L2  identifier [A-Za-z0-9_] → L2
/// L9  comment    [^\n] → L9
/// ```
fn build_lex_table(
    b: &mut GrammarBuilder,
    number: SymbolId,
    identifier: SymbolId,
    comment: SymbolId,
    punctuation: [SymbolId; 6],
) {
    let l = LexStateId::new;
    let digit = CharClass::range('0', '9');
    let ident_start = CharClass::from_ranges([('a', 'z'), ('A', 'Z'), ('_', '_')]);
    let ident_rest = ident_start.union(&digit);

    b.separators(CharClass::chars(" \t\r\n"));

    let mut start = LexState::new()
        .on(digit.clone(), l(1))
        .on(ident_start, l(2));
    for (i, ch) in ['+', '-', '*', '(', ')', ';'].into_iter().enumerate() {
        let target = l(3 + whorl_ir::to_u16(i, "punctuation"));
        start = start.on(CharClass::char(ch), target);
        b.set_lex_state(target, LexState::new().accept(punctuation[i]));
    }
    start = start.on(CharClass::char('#'), l(9));
    b.set_lex_state(l(0), start);

    b.set_lex_state(
        l(1),
        LexState::new()
            .accept(number)
            .on(digit.clone(), l(1))
            .on(CharClass::char('.'), l(10)),
    );
    b.set_lex_state(l(10), LexState::new().on(digit.clone(), l(11)));
    b.set_lex_state(l(11), LexState::new().accept(number).on(digit, l(11)));
    b.set_lex_state(l(2), LexState::new().accept(identifier).on(ident_rest, l(2)));
    b.set_lex_state(
        l(9),
        LexState::new()
            .accept(comment)
            .on(CharClass::char('\n').negate(), l(9)),
    );
}
