//! `expr := expr '+' NUMBER | expr '-' NUMBER | NUMBER`
//!
//! LR automaton:
//!
//! ```text
//! s0: . expr                     number → s1, expr → s2
//! s1: expr → number .            reduce on end + -
//! s2: accept . | expr . + n | expr . - n
//!                                end → accept, + → s3, - → s4
//! s3: expr → expr + . number     number → s5
//! s4: expr → expr - . number     number → s6
//! s5: expr → expr + number .     reduce on end + -
//! s6: expr → expr - number .     reduce on end + -
//! ```

use whorl_grammar::{CharClass, Grammar, GrammarBuilder, GrammarError, LexState, Rule};
use whorl_ir::{LexStateId, StateId, SymbolId};

pub const NAME: &str = "sum";

/// Build the tables.
pub fn build() -> Result<Grammar, GrammarError> {
    let mut b = GrammarBuilder::new(NAME);
    b.revision(1);

    let number = b.terminal("number", true);
    let plus = b.terminal("+", false);
    let minus = b.terminal("-", false);
    let expr = b.nonterminal("expr");

    let left = b.field("left");
    let operator = b.field("operator");
    let right = b.field("right");

    let binary = |lhs| {
        Rule::new(lhs, 3)
            .with_field(0, left)
            .with_field(1, operator)
            .with_field(2, right)
    };
    let add = b.rule(binary(expr));
    let sub = b.rule(binary(expr));
    let single = b.rule(Rule::new(expr, 1));
    b.start(expr);

    // Lex table.
    let l = LexStateId::new;
    let digits = CharClass::range('0', '9');
    b.separators(CharClass::chars(" \t\r\n"));
    b.set_lex_state(
        l(0),
        LexState::new()
            .on(digits.clone(), l(1))
            .on(CharClass::char('+'), l(2))
            .on(CharClass::char('-'), l(3)),
    );
    b.set_lex_state(l(1), LexState::new().accept(number).on(digits, l(1)));
    b.set_lex_state(l(2), LexState::new().accept(plus));
    b.set_lex_state(l(3), LexState::new().accept(minus));

    // Parse table.
    let s = StateId::new;
    let follow = [SymbolId::END, plus, minus];
    b.shift(s(0), number, s(1));
    b.goto(s(0), expr, s(2));
    b.reduce(s(1), &follow, single);
    b.accept(s(2));
    b.shift(s(2), plus, s(3));
    b.shift(s(2), minus, s(4));
    b.shift(s(3), number, s(5));
    b.shift(s(4), number, s(6));
    b.reduce(s(5), &follow, add);
    b.reduce(s(6), &follow, sub);

    b.build()
}
