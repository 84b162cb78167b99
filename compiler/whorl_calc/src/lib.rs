//! Sample compiled grammars for the whorl runtime.
//!
//! Each grammar is available through a factory accessor returning a shared
//! [`GrammarHandle`], built once and cached:
//!
//! - [`sum_grammar`]: `expr := expr '+' NUMBER | expr '-' NUMBER | NUMBER`
//! - [`calc_grammar`]: statements of arithmetic expressions with comments,
//!   operator precedence and raw strings from an external scanner
//!
//! Serialized tables carry no native code. [`scanner_for`] returns the
//! scanner to reattach after [`Grammar::from_bytes`](whorl_grammar::Grammar::from_bytes).

mod calc;
mod raw_string;
mod sum;

use std::sync::{Arc, OnceLock};

use whorl_grammar::{ExternalScanner, Grammar, GrammarError, GrammarHandle};

pub use raw_string::RawStringScanner;

/// Names accepted by [`grammar_by_name`].
pub const GRAMMAR_NAMES: &[&str] = &[sum::NAME, calc::NAME];

/// Build the sum grammar's tables without caching.
pub fn build_sum() -> Result<Grammar, GrammarError> {
    sum::build()
}

/// Build the calc grammar's tables with its scanner attached, without caching.
pub fn build_calc() -> Result<Grammar, GrammarError> {
    Ok(calc::build()?.with_external_scanner(Arc::new(RawStringScanner)))
}

/// The sum grammar.
///
/// # Panics
/// Panics if the built-in tables fail validation, which is a bug in this crate.
pub fn sum_grammar() -> GrammarHandle {
    static SUM: OnceLock<GrammarHandle> = OnceLock::new();
    SUM.get_or_init(|| builtin(build_sum(), sum::NAME)).clone()
}

/// The calc grammar.
///
/// # Panics
/// Panics if the built-in tables fail validation, which is a bug in this crate.
pub fn calc_grammar() -> GrammarHandle {
    static CALC: OnceLock<GrammarHandle> = OnceLock::new();
    CALC.get_or_init(|| builtin(build_calc(), calc::NAME)).clone()
}

fn builtin(result: Result<Grammar, GrammarError>, name: &str) -> GrammarHandle {
    match result {
        Ok(grammar) => GrammarHandle::new(grammar),
        Err(e) => panic!("built-in grammar '{name}' is invalid: {e}"),
    }
}

/// Look up a built-in grammar by name.
pub fn grammar_by_name(name: &str) -> Option<GrammarHandle> {
    match name {
        sum::NAME => Some(sum_grammar()),
        calc::NAME => Some(calc_grammar()),
        _ => None,
    }
}

/// The native scanner for a grammar loaded from bytes, if it has one.
pub fn scanner_for(name: &str) -> Option<Arc<dyn ExternalScanner>> {
    match name {
        calc::NAME => Some(Arc::new(RawStringScanner)),
        _ => None,
    }
}

/// Load serialized tables and reattach the matching scanner.
pub fn load_grammar(bytes: &[u8]) -> Result<GrammarHandle, GrammarError> {
    let grammar = Grammar::from_bytes(bytes)?;
    let grammar = match scanner_for(grammar.name()) {
        Some(scanner) => grammar.with_external_scanner(scanner),
        None => grammar,
    };
    Ok(GrammarHandle::new(grammar))
}

#[cfg(test)]
mod tests;
