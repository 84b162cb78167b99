//! Resource limits, cancellation and rejected calls.

use std::time::Duration;

use pretty_assertions::assert_eq;
use whorl_calc::{calc_grammar, sum_grammar};
use whorl_ir::{InputEdit, TextChange};

use super::{calc, parse_ok, sum};
use crate::{
    AmbiguityPolicy, CancellationFlag, Limit, OptionOverrides, ParseError, ParseOptions, Parser,
};

fn sum_with(options: ParseOptions) -> Parser {
    Parser::with_options(sum_grammar(), options)
}

#[test]
fn version_cap_prunes_instead_of_failing() {
    let parser = Parser::with_options(
        calc_grammar(),
        ParseOptions::default()
            .with_policy(AmbiguityPolicy::Glr)
            .with_max_versions(1),
    );
    let output = parser.parse(b"1+2*3;").unwrap();
    output.tree.verify().unwrap();
    assert_eq!(output.stats.forks, 1);
    assert_eq!(output.stats.peak_versions, 1);
    assert_eq!(output.stats.merges, 0);
    // The pruned fork leaves no alternative behind.
    assert!(output.tree.preorder().all(|n| n.alternatives().is_empty()));
}

#[test]
fn fork_limit() {
    let parser = Parser::with_options(
        calc_grammar(),
        ParseOptions::default()
            .with_policy(AmbiguityPolicy::Glr)
            .with_max_forks(1),
    );
    assert!(parser.parse(b"1+2*3;").is_ok());
    assert_eq!(
        parser.parse(b"1+2*3-4;").unwrap_err(),
        ParseError::ResourceExhausted {
            limit: Limit::Forks,
            max: 1
        }
    );
    // Nothing forks here.
    assert!(parser.parse(b"1+2;").is_ok());
}

#[test]
fn stack_depth_limit() {
    let parser = sum_with(ParseOptions::default().with_max_stack_depth(2));
    assert_eq!(
        parser.parse(b"1+2").unwrap_err(),
        ParseError::ResourceExhausted {
            limit: Limit::StackDepth,
            max: 2
        }
    );
    assert!(parser.parse(b"1").is_ok());
}

#[test]
fn token_limit() {
    let parser = sum_with(ParseOptions::default().with_max_tokens(2));
    assert_eq!(
        parser.parse(b"1+2").unwrap_err(),
        ParseError::ResourceExhausted {
            limit: Limit::Tokens,
            max: 2
        }
    );
}

#[test]
fn reductions_per_token_limit() {
    let parser = Parser::with_options(
        calc_grammar(),
        ParseOptions::default().with_max_reductions_per_token(1),
    );
    // END reduces both the statement and the program.
    assert_eq!(
        parser.parse(b"1;").unwrap_err(),
        ParseError::ResourceExhausted {
            limit: Limit::ReductionsPerToken,
            max: 1
        }
    );
}

#[test]
fn cancellation() {
    let flag = CancellationFlag::new();
    let parser = sum_with(ParseOptions::default().with_cancellation(flag.clone()));
    flag.cancel();
    assert_eq!(parser.parse(b"1+2").unwrap_err(), ParseError::Cancelled);
    flag.reset();
    assert!(parser.parse(b"1+2").is_ok());
}

#[test]
fn generous_timeout_does_not_interfere() {
    let parser = sum_with(ParseOptions::default().with_timeout(Duration::from_secs(60)));
    assert_eq!(
        parser.parse(b"1+2").unwrap().tree,
        parse_ok(&sum(), "1+2").tree
    );
}

#[test]
fn overrides_only_touch_set_fields() {
    let overrides = OptionOverrides {
        policy: Some(AmbiguityPolicy::Glr),
        max_versions: Some(4),
        ..OptionOverrides::default()
    };
    assert!(!overrides.is_empty());
    assert!(OptionOverrides::default().is_empty());

    let base = ParseOptions::default().with_max_tokens(99);
    let merged = base.merge(&overrides);
    assert_eq!(merged.policy, AmbiguityPolicy::Glr);
    assert_eq!(merged.max_versions, 4);
    assert_eq!(merged.max_tokens, 99);
    assert_eq!(
        merged.max_stack_depth,
        ParseOptions::default().max_stack_depth
    );
}

#[test]
fn set_options_replaces_limits() {
    let mut parser = sum();
    parser.set_options(ParseOptions::default().with_max_tokens(1));
    assert!(parser.parse(b"1+2").is_err());
    assert_eq!(parser.options().max_tokens, 1);
}

#[test]
fn reparse_rejects_trees_from_other_grammars() {
    let prior = parse_ok(&sum(), "1+2");
    let edit = InputEdit::from_change(TextChange::insert(3, 0), b"1+2", b"1+2");
    let err = calc().reparse(&prior.tree, &edit, b"1+2").unwrap_err();
    assert!(matches!(err, ParseError::GrammarMismatch { .. }));
    assert!(err.to_string().contains("sum"));
}

#[test]
fn reparse_rejects_inconsistent_edits() {
    let parser = sum();
    let prior = parse_ok(&parser, "1+2");

    // Past the end of the old text.
    let edit = InputEdit::from_change(TextChange::new(2, 7, 1), b"1+2", b"1+5");
    assert!(matches!(
        parser.reparse(&prior.tree, &edit, b"1+5"),
        Err(ParseError::InvalidEdit(_))
    ));

    // New text length disagrees with the edit.
    let edit = InputEdit::from_change(TextChange::replace(2, 1, 1), b"1+2", b"1+55");
    assert!(matches!(
        parser.reparse(&prior.tree, &edit, b"1+55"),
        Err(ParseError::InvalidEdit(_))
    ));

    // New end before the start.
    let mut edit = InputEdit::from_change(TextChange::replace(2, 1, 1), b"1+2", b"1+5");
    edit.new_end_byte = 1;
    assert!(matches!(
        parser.reparse(&prior.tree, &edit, b"1+5"),
        Err(ParseError::InvalidEdit(_))
    ));

    // Start after the old end.
    let mut edit = InputEdit::from_change(TextChange::replace(1, 1, 1), b"1+2", b"1-2");
    edit.start_byte = 3;
    edit.new_end_byte = 3;
    assert!(matches!(
        parser.reparse(&prior.tree, &edit, b"1-2"),
        Err(ParseError::InvalidEdit(_))
    ));
}

#[test]
fn errors_render_readably() {
    let err = ParseError::ResourceExhausted {
        limit: Limit::StackDepth,
        max: 8,
    };
    assert_eq!(err.to_string(), "resource limit exceeded: more than 8 stack entries");
    assert_eq!(ParseError::Cancelled.to_string(), "parse cancelled");
}
