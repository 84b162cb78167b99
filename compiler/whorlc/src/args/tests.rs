#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn flags_and_positionals() {
    let parsed = parse_command_args(&args(&[
        "a.calc",
        "--glr",
        "--max-versions=8",
        "--max-forks=100",
        "--stats",
        "b.calc",
    ]))
    .unwrap();
    assert_eq!(parsed.positional, ["a.calc", "b.calc"]);
    assert!(parsed.stats);
    assert_eq!(parsed.overrides.policy, Some(AmbiguityPolicy::Glr));
    assert_eq!(parsed.overrides.max_versions, Some(8));
    assert_eq!(parsed.grammar, GrammarSource::Builtin("calc".to_owned()));

    let options = parsed.options();
    assert_eq!(options.policy, AmbiguityPolicy::Glr);
    assert_eq!(options.max_versions, 8);
    assert_eq!(options.max_forks, 100);
    assert_eq!(options.max_tokens, ParseOptions::default().max_tokens);
}

#[test]
fn grammar_selection() {
    let parsed = parse_command_args(&args(&["--grammar=sum"])).unwrap();
    assert_eq!(parsed.load_grammar().unwrap().name(), "sum");

    let parsed = parse_command_args(&args(&["--grammar=nope"])).unwrap();
    let error = parsed.load_grammar().unwrap_err();
    assert_eq!(
        error.to_string(),
        "unknown grammar 'nope' (available: sum, calc)"
    );

    let parsed = parse_command_args(&args(&["--grammar-file=x.bin"])).unwrap();
    assert_eq!(parsed.grammar, GrammarSource::File(PathBuf::from("x.bin")));
}

#[test]
fn output_and_dashes() {
    let parsed = parse_command_args(&args(&["calc", "-o", "out.bin"])).unwrap();
    assert_eq!(parsed.output, Some(PathBuf::from("out.bin")));
    assert_eq!(parsed.positional, ["calc"]);

    // A lone `-` is an ordinary argument; `--` ends the flags.
    let parsed = parse_command_args(&args(&["f", "1", "2", "-"])).unwrap();
    assert_eq!(parsed.positional, ["f", "1", "2", "-"]);
    let parsed = parse_command_args(&args(&["--", "--stats"])).unwrap();
    assert_eq!(parsed.positional, ["--stats"]);
    assert!(!parsed.stats);
}

#[test]
fn bad_arguments() {
    for list in [
        &["--max-versions=many"][..],
        &["--frobnicate"][..],
        &["-o"][..],
    ] {
        let error = parse_command_args(&args(list)).unwrap_err();
        assert!(matches!(error, CliError::Usage(_)), "{list:?}: {error}");
    }
}

#[test]
fn positional_count() {
    let parsed = parse_command_args(&args(&["a", "b"])).unwrap();
    let [a, b] = parsed.exactly::<2>("x <a> <b>").unwrap();
    assert_eq!((a, b), ("a", "b"));
    assert!(parsed.exactly::<3>("x <a> <b> <c>").is_err());
}
