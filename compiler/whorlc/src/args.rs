//! Command-line options shared by the commands.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use whorl_grammar::GrammarHandle;
use whorl_parse::{AmbiguityPolicy, OptionOverrides, ParseOptions, Parser};

use crate::CliError;

/// Grammar used when none is named.
pub const DEFAULT_GRAMMAR: &str = "calc";

/// Where the grammar comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarSource {
    Builtin(String),
    /// Tables written by `whorl grammar`.
    File(PathBuf),
}

impl Default for GrammarSource {
    fn default() -> Self {
        GrammarSource::Builtin(DEFAULT_GRAMMAR.to_owned())
    }
}

/// Flags and positional arguments after the command name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandArgs {
    pub grammar: GrammarSource,
    /// Parser settings given on the command line, layered onto the defaults.
    pub overrides: OptionOverrides,
    pub stats: bool,
    /// `-o <path>`
    pub output: Option<PathBuf>,
    pub positional: Vec<String>,
}

/// Parse the arguments that follow a command name.
///
/// Arguments starting with `--` are flags; `--` alone ends the flags so a
/// positional argument may itself start with `--`.
pub fn parse_command_args(args: &[String]) -> Result<CommandArgs, CliError> {
    let mut parsed = CommandArgs::default();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        i += 1;
        if arg == "--" {
            parsed.positional.extend(args[i..].iter().cloned());
            break;
        }
        if arg == "-o" {
            let Some(path) = args.get(i) else {
                return Err(CliError::usage("-o needs a path"));
            };
            parsed.output = Some(PathBuf::from(path));
            i += 1;
        } else if let Some(name) = arg.strip_prefix("--grammar=") {
            parsed.grammar = GrammarSource::Builtin(name.to_owned());
        } else if let Some(path) = arg.strip_prefix("--grammar-file=") {
            parsed.grammar = GrammarSource::File(PathBuf::from(path));
        } else if arg == "--glr" {
            parsed.overrides.policy = Some(AmbiguityPolicy::Glr);
        } else if let Some(n) = arg.strip_prefix("--max-versions=") {
            parsed.overrides.max_versions = Some(number("--max-versions", n)?);
        } else if let Some(n) = arg.strip_prefix("--max-forks=") {
            parsed.overrides.max_forks = Some(number("--max-forks", n)?);
        } else if let Some(n) = arg.strip_prefix("--max-depth=") {
            parsed.overrides.max_stack_depth = Some(number("--max-depth", n)?);
        } else if let Some(n) = arg.strip_prefix("--max-tokens=") {
            parsed.overrides.max_tokens = Some(number("--max-tokens", n)?);
        } else if let Some(n) = arg.strip_prefix("--timeout-ms=") {
            parsed.overrides.timeout = Some(Duration::from_millis(number("--timeout-ms", n)?));
        } else if arg == "--stats" {
            parsed.stats = true;
        } else if arg.starts_with("--") {
            return Err(CliError::usage(format!("unknown option '{arg}'")));
        } else {
            parsed.positional.push(arg.clone());
        }
    }
    Ok(parsed)
}

fn number<T: FromStr>(flag: &str, value: &str) -> Result<T, CliError> {
    value
        .parse()
        .map_err(|_| CliError::usage(format!("{flag} expects a number, got '{value}'")))
}

impl CommandArgs {
    pub fn load_grammar(&self) -> Result<GrammarHandle, CliError> {
        match &self.grammar {
            GrammarSource::Builtin(name) => {
                whorl_calc::grammar_by_name(name).ok_or_else(|| CliError::UnknownGrammar {
                    name: name.clone(),
                    available: whorl_calc::GRAMMAR_NAMES.join(", "),
                })
            }
            GrammarSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|source| CliError::Read {
                    path: path.clone(),
                    source,
                })?;
                Ok(whorl_calc::load_grammar(&bytes)?)
            }
        }
    }

    pub fn options(&self) -> ParseOptions {
        ParseOptions::default().merge(&self.overrides)
    }

    pub fn parser(&self) -> Result<Parser, CliError> {
        Ok(Parser::with_options(self.load_grammar()?, self.options()))
    }

    /// The positional arguments, which must number exactly `N`.
    pub fn exactly<const N: usize>(&self, usage: &str) -> Result<[&str; N], CliError> {
        if self.positional.len() != N {
            return Err(CliError::usage(format!("usage: {usage}")));
        }
        Ok(std::array::from_fn(|i| self.positional[i].as_str()))
    }
}

#[cfg(test)]
mod tests;
