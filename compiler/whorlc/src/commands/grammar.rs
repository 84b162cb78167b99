//! `whorl grammar`: write a built-in grammar's tables to a file.

use std::io::Write;
use std::path::PathBuf;

use crate::args::{CommandArgs, GrammarSource};
use crate::CliError;

const USAGE: &str = "whorl grammar <name> -o <path>";

/// Serialize the named grammar to the `-o` path. Returns the path written.
///
/// The tables carry no native scanner; loading them with
/// `--grammar-file` reattaches the built-in one by grammar name.
pub fn write_grammar(args: &CommandArgs, out: &mut dyn Write) -> Result<PathBuf, CliError> {
    let [name] = args.exactly::<1>(USAGE)?;
    let Some(path) = args.output.clone() else {
        return Err(CliError::usage(format!("usage: {USAGE}")));
    };
    let named = CommandArgs {
        grammar: GrammarSource::Builtin(name.to_owned()),
        ..CommandArgs::default()
    };
    let grammar = named.load_grammar()?;
    let bytes = grammar.to_bytes()?;
    std::fs::write(&path, &bytes).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;
    writeln!(
        out,
        "wrote {} ({} bytes) to {}",
        grammar.tag(),
        bytes.len(),
        path.display()
    )?;
    Ok(path)
}
