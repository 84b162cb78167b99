//! Command handlers for the whorl CLI.
//!
//! Each handler takes the parsed [`CommandArgs`](crate::args::CommandArgs)
//! and writes its report to `out`, so the same code serves the binary and
//! the tests. Shared helpers live here in the module root.

mod edit;
mod grammar;
mod parse;
mod query;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub use edit::{run_edit, EditReport};
pub use grammar::write_grammar;
pub use parse::{parse_files, FileReport};
pub use query::run_query;

use crate::args::CommandArgs;
use crate::CliError;

/// Run `command` and flush `out`.
///
/// `Ok(false)` means the command ran but found syntax issues. A failed
/// flush is an error like any other write failure.
pub fn dispatch(command: &str, args: &CommandArgs, out: &mut dyn Write) -> Result<bool, CliError> {
    let clean = match command {
        // Syntax issues are reported in the output and fail the exit code.
        "parse" => parse_files(args, out)?,
        "query" => run_query(args, out).map(|_| true)?,
        "edit" => run_edit(args, out).map(|_| true)?,
        "grammar" => write_grammar(args, out).map(|_| true)?,
        other => {
            return Err(CliError::usage(format!(
                "unknown command '{other}'; run 'whorl help' for usage"
            )));
        }
    };
    out.flush()?;
    Ok(clean)
}

/// Read a file, keeping its path in the error. `-` reads standard input.
pub(crate) fn read_source(path: &str) -> Result<Vec<u8>, CliError> {
    let read = if path == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes).map(|_| bytes)
    } else {
        std::fs::read(path)
    };
    read.map_err(|source| CliError::Read {
        path: PathBuf::from(path),
        source,
    })
}

fn path_buf(path: &str) -> PathBuf {
    Path::new(path).to_path_buf()
}
