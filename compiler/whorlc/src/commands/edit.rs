//! `whorl edit`: apply one edit and reparse incrementally.

use std::io::Write;

use whorl_ir::{InputEdit, TextChange};
use whorl_parse::{ParseError, ParseStats};

use super::{path_buf, read_source};
use crate::args::CommandArgs;
use crate::CliError;

const USAGE: &str = "whorl edit <file> <start> <end> <replacement>";

/// Reuse figures of one incremental reparse.
#[derive(Clone, Debug, PartialEq)]
pub struct EditReport {
    pub incremental: ParseStats,
    pub fresh: ParseStats,
}

/// Replace bytes `start..end` of the file with the replacement, reparse,
/// and check the result against a fresh parse of the edited text.
///
/// The file itself is not modified.
pub fn run_edit(args: &CommandArgs, out: &mut dyn Write) -> Result<EditReport, CliError> {
    let [file, start, end, replacement] = args.exactly::<4>(USAGE)?;
    let offset = |what: &str, value: &str| {
        value
            .parse::<u32>()
            .map_err(|_| CliError::usage(format!("{what} must be a byte offset, got '{value}'")))
    };
    let (start, end) = (offset("start", start)?, offset("end", end)?);

    let old = read_source(file)?;
    let len = old.len();
    if start > end || end as usize > len {
        return Err(CliError::usage(format!(
            "edit range {start}..{end} is outside the file ({len} bytes)"
        )));
    }
    let mut new = old[..start as usize].to_vec();
    new.extend_from_slice(replacement.as_bytes());
    new.extend_from_slice(&old[end as usize..]);

    let parser = args.parser()?;
    let parse_error = |source: ParseError| CliError::Parse {
        path: path_buf(file),
        source,
    };
    let prior = parser.parse(&old).map_err(parse_error)?;
    let new_len = u32::try_from(replacement.len())
        .map_err(|_| CliError::usage("replacement is too long"))?;
    let edit = InputEdit::from_change(TextChange::new(start, end, new_len), &old, &new);
    let incremental = parser
        .reparse(&prior.tree, &edit, &new)
        .map_err(parse_error)?;
    let fresh = parser.parse(&new).map_err(parse_error)?;

    writeln!(out, "{}", incremental.tree.to_sexp())?;
    let s = &incremental.stats;
    writeln!(
        out,
        "reused {} nodes in {} subtrees ({:.1}%), {} bytes; lexed {} tokens (fresh parse: {})",
        s.nodes_reused,
        s.subtrees_reused,
        s.reuse_rate(),
        s.bytes_reused,
        s.tokens_lexed,
        fresh.stats.tokens_lexed
    )?;

    if incremental.tree != fresh.tree {
        return Err(CliError::Diverged {
            path: path_buf(file),
        });
    }
    Ok(EditReport {
        incremental: incremental.stats,
        fresh: fresh.stats,
    })
}
