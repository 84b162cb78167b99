//! `whorl parse`: parse files and print their trees.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use rayon::prelude::*;
use whorl_parse::{render_issue, syntax_issues, Parser};

use super::{path_buf, read_source};
use crate::args::CommandArgs;
use crate::CliError;

const USAGE: &str = "whorl parse <file>... [--grammar=NAME | --grammar-file=PATH] [--glr] \
                     [--max-versions=N] [--stats]";

/// The rendered result for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    /// S-expression, syntax issues and optional statistics.
    pub text: String,
    pub issues: usize,
}

/// Parse every file in parallel and print the reports in argument order.
///
/// Returns whether all files parsed without syntax issues.
pub fn parse_files(args: &CommandArgs, out: &mut dyn Write) -> Result<bool, CliError> {
    if args.positional.is_empty() {
        return Err(CliError::usage(format!("usage: {USAGE}")));
    }
    let parser = args.parser()?;
    let reports: Vec<Result<FileReport, CliError>> = args
        .positional
        .par_iter()
        .map(|path| parse_one(&parser, path, args.stats))
        .collect();

    let several = args.positional.len() > 1;
    let mut clean = true;
    for report in reports {
        let report = report?;
        if several {
            writeln!(out, "== {} ==", report.path.display())?;
        }
        out.write_all(report.text.as_bytes())?;
        clean &= report.issues == 0;
    }
    Ok(clean)
}

#[tracing::instrument(level = "debug", skip(parser, stats))]
fn parse_one(parser: &Parser, path: &str, stats: bool) -> Result<FileReport, CliError> {
    let source = read_source(path)?;
    let output = parser.parse(&source).map_err(|source| CliError::Parse {
        path: path_buf(path),
        source,
    })?;

    let mut text = output.tree.to_sexp();
    text.push('\n');
    let issues = syntax_issues(&output.tree);
    for issue in &issues {
        text.push_str(&render_issue(issue, path, &source));
        text.push('\n');
    }
    if stats {
        let s = &output.stats;
        // Writing to a String cannot fail.
        let _ = writeln!(
            text,
            "stats: {} tokens, {} nodes, {} reductions, {} forks, {} merges, \
             {} peak versions, {} recoveries",
            s.tokens_lexed,
            s.nodes_created,
            s.reductions,
            s.forks,
            s.merges,
            s.peak_versions,
            s.recoveries
        );
    }
    Ok(FileReport {
        path: path_buf(path),
        text,
        issues: issues.len(),
    })
}
