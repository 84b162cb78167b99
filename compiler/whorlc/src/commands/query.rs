//! `whorl query`: run a query file against a source file.

use std::io::Write;

use whorl_query::Query;

use super::{path_buf, read_source};
use crate::args::CommandArgs;
use crate::CliError;

const USAGE: &str = "whorl query <file> <query-file> [--grammar=NAME | --grammar-file=PATH]";

/// Print every match, one line per capture. Returns the number of matches.
pub fn run_query(args: &CommandArgs, out: &mut dyn Write) -> Result<usize, CliError> {
    let [file, query_file] = args.exactly::<2>(USAGE)?;
    let parser = args.parser()?;
    let source = read_source(file)?;
    let query_bytes = read_source(query_file)?;
    let query_text = String::from_utf8_lossy(&query_bytes);

    let query = Query::new(parser.grammar(), &query_text).map_err(|source| CliError::Query {
        path: path_buf(query_file),
        source,
    })?;
    let tree = parser
        .parse(&source)
        .map_err(|source| CliError::Parse {
            path: path_buf(file),
            source,
        })?
        .tree;
    let matches = query.matches(&tree, &source).map_err(|source| CliError::Query {
        path: path_buf(query_file),
        source,
    })?;

    let mut count = 0;
    for m in matches {
        count += 1;
        writeln!(out, "pattern {}:", m.pattern_index)?;
        for capture in &m.captures {
            let node = capture.node;
            let name = query.capture_name(capture.index).unwrap_or("?");
            let text = String::from_utf8_lossy(source.get(node.byte_range()).unwrap_or_default());
            writeln!(
                out,
                "  @{name} {} {}-{} {text:?}",
                node.kind(),
                node.start_position(),
                node.end_position()
            )?;
        }
    }
    Ok(count)
}
