//! whorl CLI

use std::io;
use std::process::ExitCode;

use whorlc::args::parse_command_args;
use whorlc::commands::dispatch;
use whorlc::init_tracing;

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let command = args[1].as_str();
    match command {
        "help" | "--help" | "-h" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "version" | "--version" | "-V" => {
            println!("whorl {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result =
        parse_command_args(&args[2..]).and_then(|parsed| dispatch(command, &parsed, &mut out));

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("whorl - incremental GLR parsing");
    println!();
    println!("Usage: whorl <command> [options]");
    println!();
    println!("Commands:");
    println!("  parse <file>...                  Parse files and print their syntax trees");
    println!("  query <file> <query-file>        Print the matches of a query");
    println!("  edit <file> <start> <end> <text> Reparse after replacing bytes start..end");
    println!("  grammar <name> -o <path>         Write a built-in grammar's tables");
    println!("  help                             Show this message");
    println!("  version                          Show the version");
    println!();
    println!("Options:");
    println!("  --grammar=<name>       Built-in grammar: sum, calc (default: calc)");
    println!("  --grammar-file=<path>  Tables written by 'whorl grammar'");
    println!("  --glr                  Keep every parse of an ambiguity and pick one");
    println!("  --max-versions=<n>     Cap on simultaneous stack versions");
    println!("  --max-forks=<n>        Cap on forks over one parse");
    println!("  --max-depth=<n>        Cap on parse stack depth");
    println!("  --max-tokens=<n>       Cap on tokens consumed");
    println!("  --timeout-ms=<n>       Give up after this many milliseconds");
    println!("  --stats                Print parse statistics");
    println!();
    println!("A file argument of '-' reads standard input.");
    println!("Set RUST_LOG (and WHORL_LOG_TREE=1 for a tree view) to enable logging.");
}
