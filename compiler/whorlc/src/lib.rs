//! The `whorl` command-line driver.
//!
//! Parses files with the built-in grammars, runs queries, and exercises
//! incremental reparsing. The binary in `main.rs` only dispatches; the
//! commands live here so tests can drive them with an in-memory writer.

pub mod args;
pub mod commands;
mod error;
mod logging;

pub use error::CliError;
pub use logging::init_tracing;
