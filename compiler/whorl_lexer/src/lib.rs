//! Lexing for the whorl runtime.
//!
//! - [`SourceBuffer`]: sentinel-terminated, cache-line padded copy of the text
//! - [`Cursor`]: UTF-8 character cursor tracking byte offset and point
//! - [`Lexer`]: table-driven DFA plus the external-scanner bridge
//!
//! The lexer is driven by the parser: each call lexes exactly one token for
//! the current parse state's lex mode. Lexing never fails; characters that
//! start no token become one-character `ERROR` tokens.

mod cursor;
mod lexer;
mod source_buffer;
mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use source_buffer::SourceBuffer;
pub use token::Token;

use whorl_grammar::Grammar;
use whorl_ir::{StateId, TextLength};

/// Lex a whole text in a single parse state, ending with the `END` token.
///
/// Useful for inspecting a grammar's lex table; the parser lexes token by
/// token as parse states change.
pub fn tokenize(grammar: &Grammar, text: &[u8], state: StateId) -> Vec<Token> {
    let source = SourceBuffer::new(text);
    let lexer = Lexer::new(grammar, &source);
    let mut position = TextLength::ZERO;
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token(state, position);
        tokens.push(token);
        if token.is_end() {
            return tokens;
        }
        position = token.end;
    }
}
