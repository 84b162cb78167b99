//! External scanner for raw strings.

use whorl_grammar::{ExternalScanner, ScanContext};

/// Recognises `r` + N hashes + `"` … `"` + N hashes.
///
/// The body may contain quotes followed by fewer than N hashes. Unterminated
/// raw strings are declined, and the built-in lexer then sees `r` as an
/// identifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawStringScanner;

/// Index of `raw_string` in the grammar's external-token list.
const RAW_STRING: usize = 0;

impl ExternalScanner for RawStringScanner {
    fn scan(&self, cx: &mut dyn ScanContext, valid: &[bool]) -> Option<usize> {
        if !valid.get(RAW_STRING).copied().unwrap_or(false) {
            return None;
        }
        while cx.lookahead().is_some_and(char::is_whitespace) {
            cx.skip();
        }
        if cx.lookahead() != Some('r') {
            return None;
        }
        cx.advance();

        let mut hashes = 0usize;
        while cx.lookahead() == Some('#') {
            cx.advance();
            hashes += 1;
        }
        if cx.lookahead() != Some('"') {
            return None;
        }
        cx.advance();

        loop {
            match cx.lookahead()? {
                '"' => {
                    cx.advance();
                    let mut closing = 0;
                    while closing < hashes && cx.lookahead() == Some('#') {
                        cx.advance();
                        closing += 1;
                    }
                    if closing == hashes {
                        cx.mark_end();
                        return Some(RAW_STRING);
                    }
                }
                _ => cx.advance(),
            }
        }
    }
}
