use pretty_assertions::assert_eq;
use proptest::prelude::*;
use whorl_ir::{Point, TextLength};

use crate::SourceBuffer;

// === Basic Navigation ===

#[test]
fn advance_moves_forward() {
    let buf = SourceBuffer::new(b"abc");
    let mut cursor = buf.cursor();
    assert_eq!(cursor.lookahead(), Some('a'));
    cursor.advance_char();
    assert_eq!(cursor.lookahead(), Some('b'));
    assert_eq!(cursor.pos(), 1);
}

#[test]
fn eof_after_last_character() {
    let buf = SourceBuffer::new(b"hi");
    let mut cursor = buf.cursor();
    cursor.advance_char();
    cursor.advance_char();
    assert!(cursor.is_eof());
    assert_eq!(cursor.lookahead(), None);
    cursor.advance_char();
    assert_eq!(cursor.pos(), 2);
}

#[test]
fn interior_null_is_not_eof() {
    let buf = SourceBuffer::new(b"a\0b");
    let mut cursor = buf.cursor();
    cursor.advance_char();
    assert!(!cursor.is_eof());
    assert_eq!(cursor.lookahead(), Some('\0'));
}

// === Points ===

#[test]
fn newline_moves_to_next_row() {
    let buf = SourceBuffer::new(b"ab\ncd");
    let mut cursor = buf.cursor();
    for _ in 0..4 {
        cursor.advance_char();
    }
    assert_eq!(cursor.point(), Point::new(1, 1));
    assert_eq!(cursor.position(), TextLength::new(4, Point::new(1, 1)));
}

#[test]
fn cursor_at_resumes_point_tracking() {
    let buf = SourceBuffer::new(b"ab\ncd");
    let mut cursor = buf.cursor_at(TextLength::new(3, Point::new(1, 0)));
    assert_eq!(cursor.lookahead(), Some('c'));
    cursor.advance_char();
    assert_eq!(cursor.point(), Point::new(1, 1));
}

// === UTF-8 ===

#[test]
fn multibyte_characters_advance_by_width() {
    let buf = SourceBuffer::new("é→😀".as_bytes());
    let mut cursor = buf.cursor();
    assert_eq!(cursor.peek_char(), Some(('é', 2)));
    cursor.advance_char();
    assert_eq!(cursor.peek_char(), Some(('→', 3)));
    cursor.advance_char();
    assert_eq!(cursor.peek_char(), Some(('😀', 4)));
    cursor.advance_char();
    assert!(cursor.is_eof());
    // Columns count bytes.
    assert_eq!(cursor.point(), Point::new(0, 9));
}

#[test]
fn invalid_bytes_decode_as_replacement() {
    let buf = SourceBuffer::new(&[0xff, b'a', 0xc3]);
    let mut cursor = buf.cursor();
    assert_eq!(cursor.peek_char(), Some((char::REPLACEMENT_CHARACTER, 1)));
    cursor.advance_char();
    assert_eq!(cursor.peek_char(), Some(('a', 1)));
    cursor.advance_char();
    // Truncated two-byte sequence at the end of the source.
    assert_eq!(cursor.peek_char(), Some((char::REPLACEMENT_CHARACTER, 1)));
}

proptest! {
    #[test]
    fn advancing_visits_every_byte_once(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let buf = SourceBuffer::new(&bytes);
        let mut cursor = buf.cursor();
        let mut steps = 0;
        while !cursor.is_eof() {
            let before = cursor.pos();
            cursor.advance_char();
            prop_assert!(cursor.pos() > before);
            steps += 1;
        }
        prop_assert_eq!(cursor.pos() as usize, bytes.len());
        prop_assert!(steps <= bytes.len());
        prop_assert_eq!(cursor.position(), TextLength::of_text(&bytes));
    }
}
