use super::*;
use pretty_assertions::assert_eq;

#[test]
fn of_text_counts_rows_and_last_column() {
    let len = TextLength::of_text(b"ab\ncde\nf");
    assert_eq!(len.bytes, 8);
    assert_eq!(len.extent, Point::new(2, 1));
}

#[test]
fn of_text_single_line() {
    assert_eq!(TextLength::of_text(b"hello").extent, Point::new(0, 5));
    assert_eq!(TextLength::of_text(b""), TextLength::ZERO);
}

#[test]
fn add_same_row_adds_columns() {
    let a = TextLength::new(3, Point::new(1, 3));
    let b = TextLength::new(2, Point::new(0, 2));
    assert_eq!(a + b, TextLength::new(5, Point::new(1, 5)));
}

#[test]
fn add_multiline_rhs_takes_rhs_column() {
    let a = TextLength::new(3, Point::new(0, 3));
    let b = TextLength::new(4, Point::new(1, 1));
    assert_eq!(a + b, TextLength::new(7, Point::new(1, 1)));
}

#[test]
fn sub_inverts_add() {
    let base = TextLength::of_text(b"one\ntwo ");
    let rel = TextLength::of_text(b"x\nyz");
    assert_eq!((base + rel) - base, rel);

    let same_row = TextLength::of_text(b"ab");
    assert_eq!((base + same_row) - base, same_row);
}

#[test]
fn concatenation_matches_measurement() {
    let left = b"let x\n  = 1";
    let right = b" + 2\n;";
    let mut joined = left.to_vec();
    joined.extend_from_slice(right);
    assert_eq!(
        TextLength::of_text(left) + TextLength::of_text(right),
        TextLength::of_text(&joined)
    );
}

#[test]
fn point_display_is_one_based() {
    assert_eq!(Point::new(0, 0).to_string(), "1:1");
    assert_eq!(Point::new(4, 9).to_string(), "5:10");
}
