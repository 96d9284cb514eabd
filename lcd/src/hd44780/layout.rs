//! Lays a block of text out on the character grid of a display.
use crate::hd44780::Geometry;
use crate::{LcdError, LcdResult};
use std::iter::Peekable;

/// Splits `text` into exactly `geometry.rows()` lines of at most `geometry.columns()` characters.
///
/// - `\n` moves to the next row. A single space right after it is dropped.
/// - A row that reaches the full width wraps to the next one, dropping a single leading space
///   the same way.
/// - Once the last row is reached, a `\n` ends the text and characters past its end are dropped.
///
/// # Errors
/// - [LcdError::TextTooLong] if the text has more characters than the whole display.
///   Line breaks are counted as characters and the rows they leave unfilled are not, so the
///   check is only a coarse bound: text under the limit may still be cut off.
pub fn layout_text(text: &str, geometry: Geometry) -> LcdResult<Vec<String>> {
    let rows = geometry.rows();
    let columns = geometry.columns();

    let length = text.chars().count();
    if length > geometry.capacity() {
        return Err(LcdError::TextTooLong {
            length,
            max: geometry.capacity(),
        });
    }

    let mut lines = vec![String::new(); rows];
    let mut line_lengths = vec![0usize; rows];
    let mut row = 0;
    let last_row = rows - 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            if row == last_row {
                break;
            }
            row += 1;
            skip_leading_space(&mut chars);
            continue;
        }

        if line_lengths[row] == columns {
            // Only the last row can be full here.
            continue;
        }

        lines[row].push(c);
        line_lengths[row] += 1;

        if line_lengths[row] == columns && row < last_row {
            row += 1;
            skip_leading_space(&mut chars);
        }
    }

    Ok(lines)
}

fn skip_leading_space(chars: &mut Peekable<impl Iterator<Item = char>>) {
    let _ = chars.next_if_eq(&' ');
}
