//! HD44780 LCD protocol engine.
//!
//! - [command] encodes the instruction set,
//! - [transport] splits bytes into strobed nibbles for the expander,
//! - [Hd44780Lcd] keeps the display state and implements [CharacterLcd],
//! - [layout] lays multi-line text out on the character grid.
//!
//! Most users only need [Hd44780Lcd] and the [CharacterLcd] trait.
pub mod command;
mod controller;
pub mod glyphs;
pub mod layout;
mod progress;
pub mod transport;

pub use controller::*;
pub use progress::*;

use crate::{LcdError, LcdResult};
use log::warn;
use std::fmt::Debug;

/// DDRAM address of the first column of each row.
pub const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Length of a DDRAM line in 2-line mode. Rows 2 and 3 are the second halves of lines 0 and 1.
pub const DDRAM_LINE_LENGTH: usize = 40;

/// Size of a display in characters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    rows: usize,
    columns: usize,
}

impl Geometry {
    /// 2 rows of 16 characters.
    pub const LCD1602: Geometry = Geometry {
        rows: 2,
        columns: 16,
    };
    /// 4 rows of 20 characters.
    pub const LCD2004: Geometry = Geometry {
        rows: 4,
        columns: 20,
    };

    /// Widest row a display with `rows` rows can address.
    pub const fn max_columns(rows: usize) -> usize {
        if rows <= 2 {
            DDRAM_LINE_LENGTH
        } else {
            DDRAM_LINE_LENGTH / 2
        }
    }

    /// Creates a geometry, checking that `rows` is 1 to 4 and `columns` is 1 to
    /// [Self::max_columns].
    pub fn new(rows: usize, columns: usize) -> LcdResult<Self> {
        if !(1..=ROW_OFFSETS.len()).contains(&rows)
            || !(1..=Self::max_columns(rows)).contains(&columns)
        {
            return Err(LcdError::InvalidGeometry { rows, columns });
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total amount of characters visible at once.
    pub fn capacity(&self) -> usize {
        self.rows * self.columns
    }

    pub fn check_row(&self, row: usize) -> LcdResult<()> {
        if row >= self.rows {
            return Err(LcdError::LineOutOfRange {
                row,
                rows: self.rows,
            });
        }
        Ok(())
    }

    /// Checks the column, allowing one past the last one (cursor parked after the last character).
    pub fn check_column(&self, column: usize) -> LcdResult<()> {
        if column > self.columns {
            return Err(LcdError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        Ok(())
    }

    /// Gets the DDRAM address of the given position.
    pub fn ddram_offset(&self, column: usize, row: usize) -> LcdResult<u8> {
        self.check_row(row)?;
        self.check_column(column)?;
        Ok(ROW_OFFSETS[row] + column as u8)
    }
}

/// The flags the controller keeps track of.
///
/// The LCD can't be read back, so this is the only record of what was last sent.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayState {
    pub backlight_on: bool,
    pub display_on: bool,
    pub cursor_visible: bool,
    pub cursor_blinking: bool,
    pub entry_left_to_right: bool,
    pub autoscroll_on: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            backlight_on: false,
            display_on: false,
            cursor_visible: false,
            cursor_blinking: false,
            entry_left_to_right: true,
            autoscroll_on: false,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// Maps a character to the LCD character code.
///
/// The codes below 0x80 match ASCII (with 0-7 being the custom characters), anything else is
/// replaced by `?`.
pub fn lcd_code(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        warn!("Non-ASCII character: {}", c);
        b'?'
    }
}

/// A character LCD.
///
/// Implemented by [Hd44780Lcd]; the provided methods are built on top of the required ones,
/// so helpers like [ProgressBar] work with any implementation.
pub trait CharacterLcd: Debug {
    fn geometry(&self) -> Geometry;

    /// Gets a copy of the current flags.
    fn state(&self) -> DisplayState;

    /// Turns the backlight on or off.
    fn set_backlight(&mut self, on: bool) -> LcdResult<()>;

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn display_control(&mut self, on: bool, cursor: bool, blink: bool) -> LcdResult<()>;

    /// Sets the direction the cursor moves after writing, and whether the display shifts instead.
    fn set_entry_mode(&mut self, direction: CursorDirection, autoscroll: bool) -> LcdResult<()>;

    /// Clears the display and moves the cursor to (0, 0).
    fn clear(&mut self) -> LcdResult<()>;

    /// Moves the cursor to (0, 0) and undoes display shifts, keeping the contents.
    fn return_home(&mut self) -> LcdResult<()>;

    /// Moves the cursor. `column` may be one past the last column.
    ///
    /// # Errors
    /// - [LcdError::LineOutOfRange] if `row >= rows`.
    /// - [LcdError::ColumnOutOfRange] if `column > columns`.
    fn set_cursor_position(&mut self, column: usize, row: usize) -> LcdResult<()>;

    /// Writes a raw character code at the cursor, which then advances per the entry mode.
    fn write_character(&mut self, code: u8) -> LcdResult<()>;

    /// Uploads a 5x8 glyph to one of the 8 CGRAM slots.
    /// Only the low 5 bits of each row are used. The glyph is then shown by writing `location`.
    ///
    /// # Errors
    /// - [LcdError::InvalidCustomCharLocation] if `location > 7`.
    /// - [LcdError::InvalidCustomCharLength] if `bitmap` is not 8 rows.
    fn create_custom_character(&mut self, location: u8, bitmap: &[u8]) -> LcdResult<()>;

    /// Shifts the whole display content by one character.
    fn shift_display(&mut self, direction: CursorDirection) -> LcdResult<()>;

    /// Moves the cursor by one character.
    fn shift_cursor(&mut self, direction: CursorDirection) -> LcdResult<()>;

    fn rows(&self) -> usize {
        self.geometry().rows()
    }

    fn columns(&self) -> usize {
        self.geometry().columns()
    }

    fn set_display(&mut self, on: bool) -> LcdResult<()> {
        let state = self.state();
        self.display_control(on, state.cursor_visible, state.cursor_blinking)
    }

    fn set_cursor_visible(&mut self, on: bool) -> LcdResult<()> {
        let state = self.state();
        self.display_control(state.display_on, on, state.cursor_blinking)
    }

    fn set_cursor_blinking(&mut self, on: bool) -> LcdResult<()> {
        let state = self.state();
        self.display_control(state.display_on, state.cursor_visible, on)
    }

    fn set_autoscroll(&mut self, on: bool) -> LcdResult<()> {
        let direction = if self.state().entry_left_to_right {
            CursorDirection::Right
        } else {
            CursorDirection::Left
        };
        self.set_entry_mode(direction, on)
    }

    fn set_text_direction(&mut self, direction: CursorDirection) -> LcdResult<()> {
        let autoscroll = self.state().autoscroll_on;
        self.set_entry_mode(direction, autoscroll)
    }

    /// Turns the display and then the backlight on.
    fn power_on(&mut self) -> LcdResult<()> {
        self.set_display(true)?;
        self.set_backlight(true)
    }

    /// Turns the backlight and then the display off. The contents are kept.
    fn power_off(&mut self) -> LcdResult<()> {
        self.set_backlight(false)?;
        self.set_display(false)
    }

    /// Writes a string at the cursor, see [lcd_code].
    fn print(&mut self, text: &str) -> LcdResult<()> {
        for c in text.chars() {
            self.write_character(lcd_code(c))?;
        }
        Ok(())
    }

    /// Blanks a row.
    fn clear_line(&mut self, row: usize) -> LcdResult<()> {
        self.set_cursor_position(0, row)?;
        for _ in 0..self.columns() {
            self.write_character(b' ')?;
        }
        Ok(())
    }

    /// Clears `row` and writes `text` on it starting at `column`.
    ///
    /// # Errors
    /// - [LcdError::LineOutOfRange], [LcdError::ColumnOutOfRange] as in [Self::set_cursor_position].
    /// - [LcdError::TextTooLong] if the text doesn't fit between `column` and the end of the row.
    fn display_text(&mut self, text: &str, row: usize, column: usize) -> LcdResult<()> {
        let geometry = self.geometry();
        geometry.check_row(row)?;
        geometry.check_column(column)?;
        let length = text.chars().count();
        let max = geometry.columns() - column;
        if length > max {
            return Err(LcdError::TextTooLong { length, max });
        }

        self.clear_line(row)?;
        self.set_cursor_position(column, row)?;
        self.print(text)
    }

    /// Lays `text` out over the whole display (see [layout::layout_text]) and writes every row.
    fn write_text(&mut self, text: &str) -> LcdResult<()> {
        let rows = layout::layout_text(text, self.geometry())?;
        for (row, line) in rows.iter().enumerate() {
            self.display_text(line, row, 0)?;
        }
        Ok(())
    }
}
