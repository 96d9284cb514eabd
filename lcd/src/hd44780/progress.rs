use crate::hd44780::glyphs::{PROGRESS_ASCENDING, PROGRESS_DESCENDING};
use crate::hd44780::{CharacterLcd, CursorDirection};
use crate::LcdResult;
use log::debug;

/// CGRAM slot of the first progress glyph, the bar takes this one and the next three.
pub const PROGRESS_FIRST_SLOT: u8 = 2;

/// A percentage bar taking up one row of the display.
///
/// Each cell is drawn in quarters using custom characters, so the bar has `columns * 4` steps.
#[derive(Debug)]
pub struct ProgressBar<'a> {
    lcd: &'a mut dyn CharacterLcd,
    row: usize,
    direction: CursorDirection,
    value: u8,
}

impl<'a> ProgressBar<'a> {
    /// Uploads the progress glyphs and creates an empty bar on `row`, growing in `direction`.
    pub fn new(
        lcd: &'a mut dyn CharacterLcd,
        row: usize,
        direction: CursorDirection,
    ) -> LcdResult<Self> {
        lcd.geometry().check_row(row)?;

        let glyphs = match direction {
            CursorDirection::Right => &PROGRESS_ASCENDING,
            CursorDirection::Left => &PROGRESS_DESCENDING,
        };
        for (slot, glyph) in (PROGRESS_FIRST_SLOT..).zip(glyphs) {
            lcd.create_custom_character(slot, glyph)?;
        }

        Ok(Self {
            lcd,
            row,
            direction,
            value: 0,
        })
    }

    /// Gets the current percentage.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Sets the percentage and redraws the row. Values above 100 are ignored.
    pub fn set_value(&mut self, value: u8) -> LcdResult<()> {
        if value > 100 {
            debug!("Ignoring progress value {}", value);
            return Ok(());
        }
        self.value = value;

        let mut cells = cells(value, self.lcd.columns());
        if self.direction == CursorDirection::Left {
            cells.reverse();
        }

        self.lcd.set_cursor_position(0, self.row)?;
        for code in cells {
            self.lcd.write_character(code)?;
        }
        Ok(())
    }
}

/// Character codes of each cell of a bar filled to `value` percent, starting from the filled end.
fn cells(value: u8, columns: usize) -> Vec<u8> {
    let quarters = (value as usize * columns * 4 + 50) / 100;
    let full = quarters / 4;
    let partial = (quarters % 4) as u8;

    (0..columns)
        .map(|cell| {
            if cell < full {
                PROGRESS_FIRST_SLOT + 3
            } else if cell == full && partial > 0 {
                PROGRESS_FIRST_SLOT + partial - 1
            } else {
                b' '
            }
        })
        .collect()
}
