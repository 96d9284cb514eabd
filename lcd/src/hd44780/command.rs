//! HD44780 instruction set.
//!
//! Each command is a byte made of a command bit OR'd with its flag bits. The values are the
//! wire contract with the controller and must not change.

// Commands
pub const CLEAR_DISPLAY: u8 = 0x01;
pub const RETURN_HOME: u8 = 0x02;
pub const ENTRY_MODE_SET: u8 = 0x04;
pub const DISPLAY_CONTROL: u8 = 0x08;
pub const CURSOR_SHIFT: u8 = 0x10;
pub const FUNCTION_SET: u8 = 0x20;
pub const SET_CGRAM_ADDR: u8 = 0x40;
pub const SET_DDRAM_ADDR: u8 = 0x80;

// Entry mode
/// Cursor moves right after a write (RAM address incremented).
pub const ENTRY_INCREMENT: u8 = 0x02;
/// Cursor moves left after a write (RAM address decremented).
pub const ENTRY_DECREMENT: u8 = 0x00;
pub const ENTRY_DISABLE_SHIFT: u8 = 0x00;
pub const ENTRY_ENABLE_SHIFT: u8 = 0x01;

// Display control
pub const DISPLAY_ON: u8 = 0x04;
pub const CURSOR_ON: u8 = 0x02;
pub const BLINK_ON: u8 = 0x01;

// Cursor or display shift
pub const DISPLAY_MOVE: u8 = 0x08;
pub const CURSOR_MOVE: u8 = 0x00;
pub const MOVE_RIGHT: u8 = 0x04;
pub const MOVE_LEFT: u8 = 0x00;

// Function set
pub const MODE_8BIT: u8 = 0x10;
pub const MODE_4BIT: u8 = 0x00;
pub const MODE_2LINE: u8 = 0x08;
pub const MODE_1LINE: u8 = 0x00;
pub const DOTS_5X10: u8 = 0x04;
pub const DOTS_5X8: u8 = 0x00;

/// Clears the display and sets the cursor to the home position.
pub const fn clear_display() -> u8 {
    CLEAR_DISPLAY
}

/// Sets the cursor to the home position and undoes any display shift.
pub const fn return_home() -> u8 {
    RETURN_HOME
}

/// Command: `000001IS`.
/// `I` is `1` for the cursor moving right after a write, `S` shifts the display instead.
pub const fn entry_mode(left_to_right: bool, autoscroll: bool) -> u8 {
    let mut command = ENTRY_MODE_SET;
    if left_to_right {
        command |= ENTRY_INCREMENT;
    } else {
        command |= ENTRY_DECREMENT;
    }
    if autoscroll {
        command |= ENTRY_ENABLE_SHIFT;
    }
    command
}

/// Command: `00001DCB` - display on, cursor on, cursor blinking.
pub const fn display_control(on: bool, cursor: bool, blink: bool) -> u8 {
    let mut command = DISPLAY_CONTROL;
    if on {
        command |= DISPLAY_ON;
    }
    if cursor {
        command |= CURSOR_ON;
    }
    if blink {
        command |= BLINK_ON;
    }
    command
}

/// Command: `0001DR??` - `D` moves the whole display instead of the cursor, `R` moves right.
pub const fn cursor_or_display_shift(move_display: bool, move_right: bool) -> u8 {
    let mut command = CURSOR_SHIFT;
    if move_display {
        command |= DISPLAY_MOVE;
    }
    if move_right {
        command |= MOVE_RIGHT;
    }
    command
}

/// Command: `001DNF??` - 8-bit data length, 2 lines, 5x10 font.
pub const fn function_set(eight_bit_bus: bool, two_line: bool, tall_font: bool) -> u8 {
    let mut command = FUNCTION_SET;
    if eight_bit_bus {
        command |= MODE_8BIT;
    }
    if two_line {
        command |= MODE_2LINE;
    }
    if tall_font {
        command |= DOTS_5X10;
    }
    command
}

/// Sets the DDRAM address, which is where the next character goes.
pub const fn ddram_address(offset: u8) -> u8 {
    SET_DDRAM_ADDR | offset
}

/// Sets the CGRAM address to the first row of the custom character at `location`.
pub const fn cgram_address(location: u8) -> u8 {
    SET_CGRAM_ADDR | (location << 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_compose() {
        assert_eq!(clear_display(), 0x01);
        assert_eq!(return_home(), 0x02);
        assert_eq!(entry_mode(true, false), 0x06);
        assert_eq!(entry_mode(false, true), 0x05);
        assert_eq!(entry_mode(true, false), ENTRY_MODE_SET | ENTRY_INCREMENT);
        assert_eq!(entry_mode(false, false), ENTRY_MODE_SET | ENTRY_DECREMENT);
        assert_eq!(display_control(true, false, false), 0x0C);
        assert_eq!(display_control(true, true, true), 0x0F);
        assert_eq!(display_control(false, false, false), 0x08);
        assert_eq!(cursor_or_display_shift(true, true), 0x1C);
        assert_eq!(cursor_or_display_shift(false, false), 0x10);
        assert_eq!(function_set(false, true, false), 0x28);
        assert_eq!(function_set(true, true, true), 0x3C);
    }

    #[test]
    fn addresses() {
        assert_eq!(ddram_address(0x40), 0xC0);
        assert_eq!(ddram_address(0x54 + 19), 0xE7);
        assert_eq!(cgram_address(0), 0x40);
        assert_eq!(cgram_address(7), 0x78);
    }
}
