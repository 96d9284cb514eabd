use crate::hd44780::command::{
    cgram_address, clear_display, cursor_or_display_shift, ddram_address, display_control,
    entry_mode, function_set, return_home,
};
use crate::hd44780::transport::NibbleTransport;
use crate::hd44780::{CharacterLcd, CursorDirection, DisplayState, Geometry};
use crate::sink::ByteSink;
use crate::timing::Timing;
use crate::{LcdError, LcdResult};
use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};
use std::fmt::{Debug, Formatter};

/// Amount of custom characters the CGRAM holds.
pub const CUSTOM_CHAR_SLOTS: u8 = 8;
/// Rows of a custom character bitmap.
pub const CUSTOM_CHAR_ROWS: usize = 8;

/// HD44780 display behind an I/O-expander backpack.
///
/// The controller owns the sink for its whole life. On [Hd44780Lcd::close], or when dropped,
/// it turns the backlight and the display off and releases the sink, once.
///
/// Errors from the sink are returned as they are, without retrying. The tracked
/// [DisplayState] is updated before sending, so after a transport error it may not match the
/// hardware anymore; create a new controller to reset the display in that case.
pub struct Hd44780Lcd<S: ByteSink, D: DelayNs> {
    transport: NibbleTransport<S, D>,
    geometry: Geometry,
    state: DisplayState,
    closed: bool,
}

impl<S: ByteSink, D: DelayNs> Hd44780Lcd<S, D> {
    /// Creates the controller with the default [Timing] and initializes the display.
    pub fn new(sink: S, delay: D, geometry: Geometry) -> LcdResult<Self> {
        Self::with_timing(sink, delay, geometry, Timing::default())
    }

    /// Creates the controller and initializes the display.
    ///
    /// See [Self::init] for what is sent.
    pub fn with_timing(sink: S, delay: D, geometry: Geometry, timing: Timing) -> LcdResult<Self> {
        let mut lcd = Self {
            transport: NibbleTransport::new(sink, delay, timing),
            geometry,
            state: DisplayState::default(),
            closed: false,
        };
        lcd.init()?;
        Ok(lcd)
    }

    /// Brings the display into a known state, whatever it was in before.
    ///
    /// The display might be in 8-bit mode, or in 4-bit mode halfway through a byte, so it first
    /// gets the 8-bit function set (`0011`) three times as a lone nibble, which lands it in 8-bit
    /// mode in every case. Then `0010` switches it to 4-bit mode, after which full bytes can be sent:
    /// - function set: 4-bit, 2 lines, 5x8 font (also used for 1 and 4 line displays),
    /// - display on, cursor off, blink off,
    /// - entry mode left to right, no autoscroll,
    /// - clear display,
    /// - backlight on.
    pub fn init(&mut self) -> LcdResult<()> {
        debug!("Initializing {:?}", self);
        let timing = *self.transport.timing();
        self.transport.wait(timing.power_on);

        let backlight = self.state.backlight_on;
        for _ in 0..3 {
            self.transport
                .send_nibble(function_set(true, false, false), backlight)?;
            self.transport.wait(timing.reset);
        }
        self.transport
            .send_nibble(function_set(false, false, false), backlight)?;

        self.send_command(function_set(false, true, false))?;
        self.display_control(true, false, false)?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.clear()?;
        self.set_backlight(true)?;
        debug!("{:?} initialized.", self);
        Ok(())
    }

    /// Turns the display off and releases the sink.
    pub fn close(mut self) -> LcdResult<()> {
        self.shutdown()
    }

    pub fn sink(&self) -> &S {
        self.transport.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.transport.sink_mut()
    }

    pub fn timing(&self) -> &Timing {
        self.transport.timing()
    }

    fn shutdown(&mut self) -> LcdResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("Shutting {:?} down", self);

        let powered_off = self.power_off();
        let released = self.transport.close().map_err(LcdError::from);
        powered_off.and(released)
    }

    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.transport.send(command, false, self.state.backlight_on)?;
        Ok(())
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.transport.send(data, true, self.state.backlight_on)?;
        Ok(())
    }

    /// Sends a command that takes the controller milliseconds to execute, and waits for it.
    fn send_long_command(&mut self, command: u8) -> LcdResult<()> {
        self.send_command(command)?;
        let long_command = self.transport.timing().long_command;
        self.transport.wait(long_command);
        Ok(())
    }
}

impl<S: ByteSink, D: DelayNs> Debug for Hd44780Lcd<S, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hd44780Lcd({}x{}, {:?})",
            self.geometry.columns(),
            self.geometry.rows(),
            self.transport
        )
    }
}

impl<S: ByteSink, D: DelayNs> Drop for Hd44780Lcd<S, D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to shut the LCD down: {}", e);
        }
    }
}

impl<S: ByteSink, D: DelayNs> CharacterLcd for Hd44780Lcd<S, D> {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn state(&self) -> DisplayState {
        self.state
    }

    /// The backlight is a line of the expander, not an LCD command, so this is a single bus write.
    fn set_backlight(&mut self, on: bool) -> LcdResult<()> {
        self.state.backlight_on = on;
        self.transport.write_backlight(on)?;
        Ok(())
    }

    fn display_control(&mut self, on: bool, cursor: bool, blink: bool) -> LcdResult<()> {
        self.state.display_on = on;
        self.state.cursor_visible = cursor;
        self.state.cursor_blinking = blink;
        self.send_command(display_control(on, cursor, blink))
    }

    fn set_entry_mode(&mut self, direction: CursorDirection, autoscroll: bool) -> LcdResult<()> {
        let left_to_right = direction == CursorDirection::Right;
        self.state.entry_left_to_right = left_to_right;
        self.state.autoscroll_on = autoscroll;
        self.send_command(entry_mode(left_to_right, autoscroll))
    }

    fn clear(&mut self) -> LcdResult<()> {
        self.send_long_command(clear_display())
    }

    fn return_home(&mut self) -> LcdResult<()> {
        self.send_long_command(return_home())
    }

    fn set_cursor_position(&mut self, column: usize, row: usize) -> LcdResult<()> {
        let offset = self.geometry.ddram_offset(column, row)?;
        trace!("Cursor to ({}, {}), DDRAM {:#04x}", column, row, offset);
        self.send_command(ddram_address(offset))
    }

    fn write_character(&mut self, code: u8) -> LcdResult<()> {
        self.send_data(code)
    }

    /// Leaves the address counter in CGRAM, so move the cursor before writing text again.
    fn create_custom_character(&mut self, location: u8, bitmap: &[u8]) -> LcdResult<()> {
        if location >= CUSTOM_CHAR_SLOTS {
            return Err(LcdError::InvalidCustomCharLocation(location));
        }
        if bitmap.len() != CUSTOM_CHAR_ROWS {
            return Err(LcdError::InvalidCustomCharLength(bitmap.len()));
        }

        self.send_command(cgram_address(location))?;
        for &row in bitmap {
            self.send_data(row & 0b0001_1111)?;
        }
        Ok(())
    }

    fn shift_display(&mut self, direction: CursorDirection) -> LcdResult<()> {
        self.send_command(cursor_or_display_shift(
            true,
            direction == CursorDirection::Right,
        ))
    }

    fn shift_cursor(&mut self, direction: CursorDirection) -> LcdResult<()> {
        self.send_command(cursor_or_display_shift(
            false,
            direction == CursorDirection::Right,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hd44780::transport::{decode, BACKLIGHT_BIT};
    use crate::sink::{MemorySink, TransportError};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    type TestLcd = Hd44780Lcd<MemorySink, NoopDelay>;

    fn lcd(geometry: Geometry) -> TestLcd {
        let mut lcd = Hd44780Lcd::new(MemorySink::new(), NoopDelay::new(), geometry).unwrap();
        lcd.sink_mut().clear();
        lcd
    }

    fn commands(lcd: &TestLcd) -> Vec<u8> {
        decode(lcd.sink().bytes())
            .into_iter()
            .map(|(value, is_data)| {
                assert!(!is_data);
                value
            })
            .collect()
    }

    #[test]
    fn init_sequence() {
        let lcd = Hd44780Lcd::new(MemorySink::new(), NoopDelay::new(), Geometry::LCD1602).unwrap();
        let bytes = lcd.sink().bytes();

        // Soft reset, one nibble each
        assert_eq!(
            &bytes[..12],
            &[
                0x30, 0x34, 0x30, 0x30, 0x34, 0x30, 0x30, 0x34, 0x30, 0x20, 0x24, 0x20
            ]
        );
        // Function set, display control, entry mode, clear; backlight still off
        assert_eq!(
            decode(&bytes[12..36]),
            [(0x28, false), (0x0C, false), (0x06, false), (0x01, false)]
        );
        assert!(bytes[..36].iter().all(|byte| byte & BACKLIGHT_BIT == 0));
        // And the backlight goes on
        assert_eq!(&bytes[36..], &[BACKLIGHT_BIT]);

        let state = lcd.state();
        assert!(state.backlight_on);
        assert!(state.display_on);
        assert!(!state.cursor_visible);
        assert!(!state.cursor_blinking);
        assert!(state.entry_left_to_right);
        assert!(!state.autoscroll_on);
    }

    #[test]
    fn backlight_toggles_are_single_writes() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.set_backlight(true).unwrap();
        lcd.set_backlight(false).unwrap();
        lcd.set_backlight(true).unwrap();
        lcd.set_backlight(false).unwrap();
        assert_eq!(lcd.sink().bytes(), &[0x08, 0x00, 0x08, 0x00]);
    }

    #[test]
    fn commands_carry_the_backlight_bit() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.set_cursor_visible(true).unwrap();
        assert!(lcd.sink().bytes().iter().all(|b| b & BACKLIGHT_BIT != 0));

        lcd.set_backlight(false).unwrap();
        lcd.sink_mut().clear();
        lcd.set_cursor_visible(false).unwrap();
        assert!(lcd.sink().bytes().iter().all(|b| b & BACKLIGHT_BIT == 0));
    }

    #[test]
    fn power_on_turns_the_display_on_before_the_backlight() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.power_off().unwrap();
        assert!(!lcd.state().display_on);
        lcd.sink_mut().clear();

        lcd.power_on().unwrap();
        let bytes = lcd.sink().bytes();
        assert_eq!(decode(&bytes[..6]), [(0x0C, false)]);
        assert_eq!(&bytes[6..], &[BACKLIGHT_BIT]);
        assert!(lcd.state().display_on);
        assert!(lcd.state().backlight_on);
    }

    #[test]
    fn display_flags_are_combined() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.set_cursor_visible(true).unwrap();
        lcd.set_cursor_blinking(true).unwrap();
        lcd.set_display(false).unwrap();
        lcd.set_cursor_visible(false).unwrap();
        // Same value again is sent again
        lcd.set_cursor_visible(false).unwrap();
        assert_eq!(commands(&lcd), [0x0E, 0x0F, 0x0B, 0x09, 0x09]);
    }

    #[test]
    fn entry_mode_flags() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.set_autoscroll(true).unwrap();
        lcd.set_text_direction(CursorDirection::Left).unwrap();
        lcd.set_entry_mode(CursorDirection::Right, false).unwrap();
        assert_eq!(commands(&lcd), [0x07, 0x05, 0x06]);
        assert!(lcd.state().entry_left_to_right);
        assert!(!lcd.state().autoscroll_on);
    }

    #[test]
    fn cursor_position() {
        let mut lcd = lcd(Geometry::LCD2004);
        lcd.set_cursor_position(0, 0).unwrap();
        lcd.set_cursor_position(0, 1).unwrap();
        lcd.set_cursor_position(5, 2).unwrap();
        lcd.set_cursor_position(20, 3).unwrap();
        assert_eq!(commands(&lcd), [0x80, 0xC0, 0x94 + 5, 0xD4 + 20]);
    }

    #[test]
    fn cursor_position_bounds() {
        let mut lcd = lcd(Geometry::LCD1602);
        assert_eq!(
            lcd.set_cursor_position(0, 2),
            Err(LcdError::LineOutOfRange { row: 2, rows: 2 })
        );
        assert_eq!(
            lcd.set_cursor_position(17, 0),
            Err(LcdError::ColumnOutOfRange {
                column: 17,
                columns: 16
            })
        );
        assert!(lcd.sink().bytes().is_empty());
        assert!(lcd.set_cursor_position(16, 0).is_ok());
    }

    #[test]
    fn write_after_clear_lands_at_home() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.set_cursor_position(4, 1).unwrap();
        lcd.sink_mut().clear();

        lcd.clear().unwrap();
        lcd.write_character(b'A').unwrap();
        // Nothing moves the cursor between the clear and the character
        assert_eq!(
            decode(lcd.sink().bytes()),
            [(0x01, false), (b'A', true)]
        );
    }

    #[test]
    fn custom_character() {
        let mut lcd = lcd(Geometry::LCD1602);
        let bitmap = [0xFF, 0x11, 0x0A, 0x04, 0x04, 0x0A, 0x11, 0x00];
        lcd.create_custom_character(7, &bitmap).unwrap();

        let sent = decode(lcd.sink().bytes());
        assert_eq!(sent[0], (0x78, false));
        assert_eq!(sent[1], (0x1F, true));
        assert_eq!(
            sent[2..].iter().map(|&(value, _)| value).collect::<Vec<_>>(),
            &bitmap[1..]
        );
        assert!(sent[1..].iter().all(|&(_, is_data)| is_data));
    }

    #[test]
    fn custom_character_bounds() {
        let mut lcd = lcd(Geometry::LCD1602);
        let bitmap = [0u8; 9];

        assert!(lcd.create_custom_character(0, &bitmap[..8]).is_ok());
        assert!(lcd.create_custom_character(7, &bitmap[..8]).is_ok());
        lcd.sink_mut().clear();

        assert_eq!(
            lcd.create_custom_character(8, &bitmap[..8]),
            Err(LcdError::InvalidCustomCharLocation(8))
        );
        assert_eq!(
            lcd.create_custom_character(u8::MAX, &bitmap[..8]),
            Err(LcdError::InvalidCustomCharLocation(u8::MAX))
        );
        for length in [0, 7, 9] {
            assert_eq!(
                lcd.create_custom_character(0, &bitmap[..length]),
                Err(LcdError::InvalidCustomCharLength(length))
            );
        }
        assert!(lcd.sink().bytes().is_empty());
    }

    #[test]
    fn shifts() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.shift_display(CursorDirection::Right).unwrap();
        lcd.shift_display(CursorDirection::Left).unwrap();
        lcd.shift_cursor(CursorDirection::Right).unwrap();
        lcd.shift_cursor(CursorDirection::Left).unwrap();
        assert_eq!(commands(&lcd), [0x1C, 0x18, 0x14, 0x10]);
        assert_eq!(lcd.state(), {
            let mut state = DisplayState::default();
            state.backlight_on = true;
            state.display_on = true;
            state
        });
    }

    #[test]
    fn display_text_clears_the_row_first() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.display_text("HI", 1, 3).unwrap();

        let sent = decode(lcd.sink().bytes());
        assert_eq!(sent[0], (0xC0, false));
        assert!(sent[1..17].iter().all(|&entry| entry == (b' ', true)));
        assert_eq!(&sent[17..], &[(0xC3, false), (b'H', true), (b'I', true)]);
    }

    #[test]
    fn display_text_bounds() {
        let mut lcd = lcd(Geometry::LCD1602);
        assert_eq!(
            lcd.display_text(&"X".repeat(17), 0, 0),
            Err(LcdError::TextTooLong {
                length: 17,
                max: 16
            })
        );
        assert_eq!(
            lcd.display_text("ABC", 0, 14),
            Err(LcdError::TextTooLong { length: 3, max: 2 })
        );
        assert_eq!(
            lcd.display_text("A", 2, 0),
            Err(LcdError::LineOutOfRange { row: 2, rows: 2 })
        );
        assert!(lcd.sink().bytes().is_empty());

        assert!(lcd.display_text(&"X".repeat(16), 0, 0).is_ok());
        assert!(lcd.display_text("", 0, 16).is_ok());
    }

    #[test]
    fn write_text_renders_every_row() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.write_text("HELLO\n WORLD").unwrap();

        let sent = decode(lcd.sink().bytes());
        // Each row: address, 16 blanks, address, text
        assert_eq!(sent.len(), 2 * 18 + "HELLO".len() + "WORLD".len());
        let text: String = sent
            .iter()
            .filter(|&&(value, is_data)| is_data && value != b' ')
            .map(|&(value, _)| value as char)
            .collect();
        assert_eq!(text, "HELLOWORLD");
    }

    #[test]
    fn write_text_too_long_sends_nothing() {
        let mut lcd = lcd(Geometry::LCD1602);
        assert!(matches!(
            lcd.write_text(&"X".repeat(33)),
            Err(LcdError::TextTooLong { .. })
        ));
        assert!(lcd.sink().bytes().is_empty());
    }

    #[test]
    fn non_ascii_text_is_replaced() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.print("zł").unwrap();
        assert_eq!(decode(lcd.sink().bytes()), [(b'z', true), (b'?', true)]);
    }

    #[test]
    fn transport_errors_are_surfaced() {
        let mut lcd = lcd(Geometry::LCD1602);
        lcd.sink_mut().close().unwrap();
        assert_eq!(
            lcd.set_cursor_visible(true),
            Err(LcdError::Transport(TransportError::Closed))
        );
        // The flag is kept even though the command didn't go through
        assert!(lcd.state().cursor_visible);
    }

    #[test]
    fn close_powers_off_and_releases_once() {
        let mut sink = MemorySink::new();
        let lcd = Hd44780Lcd::new(&mut sink, NoopDelay::new(), Geometry::LCD1602).unwrap();
        lcd.close().unwrap();

        assert_eq!(sink.close_count(), 1);
        let bytes = sink.bytes();
        let tail = &bytes[bytes.len() - 7..];
        assert_eq!(tail[0], 0x00);
        assert_eq!(decode(&tail[1..]), [(0x08, false)]);
    }

    #[test]
    fn drop_releases_once() {
        let mut sink = MemorySink::new();
        {
            let mut lcd =
                Hd44780Lcd::new(&mut sink, NoopDelay::new(), Geometry::LCD2004).unwrap();
            lcd.print("BYE").unwrap();
        }
        assert_eq!(sink.close_count(), 1);
        assert!(sink.is_closed());
    }

    #[test]
    fn failed_init_still_releases() {
        let mut sink = MemorySink::new();
        sink.close().unwrap();
        let result = Hd44780Lcd::new(&mut sink, NoopDelay::new(), Geometry::LCD1602);
        assert_eq!(
            result.err(),
            Some(LcdError::Transport(TransportError::Closed))
        );
        assert_eq!(sink.close_count(), 2);
    }
}
