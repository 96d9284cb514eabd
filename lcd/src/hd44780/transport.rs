//! 4-bit transport through an I/O expander.
//!
//! The expander exposes all of the LCD lines as one byte per bus transaction:
//!
//! | Bit | Line                 |
//! |-----|----------------------|
//! | 0   | RS (register select) |
//! | 1   | R/W                  |
//! | 2   | E (enable)           |
//! | 3   | Backlight            |
//! | 4-7 | D4-D7                |
//!
//! A byte for the LCD is sent as two nibbles on D4-D7, high nibble first, each latched by a
//! pulse on the enable line.
use crate::sink::{ByteSink, TransportResult};
use crate::timing::{wait, Timing};
use embedded_hal::delay::DelayNs;
use log::trace;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

pub const REGISTER_SELECT_BIT: u8 = 0x01;
/// Always kept low, the LCD is never read.
pub const RW_BIT: u8 = 0x02;
pub const ENABLE_BIT: u8 = 0x04;
pub const BACKLIGHT_BIT: u8 = 0x08;

/// Splits `value` into the two bus nibbles (D4-D7 in the high half), tagging both with the
/// register select bit when `register_select` is set.
pub const fn split_nibbles(value: u8, register_select: bool) -> [u8; 2] {
    let mode = if register_select { REGISTER_SELECT_BIT } else { 0 };
    [mode | (value & 0xF0), mode | ((value << 4) & 0xF0)]
}

/// Delivers commands and data to the LCD through a [ByteSink].
///
/// This is the only thing that writes to the sink.
pub struct NibbleTransport<S: ByteSink, D: DelayNs> {
    sink: S,
    delay: D,
    timing: Timing,
}

impl<S: ByteSink, D: DelayNs> NibbleTransport<S, D> {
    pub fn new(sink: S, delay: D, timing: Timing) -> Self {
        Self {
            sink,
            delay,
            timing,
        }
    }

    /// Sends a full byte as two latched nibbles.
    ///
    /// `register_select` is `false` for commands and `true` for data (characters, glyph rows).
    /// When this returns `Ok`, both nibbles have been latched.
    pub fn send(&mut self, value: u8, register_select: bool, backlight: bool) -> TransportResult<()> {
        trace!("Sending: {:08b}, RS: {}", value, register_select);
        let [high, low] = split_nibbles(value, register_select);
        self.send_nibble(high, backlight)?;
        self.send_nibble(low, backlight)
    }

    /// Puts a single nibble (already in bits 4-7, with RS in bit 0) on the bus and strobes it in.
    pub fn send_nibble(&mut self, nibble: u8, backlight: bool) -> TransportResult<()> {
        let data = nibble | if backlight { BACKLIGHT_BIT } else { 0 };
        trace!("Writing nibble: {:08b}", data);

        self.sink.write(data)?;
        // E high
        self.sink.write(data | ENABLE_BIT)?;
        wait(&mut self.delay, self.timing.enable_pulse);
        // E low, the LCD latches on the falling edge
        self.sink.write(data & !ENABLE_BIT)?;
        wait(&mut self.delay, self.timing.settle);
        Ok(())
    }

    /// Writes only the backlight line, without strobing anything into the LCD.
    pub fn write_backlight(&mut self, backlight: bool) -> TransportResult<()> {
        let data = if backlight { BACKLIGHT_BIT } else { 0 };
        trace!("Backlight: {:08b}", data);
        self.sink.write(data)?;
        wait(&mut self.delay, self.timing.settle);
        Ok(())
    }

    /// Blocks for `duration`.
    pub fn wait(&mut self, duration: Duration) {
        wait(&mut self.delay, duration);
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Releases the sink.
    pub fn close(&mut self) -> TransportResult<()> {
        self.sink.close()
    }
}

impl<S: ByteSink, D: DelayNs> Debug for NibbleTransport<S, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "NibbleTransport({:?})", self.sink)
    }
}

/// Turns strobed bus writes back into `(byte, is_data)` pairs.
#[cfg(test)]
pub(crate) fn decode(bytes: &[u8]) -> Vec<(u8, bool)> {
    assert_eq!(bytes.len() % 6, 0, "partial byte on the bus: {:02x?}", bytes);
    bytes
        .chunks(6)
        .map(|chunk| {
            assert_eq!(chunk[1], chunk[0] | ENABLE_BIT);
            assert_eq!(chunk[2], chunk[0]);
            assert_eq!(chunk[4], chunk[3] | ENABLE_BIT);
            assert_eq!(chunk[5], chunk[3]);
            let value = (chunk[0] & 0xF0) | (chunk[3] >> 4);
            (value, chunk[0] & REGISTER_SELECT_BIT != 0)
        })
        .collect()
}
