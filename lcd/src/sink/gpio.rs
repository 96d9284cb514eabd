//! Expander emulation on 8 lines of a Linux GPIO chip.
use crate::sink::{ByteSink, TransportError, TransportResult};
use bitvec::prelude::*;
use log::{debug, trace};
use std::array;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("line {line} is used twice")]
    DuplicateLine { line: u32 },
    #[error("line {line} out of range, the chip has {count} lines")]
    LineOutOfRange { line: u32, count: u32 },
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// A sink writing each byte in parallel onto 8 GPIO output lines, through the GPIO character
/// device.
///
/// Line `i` carries bit `i` of the byte, so wiring the LCD like a PCF8574 backpack
/// (P0 = RS, P1 = RW, P2 = E, P3 = backlight, P4..P7 = D4..D7) makes the bytes identical
/// to the ones an I²C backpack would receive.
pub struct GpiodSink {
    chip_name: String,
    offsets: [u32; 8],
    /// `None` once closed, which hands the lines back to the kernel.
    lines: Option<gpiod::Lines<gpiod::Output>>,
}

impl GpiodSink {
    /// Requests the `offsets` of the chip at `path` (e.g. `/dev/gpiochip0`) as outputs.
    /// `offsets[i]` is the line wired to expander bit P`i`.
    pub fn open(path: impl AsRef<Path>, offsets: [u32; 8]) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path.as_ref())?;
        check_offsets(&offsets, chip.num_lines())?;

        let lines = chip.request_lines(
            gpiod::Options::output(offsets).consumer(env!("CARGO_PKG_NAME")),
        )?;
        debug!("Requested lines {:?} of {}", offsets, chip.name());

        Ok(Self {
            chip_name: chip.name().to_string(),
            offsets,
            lines: Some(lines),
        })
    }
}

impl Debug for GpiodSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodSink({}{:?})", self.chip_name, self.offsets)
    }
}

impl ByteSink for GpiodSink {
    fn write(&mut self, byte: u8) -> TransportResult<()> {
        let Some(lines) = &self.lines else {
            return Err(TransportError::Closed);
        };
        trace!("GPIO lines: {:08b}", byte);
        lines.set_values(line_values(byte)).map_err(GpioError::from)?;
        Ok(())
    }

    /// Pulls every line low and releases them.
    fn close(&mut self) -> TransportResult<()> {
        let Some(lines) = self.lines.take() else {
            return Ok(());
        };
        debug!("Releasing {:?}", self);
        lines.set_values([false; 8]).map_err(GpioError::from)?;
        Ok(())
    }
}

/// Values of the 8 lines for `byte`, P0 first.
pub fn line_values(byte: u8) -> [bool; 8] {
    let bits = byte.view_bits::<Lsb0>();
    array::from_fn(|i| bits[i])
}

/// Checks that every offset exists on a chip with `count` lines, and appears only once.
fn check_offsets(offsets: &[u32], count: u32) -> GpioResult<()> {
    let mut used: BitVec = BitVec::repeat(false, count as usize);
    for &line in offsets {
        if line >= count {
            return Err(GpioError::LineOutOfRange { line, count });
        }
        if used.replace(line as usize, true) {
            return Err(GpioError::DuplicateLine { line });
        }
    }
    Ok(())
}
