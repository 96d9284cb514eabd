//! Byte sinks: the write-only bus the LCD backpack sits on.
//!
//! Every byte handed to a sink is one raw bus transaction, carrying all the expander bits
//! (register select, read/write, enable, backlight and the 4 data lines) at once.
mod gpio;
mod i2c;

pub use gpio::*;
pub use i2c::*;

use log::trace;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum TransportError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
    #[error("bus error: {0}")]
    Bus(String),
    #[error("the sink has already been released")]
    Closed,
}

pub type TransportResult<T> = Result<T, TransportError>;

pub trait ByteSink: Debug {
    /// Writes a single byte to the bus, blocking until the transaction is done.
    fn write(&mut self, byte: u8) -> TransportResult<()>;

    /// Releases the underlying bus. Writes after this fail with [TransportError::Closed].
    fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write(&mut self, byte: u8) -> TransportResult<()> {
        (**self).write(byte)
    }

    fn close(&mut self) -> TransportResult<()> {
        (**self).close()
    }
}

/// A sink that only remembers what was written to it.
///
/// Used as a dry-run backend and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    bytes: Vec<u8>,
    closed: bool,
    close_count: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All the bytes written so far, in order.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Forgets the recorded bytes.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many times [ByteSink::close] was called.
    pub fn close_count(&self) -> usize {
        self.close_count
    }
}

impl ByteSink for MemorySink {
    fn write(&mut self, byte: u8) -> TransportResult<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        trace!("Memory sink: {:08b}", byte);
        self.bytes.push(byte);
        Ok(())
    }

    fn close(&mut self) -> TransportResult<()> {
        self.closed = true;
        self.close_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_and_refuses_after_close() {
        let mut sink = MemorySink::new();
        sink.write(0x12).unwrap();
        sink.write(0x34).unwrap();
        assert_eq!(sink.bytes(), &[0x12, 0x34]);

        sink.close().unwrap();
        assert_eq!(sink.write(0x56), Err(TransportError::Closed));
        assert_eq!(sink.close_count(), 1);
    }

    #[test]
    fn borrowed_sink_writes_through() {
        let mut sink = MemorySink::new();
        {
            let mut borrowed = &mut sink;
            ByteSink::write(&mut borrowed, 0xAB).unwrap();
        }
        assert_eq!(sink.bytes(), &[0xAB]);
    }
}
