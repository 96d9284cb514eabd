use crate::sink::{ByteSink, TransportError, TransportResult};
use embedded_hal::i2c::{Error, I2c};
use log::trace;
use std::fmt::{Debug, Formatter};

/// Default address of the PCF8574 expander.
pub const PCF8574_ADDRESS: u8 = 0x27;
/// Default address of the PCF8574A expander.
pub const PCF8574A_ADDRESS: u8 = 0x3F;

/// A PCF8574-style backpack on an I²C bus. Every byte is a single-byte write to the expander.
pub struct I2cBackpack<I: I2c> {
    i2c: I,
    address: u8,
    closed: bool,
}

impl<I: I2c> I2cBackpack<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            closed: false,
        }
    }

    /// Creates a backpack at [PCF8574_ADDRESS].
    pub fn pcf8574(i2c: I) -> Self {
        Self::new(i2c, PCF8574_ADDRESS)
    }

    /// Creates a backpack at [PCF8574A_ADDRESS].
    pub fn pcf8574a(i2c: I) -> Self {
        Self::new(i2c, PCF8574A_ADDRESS)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> Debug for I2cBackpack<I> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "I2cBackpack({:#04x})", self.address)
    }
}

impl<I: I2c> ByteSink for I2cBackpack<I> {
    fn write(&mut self, byte: u8) -> TransportResult<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        trace!("I2C {:#04x}: {:08b}", self.address, byte);
        self.i2c
            .write(self.address, &[byte])
            .map_err(|e| TransportError::Bus(format!("{:?}", e.kind())))
    }

    fn close(&mut self) -> TransportResult<()> {
        self.closed = true;
        Ok(())
    }
}
