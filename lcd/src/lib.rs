//! Driver for HD44780-family character LCDs behind a 4-bit I/O-expander "backpack".
//!
//! The [hd44780] module holds the protocol engine: command encoding, the nibble transport and
//! the stateful [hd44780::Hd44780Lcd] controller. Bytes leave the engine through a
//! [sink::ByteSink], which can be an I²C backpack, 8 GPIO lines or a plain memory buffer.
pub mod hd44780;
pub mod sink;
pub mod timing;

use crate::sink::TransportError;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("row {row} out of range (0 to {rows})")]
    LineOutOfRange { row: usize, rows: usize },
    #[error("column {column} out of range (0 to {columns})")]
    ColumnOutOfRange { column: usize, columns: usize },
    #[error("text too long: {length} characters, only {max} allowed")]
    TextTooLong { length: usize, max: usize },
    #[error("invalid custom character location {0}, must be 0..7")]
    InvalidCustomCharLocation(u8),
    #[error("invalid custom character length {0}, must be 8")]
    InvalidCustomCharLength(usize),
    #[error("invalid geometry {rows}x{columns}, 1 or 2 rows take up to 40 columns, 3 or 4 rows up to 20")]
    InvalidGeometry { rows: usize, columns: usize },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type LcdResult<T> = Result<T, LcdError>;
