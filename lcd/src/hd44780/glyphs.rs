//! Custom 5x8 characters, to upload with [super::CharacterLcd::create_custom_character].
//!
//! Each byte is one row, top first, using the low 5 bits.

pub type Glyph = [u8; 8];

pub const ARROW_RIGHT: Glyph = [
    0b00000,
    0b00100,
    0b00010,
    0b11111,
    0b00010,
    0b00100,
    0b00000,
    0b00000,
];

pub const RETURN_ARROW: Glyph = [
    0b00001,
    0b00001,
    0b00101,
    0b01001,
    0b11111,
    0b01000,
    0b00100,
    0b00000,
];

/// A cell filled a quarter, half, three quarters and fully, from the left.
pub const PROGRESS_ASCENDING: [Glyph; 4] = [
    [0b10000; 8],
    [0b11000; 8],
    [0b11100; 8],
    [0b11111; 8],
];

/// Same as [PROGRESS_ASCENDING], filling from the right.
pub const PROGRESS_DESCENDING: [Glyph; 4] = [
    [0b00001; 8],
    [0b00011; 8],
    [0b00111; 8],
    [0b11111; 8],
];
