//! Color attribute encoding (color.h order)
//!
//! A screen color is one byte: the ANSI base color in the low three bits,
//! [`BRIGHT`] for bold/high-intensity, and [`REVERSE_OFFSET`] added on top
//! for reverse video. That gives 16 normal and 16 reversed classes.

/// Color constants
pub const CLR_BLACK: u8 = 0;
pub const CLR_RED: u8 = 1;
pub const CLR_GREEN: u8 = 2;
pub const CLR_BROWN: u8 = 3;
pub const CLR_BLUE: u8 = 4;
pub const CLR_MAGENTA: u8 = 5;
pub const CLR_CYAN: u8 = 6;
pub const CLR_GRAY: u8 = 7;
pub const CLR_ORANGE: u8 = 9;
pub const CLR_BRIGHT_GREEN: u8 = 10;
pub const CLR_YELLOW: u8 = 11;
pub const CLR_BRIGHT_BLUE: u8 = 12;
pub const CLR_BRIGHT_MAGENTA: u8 = 13;
pub const CLR_BRIGHT_CYAN: u8 = 14;
pub const CLR_WHITE: u8 = 15;

/// Bright (bold) bit
pub const BRIGHT: u8 = 0x08;

/// Number of non-reversed color classes
pub const NUM_COLORS: u8 = 16;

/// Added to the color of a reverse-video cell
pub const REVERSE_OFFSET: u8 = NUM_COLORS;

/// Reported for foreground codes the encoding cannot represent
pub const INVALID_COLOR: u8 = CLR_RED | BRIGHT;

/// Dim shade in which doorways are drawn with wall glyphs
pub const STRUCTURAL_COLOR: u8 = CLR_BROWN;

/// Whether the bright bit is set
#[inline]
pub const fn is_bright(color: u8) -> bool {
    color & BRIGHT != 0
}

/// Whether the color was produced from a reverse-video cell
#[inline]
pub const fn is_reverse(color: u8) -> bool {
    color >= REVERSE_OFFSET
}
