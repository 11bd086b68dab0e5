//! Terminal geometry shared by every component

/// Columns of the emulated terminal
pub const SCREEN_WIDTH: usize = 80;

/// Rows of the emulated terminal
pub const SCREEN_HEIGHT: usize = 24;

/// Number of cells in the flattened grid
pub const SCREEN_CELLS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// Row holding the attribute half of the bottom line (St, Dx, ...)
pub const STATUS_LINE_ATTRIBUTES: usize = SCREEN_HEIGHT - 2;

/// Row holding the dungeon half of the bottom line (Dlvl, $, HP, ...)
pub const STATUS_LINE_DUNGEON: usize = SCREEN_HEIGHT - 1;
