//! Screen model
//!
//! A persistent character/color grid rebuilt incrementally from the rows a
//! terminal engine reports as dirty. The grid is never reset; rows that the
//! engine does not touch keep whatever was drawn there last.

use core::fmt;

use crate::color::{BRIGHT, CLR_BLACK, INVALID_COLOR, NUM_COLORS, REVERSE_OFFSET};
use crate::consts::{SCREEN_CELLS, SCREEN_HEIGHT, SCREEN_WIDTH};

/// One cell as the terminal engine reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermCell {
    /// Character code, truncated to a byte
    pub ch: u8,
    /// Explicit foreground color, `None` when the default color is in effect
    pub fg: Option<u8>,
    pub bold: bool,
    pub reverse: bool,
}

impl TermCell {
    /// A cell in the default color with no attributes
    pub const fn plain(ch: u8) -> Self {
        Self {
            ch,
            fg: None,
            bold: false,
            reverse: false,
        }
    }

    /// A cell with an explicit foreground color
    pub const fn colored(ch: u8, fg: u8, bold: bool) -> Self {
        Self {
            ch,
            fg: Some(fg),
            bold,
            reverse: false,
        }
    }
}

impl Default for TermCell {
    fn default() -> Self {
        Self::plain(b' ')
    }
}

/// A row flagged as changed since the engine was last cleaned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyRow {
    pub row: usize,
    pub cells: Vec<TermCell>,
}

/// Contract of the terminal emulator that decodes the game's output.
///
/// The engine owns escape-sequence decoding. After bytes are written, the
/// caller asks for the cursor and the dirty rows, copies them into a
/// [`ScreenGrid`], then calls [`TerminalEngine::clean`].
pub trait TerminalEngine {
    /// Feed raw bytes read from the game
    fn write(&mut self, bytes: &[u8]);

    /// Current cursor position as (row, column)
    fn cursor(&self) -> (usize, usize);

    /// Rows changed since the last [`TerminalEngine::clean`]
    fn dirty_rows(&self) -> Vec<DirtyRow>;

    /// Clear every dirty mark
    fn clean(&mut self);
}

/// Derive the one-byte color class of a terminal cell.
///
/// With no explicit foreground the bot cannot tell "unset" from literal
/// black, so blanks are plain black and everything else bright black.
/// Foreground codes outside the 16 colors degrade to [`INVALID_COLOR`].
pub fn cell_color(cell: &TermCell) -> u8 {
    let mut color = match cell.fg {
        None if cell.ch == b' ' => CLR_BLACK,
        None => CLR_BLACK | BRIGHT,
        Some(fg) if fg >= NUM_COLORS => return INVALID_COLOR,
        Some(fg) if cell.bold => fg | BRIGHT,
        Some(fg) => fg,
    };

    if cell.reverse {
        color += REVERSE_OFFSET;
    }
    color
}

/// A character and its derived color class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenCell {
    pub ch: u8,
    pub color: u8,
}

/// Grid position, row first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Index into the flattened row-major grid
    pub const fn index(&self) -> usize {
        self.row * SCREEN_WIDTH + self.col
    }

    /// Position from a flattened index
    pub const fn from_index(index: usize) -> Self {
        Self {
            row: index / SCREEN_WIDTH,
            col: index % SCREEN_WIDTH,
        }
    }

    /// Whether the position lies on the grid
    pub const fn in_bounds(&self) -> bool {
        self.row < SCREEN_HEIGHT && self.col < SCREEN_WIDTH
    }

    /// Apply a signed (row, col) offset, `None` if the result leaves the grid
    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row as isize)?;
        let col = self.col.checked_add_signed(d_col as isize)?;
        let pos = Self { row, col };
        pos.in_bounds().then_some(pos)
    }
}

/// The persistent screen model
#[derive(Clone, PartialEq, Eq)]
pub struct ScreenGrid {
    chars: [u8; SCREEN_CELLS],
    colors: [u8; SCREEN_CELLS],
    cursor_row: usize,
    cursor_col: usize,
}

impl ScreenGrid {
    /// A blank screen: spaces in plain black, cursor at the origin
    pub fn new() -> Self {
        Self {
            chars: [b' '; SCREEN_CELLS],
            colors: [CLR_BLACK; SCREEN_CELLS],
            cursor_row: 0,
            cursor_col: 0,
        }
    }

    /// Overwrite every dirty row with the engine's characters and colors.
    ///
    /// Rows or columns beyond the grid are ignored.
    pub fn apply_dirty_update(&mut self, rows: &[DirtyRow]) {
        for dirty in rows {
            if dirty.row >= SCREEN_HEIGHT {
                continue;
            }
            let base = dirty.row * SCREEN_WIDTH;
            for (col, cell) in dirty.cells.iter().take(SCREEN_WIDTH).enumerate() {
                self.chars[base + col] = cell.ch;
                self.colors[base + col] = cell_color(cell);
            }
        }
    }

    /// Record a new cursor position
    pub fn cursor_moved(&mut self, row: usize, col: usize) {
        self.cursor_row = row;
        self.cursor_col = col;
    }

    /// Pull the cursor and dirty rows out of an engine and clear its marks
    pub fn sync_from<T: TerminalEngine + ?Sized>(&mut self, engine: &mut T) {
        let (row, col) = engine.cursor();
        self.cursor_moved(row, col);
        let dirty = engine.dirty_rows();
        if !dirty.is_empty() {
            self.apply_dirty_update(&dirty);
        }
        engine.clean();
    }

    /// Cell at a position, `None` off the grid
    pub fn cell(&self, pos: GridPos) -> Option<ScreenCell> {
        pos.in_bounds().then(|| ScreenCell {
            ch: self.chars[pos.index()],
            color: self.colors[pos.index()],
        })
    }

    /// Characters, flattened row-major
    pub fn chars(&self) -> &[u8] {
        &self.chars
    }

    /// Color classes, flattened row-major
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    /// Cursor as (row, column)
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    /// Characters of a single row
    pub fn row_text(&self, row: usize) -> &[u8] {
        let row = row.min(SCREEN_HEIGHT - 1);
        &self.chars[row * SCREEN_WIDTH..(row + 1) * SCREEN_WIDTH]
    }

    /// Draw text directly at a position, clipped to the row
    #[cfg(test)]
    pub(crate) fn put_str(&mut self, pos: GridPos, text: &str, color: u8) {
        if !pos.in_bounds() {
            return;
        }
        for (i, b) in text.bytes().take(SCREEN_WIDTH - pos.col).enumerate() {
            self.chars[pos.index() + i] = b;
            self.colors[pos.index() + i] = color;
        }
    }
}

impl Default for ScreenGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScreenGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ScreenGrid cursor=({}, {})", self.cursor_row, self.cursor_col)?;
        for row in 0..SCREEN_HEIGHT {
            writeln!(f, "{}", String::from_utf8_lossy(self.row_text(row)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::*;
    use proptest::prelude::*;

    fn row_of(row: usize, text: &str) -> DirtyRow {
        DirtyRow {
            row,
            cells: text.bytes().map(TermCell::plain).collect(),
        }
    }

    #[test]
    fn test_default_color_space_is_black() {
        assert_eq!(cell_color(&TermCell::plain(b' ')), CLR_BLACK);
        assert_eq!(cell_color(&TermCell::plain(b'.')), CLR_BLACK | BRIGHT);
    }

    #[test]
    fn test_bold_sets_bright_bit() {
        assert_eq!(cell_color(&TermCell::colored(b'@', CLR_GRAY, true)), CLR_WHITE);
        assert_eq!(cell_color(&TermCell::colored(b'|', CLR_BROWN, false)), CLR_BROWN);
    }

    #[test]
    fn test_reverse_adds_offset() {
        let cell = TermCell {
            ch: b'@',
            fg: Some(CLR_BLUE),
            bold: true,
            reverse: true,
        };
        let color = cell_color(&cell);
        assert_eq!(color, CLR_BRIGHT_BLUE + REVERSE_OFFSET);
        assert!(is_reverse(color));
        assert!(is_bright(color));
    }

    #[test]
    fn test_out_of_range_foreground_is_sentinel() {
        let cell = TermCell {
            ch: b'x',
            fg: Some(200),
            bold: false,
            reverse: true,
        };
        assert_eq!(cell_color(&cell), INVALID_COLOR);
    }

    #[test]
    fn test_dirty_update_overwrites_rows() {
        let mut grid = ScreenGrid::new();
        grid.apply_dirty_update(&[row_of(3, "Hello")]);
        assert_eq!(&grid.row_text(3)[..5], b"Hello");
        assert_eq!(grid.cell(GridPos::new(3, 0)).unwrap().color, CLR_BLACK | BRIGHT);
        // untouched rows stay blank
        assert!(grid.row_text(2).iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_dirty_update_ignores_rows_off_grid() {
        let mut grid = ScreenGrid::new();
        let before = grid.clone();
        grid.apply_dirty_update(&[row_of(SCREEN_HEIGHT, "nope")]);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_offset_bounds() {
        let origin = GridPos::new(0, 0);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(1, 1), Some(GridPos::new(1, 1)));
        let corner = GridPos::new(SCREEN_HEIGHT - 1, SCREEN_WIDTH - 1);
        assert_eq!(corner.offset(0, 1), None);
    }

    struct ScriptedEngine {
        rows: Vec<DirtyRow>,
        cleaned: bool,
    }

    impl TerminalEngine for ScriptedEngine {
        fn write(&mut self, _bytes: &[u8]) {}
        fn cursor(&self) -> (usize, usize) {
            (5, 9)
        }
        fn dirty_rows(&self) -> Vec<DirtyRow> {
            if self.cleaned { Vec::new() } else { self.rows.clone() }
        }
        fn clean(&mut self) {
            self.cleaned = true;
        }
    }

    #[test]
    fn test_sync_from_engine() {
        let mut engine = ScriptedEngine {
            rows: vec![row_of(0, "--More--")],
            cleaned: false,
        };
        let mut grid = ScreenGrid::new();
        grid.sync_from(&mut engine);
        assert_eq!(grid.cursor(), (5, 9));
        assert_eq!(&grid.row_text(0)[..8], b"--More--");
        assert!(engine.cleaned);
    }

    fn arb_cell() -> impl Strategy<Value = TermCell> {
        (any::<u8>(), proptest::option::of(0u8..20), any::<bool>(), any::<bool>()).prop_map(
            |(ch, fg, bold, reverse)| TermCell {
                ch,
                fg,
                bold,
                reverse,
            },
        )
    }

    fn arb_rows() -> impl Strategy<Value = Vec<DirtyRow>> {
        proptest::collection::vec(
            (0usize..SCREEN_HEIGHT, proptest::collection::vec(arb_cell(), 0..=SCREEN_WIDTH))
                .prop_map(|(row, cells)| DirtyRow { row, cells }),
            0..6,
        )
    }

    proptest! {
        #[test]
        fn prop_dirty_update_is_idempotent(rows in arb_rows()) {
            let mut grid = ScreenGrid::new();
            grid.apply_dirty_update(&rows);
            let once = grid.clone();
            grid.apply_dirty_update(&rows);
            prop_assert_eq!(grid, once);
        }

        #[test]
        fn prop_color_fits_encoding(cell in arb_cell()) {
            prop_assert!(cell_color(&cell) < 2 * NUM_COLORS);
        }
    }
}
