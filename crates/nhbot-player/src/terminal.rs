//! [`TerminalEngine`] backed by the `vt100` crate
//!
//! `vt100` keeps no per-row dirty state of its own, so every write is
//! followed by a comparison of the parser's screen against the rows last
//! published, and rows that differ are marked.

use nhbot_core::{SCREEN_HEIGHT, SCREEN_WIDTH, DirtyRow, TermCell, TerminalEngine};

pub struct Vt100Terminal {
    parser: vt100::Parser,
    published: Vec<Vec<TermCell>>,
    dirty: Vec<bool>,
}

impl Vt100Terminal {
    pub fn new() -> Self {
        Self::with_size(SCREEN_HEIGHT, SCREEN_WIDTH)
    }

    pub fn with_size(rows: usize, cols: usize) -> Self {
        Self {
            parser: vt100::Parser::new(rows as u16, cols as u16, 0),
            published: vec![vec![TermCell::default(); cols]; rows],
            // the first sync publishes everything
            dirty: vec![true; rows],
        }
    }

    fn read_row(&self, row: usize) -> Vec<TermCell> {
        let screen = self.parser.screen();
        let cols = self.published.get(row).map_or(0, Vec::len);
        (0..cols)
            .map(|col| {
                screen
                    .cell(row as u16, col as u16)
                    .map_or_else(TermCell::default, convert_cell)
            })
            .collect()
    }
}

impl Default for Vt100Terminal {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_cell(cell: &vt100::Cell) -> TermCell {
    let ch = cell
        .contents()
        .chars()
        .next()
        .map_or(b' ', |c| (u32::from(c) & 0xff) as u8);
    let fg = match cell.fgcolor() {
        vt100::Color::Default => None,
        vt100::Color::Idx(i) => Some(i),
        // outside the 16-color palette
        vt100::Color::Rgb(..) => Some(u8::MAX),
    };
    TermCell {
        ch,
        fg,
        bold: cell.bold(),
        reverse: cell.inverse(),
    }
}

impl TerminalEngine for Vt100Terminal {
    fn write(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
        for row in 0..self.published.len() {
            let current = self.read_row(row);
            if current != self.published[row] {
                self.published[row] = current;
                self.dirty[row] = true;
            }
        }
    }

    fn cursor(&self) -> (usize, usize) {
        let (row, col) = self.parser.screen().cursor_position();
        (usize::from(row), usize::from(col))
    }

    fn dirty_rows(&self) -> Vec<DirtyRow> {
        self.dirty
            .iter()
            .enumerate()
            .filter(|(_, dirty)| **dirty)
            .map(|(row, _)| DirtyRow {
                row,
                cells: self.published[row].clone(),
            })
            .collect()
    }

    fn clean(&mut self) {
        self.dirty.fill(false);
    }
}
