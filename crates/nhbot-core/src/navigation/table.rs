//! Action-value table over the whole screen

use crate::action::{Direction, MAX_DIRECTIONS};
use crate::consts::SCREEN_CELLS;
use crate::screen::GridPos;

/// Action-values of one cell plus their cached maximum
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateActions {
    pub values: [f64; MAX_DIRECTIONS],
    pub max: f64,
}

impl StateActions {
    /// Recompute the cached maximum over the first `actions` values.
    ///
    /// The maximum starts from zero, so a cell whose values are all
    /// negative caches 0.0.
    pub fn recompute_max(&mut self, actions: usize) {
        self.max = self.values[..actions].iter().fold(0.0, |max, &q| if q > max { q } else { max });
    }
}

/// One [`StateActions`] per grid cell, kept for the whole run
#[derive(Debug, Clone, PartialEq)]
pub struct ActionValueTable {
    cells: Vec<StateActions>,
}

impl ActionValueTable {
    pub fn new() -> Self {
        Self {
            cells: vec![StateActions::default(); SCREEN_CELLS],
        }
    }

    /// Entry of a cell; `pos` must be on the grid
    pub fn get(&self, pos: GridPos) -> &StateActions {
        &self.cells[pos.index()]
    }

    pub fn get_mut(&mut self, pos: GridPos) -> &mut StateActions {
        &mut self.cells[pos.index()]
    }

    pub fn value(&self, pos: GridPos, dir: Direction) -> f64 {
        self.get(pos).values[dir.index()]
    }

    pub fn max(&self, pos: GridPos) -> f64 {
        self.get(pos).max
    }

    /// Cells with at least one non-zero action-value.
    ///
    /// Moves onto plain floor next to nothing valuable leave values at 0.0,
    /// so cells the agent walked through are not necessarily counted.
    pub fn valued_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.values.iter().any(|&q| q != 0.0))
            .count()
    }
}

impl Default for ActionValueTable {
    fn default() -> Self {
        Self::new()
    }
}
