//! Terrain rewards read straight off the screen

use crate::color::STRUCTURAL_COLOR;
use crate::screen::{GridPos, ScreenGrid};

pub const FLOOR_GLYPH: u8 = b'.';
pub const GOLD_GLYPH: u8 = b'$';
pub const DOOR_GLYPH: u8 = b'+';
pub const DOWNSTAIRS_GLYPH: u8 = b'>';

/// Wall glyphs. Drawn in the dim structural color they are open doorways.
#[inline]
pub const fn is_wall(ch: u8) -> bool {
    matches!(ch, b'-' | b'|')
}

/// Reward for stepping onto a cell
pub fn terrain_reward(ch: u8, color: u8) -> i8 {
    match ch {
        c if is_wall(c) => {
            if color == STRUCTURAL_COLOR {
                0
            } else {
                -1
            }
        }
        FLOOR_GLYPH => 0,
        GOLD_GLYPH | DOOR_GLYPH | DOWNSTAIRS_GLYPH => 1,
        _ => 0,
    }
}

/// Per-cell rewards of one screen, the environment the agent trains in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardMap {
    rewards: Vec<i8>,
}

impl RewardMap {
    /// Classify every cell of a screen
    pub fn from_grid(grid: &ScreenGrid) -> Self {
        let rewards = grid
            .chars()
            .iter()
            .zip(grid.colors())
            .map(|(&ch, &color)| terrain_reward(ch, color))
            .collect();
        Self { rewards }
    }

    /// A map with the same reward everywhere
    #[cfg(test)]
    pub(crate) fn uniform(reward: i8) -> Self {
        Self {
            rewards: vec![reward; crate::consts::SCREEN_CELLS],
        }
    }

    /// Reward at a position, `None` off the grid
    pub fn reward(&self, pos: GridPos) -> Option<i8> {
        pos.in_bounds().then(|| self.rewards[pos.index()])
    }

    /// Whether stepping onto `pos` is allowed (on the grid, not a wall)
    pub fn is_legal(&self, pos: GridPos) -> bool {
        self.reward(pos).is_some_and(|r| r >= 0)
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, pos: GridPos, reward: i8) {
        if pos.in_bounds() {
            self.rewards[pos.index()] = reward;
        }
    }
}
