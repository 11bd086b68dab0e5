//! Navigation engine
//!
//! Tabular Q-learning over the whole screen. Each decision first runs a
//! fixed number of offline training steps: a virtual agent random-walks the
//! current [`RewardMap`] from the player's cell, updating the
//! [`ActionValueTable`]. The real move is then the best-valued direction at
//! the player's cell.
//!
//! The table belongs to the caller and is never cleared, so values learned
//! on earlier screens carry over.

pub mod reward;
pub mod table;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::action::{ActionSet, Direction};
use crate::rng::BotRng;
use crate::screen::GridPos;

pub use reward::{RewardMap, terrain_reward};
pub use table::{ActionValueTable, StateActions};

/// Action-selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// First direction whose value equals the cell's cached maximum
    Exploit,
    /// Uniform sampling, retried until the destination is not a wall
    Explore,
}

/// Learning constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Alpha
    pub learning_rate: f64,
    /// Gamma
    pub discount_rate: f64,
    /// Offline training steps run before each real decision
    pub training_iterations: u32,
    /// Samples the explore policy draws looking for a legal move
    pub explore_retries: u32,
    pub action_set: ActionSet,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.7,
            discount_rate: 0.4,
            training_iterations: 10_000,
            explore_retries: 100,
            action_set: ActionSet::Cardinal,
        }
    }
}

/// Q-learning navigation over an injected [`ActionValueTable`]
#[derive(Debug, Clone)]
pub struct NavigationEngine {
    config: QLearningConfig,
}

impl NavigationEngine {
    pub fn new(config: QLearningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    fn directions(&self) -> &'static [Direction] {
        self.config.action_set.directions()
    }

    /// Choose a direction at `pos` under a policy.
    ///
    /// Exploit returns `None` when no value equals the cached maximum,
    /// which happens when every value at the cell is negative.
    pub fn choose(
        &self,
        policy: Policy,
        table: &ActionValueTable,
        rewards: &RewardMap,
        pos: GridPos,
        rng: &mut BotRng,
    ) -> Option<Direction> {
        match policy {
            Policy::Exploit => self.exploit(table, pos),
            Policy::Explore => Some(self.explore(rewards, pos, rng)),
        }
    }

    fn exploit(&self, table: &ActionValueTable, pos: GridPos) -> Option<Direction> {
        if !pos.in_bounds() {
            return None;
        }
        let entry = table.get(pos);
        self.directions()
            .iter()
            .copied()
            .find(|dir| entry.values[dir.index()] == entry.max)
    }

    /// Sample directions until one leads somewhere legal. After
    /// `explore_retries` misses the last sample is used anyway.
    fn explore(&self, rewards: &RewardMap, pos: GridPos, rng: &mut BotRng) -> Direction {
        let dirs = self.directions();
        let mut choice = dirs[0];
        for _ in 0..self.config.explore_retries.max(1) {
            choice = dirs[rng.rn2(dirs.len() as u32) as usize];
            let (d_row, d_col) = choice.delta();
            if pos
                .offset(d_row, d_col)
                .is_some_and(|dest| rewards.is_legal(dest))
            {
                break;
            }
        }
        choice
    }

    /// Apply one Q-update for moving `dir` from `pos`.
    ///
    /// Returns the destination, or `None` without touching the table when
    /// the destination is off the grid.
    pub fn update(
        &self,
        table: &mut ActionValueTable,
        rewards: &RewardMap,
        pos: GridPos,
        dir: Direction,
    ) -> Option<GridPos> {
        let (d_row, d_col) = dir.delta();
        let dest = pos.offset(d_row, d_col)?;
        let reward = f64::from(rewards.reward(dest)?);
        let next_max = table.max(dest);

        let QLearningConfig {
            learning_rate,
            discount_rate,
            ..
        } = self.config;
        let entry = table.get_mut(pos);
        let q = &mut entry.values[dir.index()];
        *q += learning_rate * (reward + discount_rate * next_max - *q);
        entry.recompute_max(self.config.action_set.len());

        Some(dest)
    }

    /// Run the offline training pass from `start`; returns where the
    /// virtual agent ended up.
    pub fn train(
        &self,
        table: &mut ActionValueTable,
        rewards: &RewardMap,
        start: GridPos,
        rng: &mut BotRng,
    ) -> GridPos {
        let mut agent = start;
        for _ in 0..self.config.training_iterations {
            let dir = self.explore(rewards, agent, rng);
            if let Some(next) = self.update(table, rewards, agent, dir) {
                agent = next;
            }
        }
        agent
    }

    /// Train, then pick the real move at the player's cell
    pub fn decide(
        &self,
        table: &mut ActionValueTable,
        rewards: &RewardMap,
        player: GridPos,
        rng: &mut BotRng,
    ) -> Option<Direction> {
        if !player.in_bounds() {
            return None;
        }
        let end = self.train(table, rewards, player, rng);
        let choice = self.exploit(table, player);
        trace!(
            ?player,
            ?end,
            max = table.max(player),
            ?choice,
            "navigation decision"
        );
        choice
    }
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new(QLearningConfig::default())
    }
}
