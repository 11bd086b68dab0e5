//! nhbot-core: screen interpretation and decision logic for a NetHack bot
//!
//! This crate turns the decoded terminal screen of a running game into
//! structured state and chooses the keys to send back. It performs no
//! process or terminal I/O of its own; keystrokes go to any
//! [`std::io::Write`].
//!
//! - `screen`: persistent character/color grid fed by a terminal engine
//! - `interpret`: prompts, status flags, bottom-line stats, player position
//! - `navigation`: terrain rewards and tabular Q-learning
//! - `action`: the action catalogue and its keystroke sequences

pub mod action;
pub mod color;
pub mod interpret;
pub mod navigation;
pub mod screen;

mod consts;
mod rng;

pub use action::{ActionSet, BotAction, Direction, DispatchError, dispatch, respond};
pub use consts::*;
pub use interpret::{GameStateSnapshot, PromptResponse, interpret};
pub use navigation::{ActionValueTable, NavigationEngine, QLearningConfig, RewardMap};
pub use rng::BotRng;
pub use screen::{DirtyRow, GridPos, ScreenGrid, TermCell, TerminalEngine};
