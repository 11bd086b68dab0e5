//! NetHack bot player
//!
//! Runs a terminal NetHack on a pseudoterminal and plays it with the
//! decision logic from `nhbot-core`:
//!
//! - `config`: TOML configuration with defaults for every field
//! - `host`: the game process on a pty, plus signal forwarding
//! - `terminal`: the vt100-backed terminal engine
//! - `orchestrator`: the read/interpret/act cycle

pub mod config;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod terminal;

pub use config::{BotConfig, GameConfig, SessionConfig};
pub use error::SessionError;
pub use host::{GameHost, PtyHost};
pub use orchestrator::{CycleOutcome, Orchestrator, SessionSummary};
pub use terminal::Vt100Terminal;
