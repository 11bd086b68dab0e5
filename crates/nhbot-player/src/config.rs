//! Bot configuration
//!
//! Loaded from an optional TOML file; every field has a default so a
//! partial file (or none at all) is valid.
//!
//! ```toml
//! [game]
//! path = "/usr/games/nethack"
//! options = "time:true,role:Valkyrie"
//!
//! [session]
//! seed = 42
//! max_cycles = 5000
//!
//! [navigation]
//! action_set = "compass"
//! training_iterations = 20000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nhbot_core::{QLearningConfig, SCREEN_CELLS};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub game: GameConfig,
    pub session: SessionConfig,
    pub navigation: QLearningConfig,
}

/// How to launch the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Value of `TERM` in the game's environment
    pub term: String,
    /// Value of `NETHACKOPTIONS` in the game's environment
    pub options: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/usr/bin/nethack"),
            args: Vec::new(),
            term: "ansi".to_string(),
            options: "time:true,splash_screen:no,role:Knight,race:human,gender:male,align:lawful"
                .to_string(),
        }
    }
}

/// Orchestration loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long one cycle waits for game output
    pub poll_timeout_ms: u64,
    /// Bytes read from the game per cycle
    pub read_buffer: usize,
    /// Pause between reading the screen and acting on it
    pub settle_delay_ms: u64,
    /// Sent once right after the game starts
    pub startup_keys: String,
    /// Stop after this many cycles even if the game is still running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Publish the character grid on stdout every cycle
    pub observer: bool,
    /// Append one JSON line per cycle to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_log: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 100,
            read_buffer: SCREEN_CELLS * 2,
            settle_delay_ms: 10,
            startup_keys: "  ".to_string(),
            max_cycles: None,
            seed: None,
            observer: true,
            state_log: None,
        }
    }
}

impl SessionConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl BotConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path).map_err(|source| SessionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| SessionError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, SessionError> {
        toml::to_string_pretty(self).map_err(SessionError::ConfigSerialize)
    }
}
