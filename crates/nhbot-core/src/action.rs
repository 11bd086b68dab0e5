//! Bot actions and the keystrokes that carry them
//!
//! Every [`BotAction`] maps to one key. Eating and dropping are multi-key
//! commands: [`dispatch`] wraps the action key with the keys that open and
//! answer the inventory prompt.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::interpret::PromptResponse;
use crate::rng::BotRng;

/// Compass directions, in the order action-values are stored
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
    NorthEast = 4,
    SouthEast = 5,
    SouthWest = 6,
    NorthWest = 7,
}

impl Direction {
    /// Get the delta (d_row, d_col) for this direction
    pub const fn delta(&self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
            Direction::NorthEast => (-1, 1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (1, -1),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// Vi-key for moving in this direction
    pub const fn key(&self) -> u8 {
        match self {
            Direction::North => b'k',
            Direction::East => b'l',
            Direction::South => b'j',
            Direction::West => b'h',
            Direction::NorthEast => b'u',
            Direction::SouthEast => b'n',
            Direction::SouthWest => b'b',
            Direction::NorthWest => b'y',
        }
    }

    /// Slot of this direction in an action-value row
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

/// Which directions the navigation engine may choose from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionSet {
    /// North, east, south, west
    #[default]
    Cardinal,
    /// The cardinal directions followed by the four diagonals
    Compass,
}

const CARDINAL: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

const COMPASS: [Direction; 8] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
    Direction::NorthEast,
    Direction::SouthEast,
    Direction::SouthWest,
    Direction::NorthWest,
];

impl ActionSet {
    /// Directions in enumeration order
    pub const fn directions(&self) -> &'static [Direction] {
        match self {
            ActionSet::Cardinal => &CARDINAL,
            ActionSet::Compass => &COMPASS,
        }
    }

    pub const fn len(&self) -> usize {
        self.directions().len()
    }
}

/// Maximum number of directions in any action set
pub const MAX_DIRECTIONS: usize = COMPASS.len();

/// An action the bot can send to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum BotAction {
    Move(Direction),
    /// Drop everything (`D`, then `A` for all types)
    Drop,
    /// Eat something from the inventory
    Eat,
    Space,
    Yes,
    No,
    Dollar,
    Quit,
    NoOp,
}

impl BotAction {
    /// The action's own key, `None` for [`BotAction::NoOp`]
    pub const fn key(&self) -> Option<u8> {
        match self {
            BotAction::Move(dir) => Some(dir.key()),
            BotAction::Drop => Some(b'D'),
            BotAction::Eat => Some(b'e'),
            BotAction::Space => Some(b' '),
            BotAction::Yes => Some(b'y'),
            BotAction::No => Some(b'n'),
            BotAction::Dollar => Some(b'$'),
            BotAction::Quit => Some(b'q'),
            BotAction::NoOp => None,
        }
    }
}

/// Key sent before `e` so the eat prompt offers the inventory
pub const EAT_PREFIX: u8 = b'm';

/// Inventory letters tried when eating; `None` is a disabled slot that
/// leaves the prompt open
pub const EAT_SLOTS: [Option<u8>; 5] = [Some(b'f'), Some(b'g'), Some(b'h'), None, Some(b'j')];

/// Answer to the drop menu: all item types, confirmed
pub const DROP_ALL: &[u8] = b"A\n";

/// Characters used for typed names
pub const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz1234567890";

/// Length of typed names
pub const NAME_LEN: usize = 10;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to send {action} to the game")]
    Action {
        action: BotAction,
        #[source]
        source: io::Error,
    },

    #[error("failed to answer a {response:?} prompt")]
    Prompt {
        response: PromptResponse,
        #[source]
        source: io::Error,
    },
}

/// Full key sequence for an action: prologue, the action key, epilogue.
///
/// Empty for [`BotAction::NoOp`].
pub fn keystrokes(action: BotAction, rng: &mut BotRng) -> Vec<u8> {
    let Some(key) = action.key() else {
        return Vec::new();
    };

    let mut keys = Vec::with_capacity(3);
    if action == BotAction::Eat {
        keys.push(EAT_PREFIX);
    }
    keys.push(key);
    match action {
        BotAction::Eat => {
            if let Some(Some(slot)) = rng.choose(&EAT_SLOTS) {
                keys.push(*slot);
            }
        }
        BotAction::Drop => keys.extend_from_slice(DROP_ALL),
        _ => {}
    }
    keys
}

/// Send an action to the game
pub fn dispatch<W: Write + ?Sized>(
    out: &mut W,
    action: BotAction,
    rng: &mut BotRng,
) -> Result<(), DispatchError> {
    let keys = keystrokes(action, rng);
    if keys.is_empty() {
        return Ok(());
    }
    out.write_all(&keys)
        .and_then(|()| out.flush())
        .map_err(|source| DispatchError::Action { action, source })
}

/// A random name from [`NAME_ALPHABET`]
pub fn random_name(rng: &mut BotRng) -> Vec<u8> {
    (0..NAME_LEN)
        .filter_map(|_| rng.choose(NAME_ALPHABET).copied())
        .collect()
}

/// Raw keys answering a prompt
pub fn prompt_keystrokes(response: PromptResponse, rng: &mut BotRng) -> Vec<u8> {
    match response {
        PromptResponse::TypeName { .. } => {
            let mut keys = random_name(rng);
            keys.push(b'\n');
            keys
        }
        PromptResponse::CancelSelection => b" \n".to_vec(),
    }
}

/// Answer a prompt directly
pub fn respond<W: Write + ?Sized>(
    out: &mut W,
    response: PromptResponse,
    rng: &mut BotRng,
) -> Result<(), DispatchError> {
    let keys = prompt_keystrokes(response, rng);
    out.write_all(&keys)
        .and_then(|()| out.flush())
        .map_err(|source| DispatchError::Prompt { response, source })
}
