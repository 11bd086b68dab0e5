//! Game-state interpreter
//!
//! Reads a [`ScreenGrid`] and produces a [`GameStateSnapshot`]: prompt and
//! status flags found by plain substring search over the flattened grid,
//! the bottom-line stats, and the player's position.
//!
//! Nothing here fails. A marker that is not on screen reads as `false`, a
//! stat label that is not on screen reads as `0`.

use serde::Serialize;
use strum::{Display, EnumIter};

use crate::action::BotAction;
use crate::color::is_bright;
use crate::consts::{STATUS_LINE_ATTRIBUTES, STATUS_LINE_DUNGEON};
use crate::screen::{GridPos, ScreenGrid};

pub const MORE_MARKER: &str = "--More--";
pub const YES_NO_MARKER: &str = "[yn";
pub const HUNGRY_MARKER: &str = "Hungry";
pub const BURDENED_MARKER: &str = "Burdened";
pub const STRESSED_MARKER: &str = "Stressed";
pub const SELECTION_MARKER: &str = "What do you want";

/// Prompts that want a name typed in (naming an object, shopkeeper and
/// quest-leader greetings)
pub const NAMING_MARKERS: [&str; 3] = ["Call a", "Hello stranger", "You are required"];

/// The player glyph
pub const PLAYER_GLYPH: u8 = b'@';

/// Offset of the first occurrence of `needle` in `haystack`
pub fn find_text(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Whether `needle` occurs anywhere in `haystack`
pub fn text_exists(haystack: &[u8], needle: &str) -> bool {
    find_text(haystack, needle.as_bytes()).is_some()
}

/// Bottom-line statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
pub enum Stat {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
    DungeonLevel,
    Gold,
    HitPoints,
    Power,
    ArmorClass,
    Experience,
    Turn,
}

/// Where a stat label is printed on the bottom lines.
///
/// `line` and `column_hint` record where the label usually sits. The
/// extraction does not use them: the label is searched over the whole grid
/// and the first occurrence wins, so two identical labels on different rows
/// cannot be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatLabel {
    pub stat: Stat,
    pub label: &'static str,
    pub line: usize,
    pub column_hint: usize,
}

const fn label(stat: Stat, label: &'static str, line: usize, column_hint: usize) -> StatLabel {
    StatLabel {
        stat,
        label,
        line,
        column_hint,
    }
}

/// The 13 labels of the NetHack 3.6 two-line status display
pub const STAT_LABELS: [StatLabel; 13] = [
    label(Stat::Strength, "St:", STATUS_LINE_ATTRIBUTES, 1),
    label(Stat::Dexterity, "Dx:", STATUS_LINE_ATTRIBUTES, 7),
    label(Stat::Constitution, "Co:", STATUS_LINE_ATTRIBUTES, 12),
    label(Stat::Intelligence, "In:", STATUS_LINE_ATTRIBUTES, 18),
    label(Stat::Wisdom, "Wi:", STATUS_LINE_ATTRIBUTES, 23),
    label(Stat::Charisma, "Ch:", STATUS_LINE_ATTRIBUTES, 29),
    label(Stat::DungeonLevel, "Dlvl:", STATUS_LINE_DUNGEON, 0),
    label(Stat::Gold, "$:", STATUS_LINE_DUNGEON, 6),
    label(Stat::HitPoints, "HP:", STATUS_LINE_DUNGEON, 11),
    label(Stat::Power, "Pw:", STATUS_LINE_DUNGEON, 18),
    label(Stat::ArmorClass, "AC:", STATUS_LINE_DUNGEON, 27),
    label(Stat::Experience, "Xp:", STATUS_LINE_DUNGEON, 32),
    label(Stat::Turn, "T:", STATUS_LINE_DUNGEON, 38),
];

/// Parse the decimal digits directly following a stat label.
///
/// A missing label and a label with no digits after it both give 0.
pub fn bottom_line_int(haystack: &[u8], stat: &StatLabel) -> u32 {
    let Some(at) = find_text(haystack, stat.label.as_bytes()) else {
        return 0;
    };
    haystack[at + stat.label.len()..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u32, |acc, b| {
            acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BottomLineStats {
    pub strength: u32,
    pub dexterity: u32,
    pub constitution: u32,
    pub intelligence: u32,
    pub wisdom: u32,
    pub charisma: u32,
    pub dungeon_level: u32,
    pub gold: u32,
    pub hit_points: u32,
    pub power: u32,
    pub armor_class: u32,
    pub experience: u32,
    pub turn: u32,
}

impl BottomLineStats {
    pub fn get(&self, stat: Stat) -> u32 {
        *self.field(stat)
    }

    pub fn set(&mut self, stat: Stat, value: u32) {
        *self.field_mut(stat) = value;
    }

    fn field(&self, stat: Stat) -> &u32 {
        match stat {
            Stat::Strength => &self.strength,
            Stat::Dexterity => &self.dexterity,
            Stat::Constitution => &self.constitution,
            Stat::Intelligence => &self.intelligence,
            Stat::Wisdom => &self.wisdom,
            Stat::Charisma => &self.charisma,
            Stat::DungeonLevel => &self.dungeon_level,
            Stat::Gold => &self.gold,
            Stat::HitPoints => &self.hit_points,
            Stat::Power => &self.power,
            Stat::ArmorClass => &self.armor_class,
            Stat::Experience => &self.experience,
            Stat::Turn => &self.turn,
        }
    }

    fn field_mut(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Strength => &mut self.strength,
            Stat::Dexterity => &mut self.dexterity,
            Stat::Constitution => &mut self.constitution,
            Stat::Intelligence => &mut self.intelligence,
            Stat::Wisdom => &mut self.wisdom,
            Stat::Charisma => &mut self.charisma,
            Stat::DungeonLevel => &mut self.dungeon_level,
            Stat::Gold => &mut self.gold,
            Stat::HitPoints => &mut self.hit_points,
            Stat::Power => &mut self.power,
            Stat::ArmorClass => &mut self.armor_class,
            Stat::Experience => &mut self.experience,
            Stat::Turn => &mut self.turn,
        }
    }

    /// Read every label from a flattened screen
    pub fn extract(haystack: &[u8]) -> Self {
        let mut stats = Self::default();
        for label in &STAT_LABELS {
            stats.set(label.stat, bottom_line_int(haystack, label));
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PromptFlags {
    /// `--More--` is waiting to be dismissed
    pub more: bool,
    /// A `[yn` question is pending
    pub yes_no: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusFlags {
    pub hungry: bool,
    /// Burdened or Stressed
    pub encumbered: bool,
}

/// Raw input owed to a prompt, written directly instead of going through
/// navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PromptResponse {
    /// Type a random name and press enter
    TypeName { marker: &'static str },
    /// Answer an item-selection prompt with nothing
    CancelSelection,
}

/// Everything the bot reads off one screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStateSnapshot {
    pub prompts: PromptFlags,
    pub status: StatusFlags,
    pub stats: BottomLineStats,
    /// `None` when no bright `@` is on screen
    pub player: Option<GridPos>,
    pub responses: Vec<PromptResponse>,
}

impl GameStateSnapshot {
    /// The single reactive action owed this cycle, in priority order:
    /// dismiss `--More--`, refuse a `[yn` question, eat, drop.
    pub fn reactive_action(&self) -> Option<BotAction> {
        if self.prompts.more {
            Some(BotAction::Space)
        } else if self.prompts.yes_no {
            Some(BotAction::No)
        } else if self.status.hungry {
            Some(BotAction::Eat)
        } else if self.status.encumbered {
            Some(BotAction::Drop)
        } else {
            None
        }
    }
}

/// First bright `@` in row-major order
pub fn find_player(grid: &ScreenGrid) -> Option<GridPos> {
    grid.chars()
        .iter()
        .zip(grid.colors())
        .position(|(&ch, &color)| ch == PLAYER_GLYPH && is_bright(color))
        .map(GridPos::from_index)
}

/// Interpret a screen
pub fn interpret(grid: &ScreenGrid) -> GameStateSnapshot {
    let text = grid.chars();

    let prompts = PromptFlags {
        more: text_exists(text, MORE_MARKER),
        yes_no: text_exists(text, YES_NO_MARKER),
    };
    let status = StatusFlags {
        hungry: text_exists(text, HUNGRY_MARKER),
        encumbered: text_exists(text, BURDENED_MARKER) || text_exists(text, STRESSED_MARKER),
    };

    let mut responses: Vec<PromptResponse> = NAMING_MARKERS
        .iter()
        .filter(|marker| text_exists(text, marker))
        .map(|&marker| PromptResponse::TypeName { marker })
        .collect();
    if text_exists(text, SELECTION_MARKER) {
        responses.push(PromptResponse::CancelSelection);
    }

    GameStateSnapshot {
        prompts,
        status,
        stats: BottomLineStats::extract(text),
        player: find_player(grid),
        responses,
    }
}
