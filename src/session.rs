use std::error::Error;
use std::fmt;

/// Difficulty tier of a duel. Everything level-dependent is resolved once
/// through [`Level::settings`] instead of branching through the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Level {
    #[strum(serialize = "1")]
    One,
    #[strum(serialize = "2")]
    Two,
}

impl Level {
    pub fn from_number(n: u8) -> Result<Self, InvalidLevel> {
        match n {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            other => Err(InvalidLevel(other)),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Level::One => 1,
            Level::Two => 2,
        }
    }

    /// Pure lookup of the per-level constants.
    pub fn settings(self) -> LevelSettings {
        match self {
            Level::One => LevelSettings {
                per_round_seconds: 60,
                total_rounds: 1,
                show_round_counter: false,
            },
            Level::Two => LevelSettings {
                per_round_seconds: 10,
                total_rounds: 5,
                show_round_counter: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSettings {
    pub per_round_seconds: u32,
    pub total_rounds: u32,
    pub show_round_counter: bool,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub player_name: String,
    pub opponent_name: String,
    pub level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLevel(pub u8);

impl fmt::Display for InvalidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level must be 1 or 2, got {}", self.0)
    }
}

impl Error for InvalidLevel {}
