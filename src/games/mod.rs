//! The four mini-games
//!
//! Each game is an explicit state struct plus a pure `tick(&mut state, &input)`
//! function. The [`Game`] trait is the seam the scheduler and the game center
//! drive them through.

pub mod autopilot;
pub mod balls;
pub mod letters;
pub mod shop;
pub mod snake;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CenterError;
use crate::sim::{GamePhase, Sprite};

pub use autopilot::Autopilot;
pub use balls::{BallsInput, BallsState};
pub use letters::{Alphabet, FallingInput, FallingState};
pub use snake::{SnakeInput, SnakeState};

/// Identifier of a game in the center
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Snake,
    Balls,
    Letters,
    Digits,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::Snake,
        GameKind::Balls,
        GameKind::Letters,
        GameKind::Digits,
    ];

    /// Identifier used in files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            GameKind::Snake => "snake",
            GameKind::Balls => "balls",
            GameKind::Letters => "letters",
            GameKind::Digits => "digits",
        }
    }

    /// Capitalized name used in the session log
    pub fn display_name(&self) -> &'static str {
        match self {
            GameKind::Snake => "Snake",
            GameKind::Balls => "Balls",
            GameKind::Letters => "Letters",
            GameKind::Digits => "Digits",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameKind::Snake => "Eat food, grow, and steer clear of mines and your own tail",
            GameKind::Balls => "Lob gravity balls at targets and spend winnings in the shop",
            GameKind::Letters => "Type falling letters before they cross the line, skip the fakes",
            GameKind::Digits => "Type falling digits before they cross the line, skip the fakes",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GameKind {
    type Err = CenterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| CenterError::UnknownGame(s.to_string()))
    }
}

/// A simulated game the scheduler can drive
pub trait Game {
    /// One tick's worth of player input; `Default` means "nothing pressed"
    type Input: Default;
    /// Notable things that happened during a tick
    type Event: fmt::Debug;

    fn kind(&self) -> GameKind;

    /// Fixed interval between ticks
    fn tick_period(&self) -> Duration;

    /// Advance the game by one tick
    fn tick(&mut self, input: &Self::Input);

    fn phase(&self) -> GamePhase;

    /// Score reported to the game center
    fn score(&self) -> u64;

    /// Current drawable entities
    fn sprites(&self) -> Vec<Sprite>;

    /// Take the events recorded since the last drain
    fn drain_events(&mut self) -> Vec<Self::Event>;
}
