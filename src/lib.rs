//! Arcade Center - a game center with four arcade mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation plumbing (geometry, placement, scheduling, render sync)
//! - `games`: Snake, Balls, Letters and Digits as pure tick functions over explicit state
//! - `center`: Accounts, session history and the rating leaderboard
//! - `settings`: Data directory and session tuning

pub mod center;
pub mod error;
pub mod games;
pub mod settings;
pub mod sim;

pub use center::GameCenter;
pub use error::{CenterError, Result};
pub use games::{Game, GameKind};
pub use settings::Settings;

/// Shared configuration constants
pub mod consts {
    /// Delay between a game reaching GameOver and its completion callback (ms)
    pub const GAME_OVER_DELAY_MS: u64 = 3000;
    /// Maximum ticks run for a single frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Default rejection-sampling attempts for spawns
    pub const PLACEMENT_ATTEMPTS: u32 = 200;
    /// Number of players shown on the leaderboard
    pub const LEADERBOARD_SIZE: usize = 10;
    /// Number of session log entries kept on disk
    pub const HISTORY_CAPACITY: usize = 100;
}
