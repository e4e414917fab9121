//! The game center
//!
//! Ties accounts, the session log and the leaderboard together and launches
//! games by identifier. Results flow back through [`GameCenter::finish_game`]:
//! the player's stats are updated, the leaderboard is rebuilt and the run is
//! appended to the session log.

pub mod accounts;
pub mod history;
pub mod leaderboard;

use std::time::Duration;

use chrono::{Local, NaiveDateTime};

pub use accounts::{Account, AccountStore, GameStats};
pub use history::{LogEntry, SessionLog};
pub use leaderboard::{Leaderboard, Standing};

use crate::error::{CenterError, Result};
use crate::games::autopilot::{HeadlessRun, run_headless};
use crate::games::{BallsState, FallingState, GameKind, SnakeState};
use crate::settings::Settings;

pub struct GameCenter {
    settings: Settings,
    accounts: AccountStore,
    history: SessionLog,
    leaderboard: Leaderboard,
    current_user: Option<String>,
}

impl GameCenter {
    /// Open the center over `settings.data_dir`, creating it if needed
    pub fn open(settings: Settings) -> Result<Self> {
        let accounts = AccountStore::open(settings.accounts_dir())?;
        let history = SessionLog::load(settings.logs_file(), settings.history_capacity);
        let mut center = Self {
            settings,
            accounts,
            history,
            leaderboard: Leaderboard::new(),
            current_user: None,
        };
        center.refresh_leaderboard()?;
        log::info!(
            "Game center opened at {} ({} log entries)",
            center.settings.data_dir.display(),
            center.history.len()
        );
        Ok(center)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Create an account and log into it
    pub fn register(&mut self, username: &str) -> Result<()> {
        let account = self.accounts.create(username)?;
        self.current_user = Some(account.username);
        self.refresh_leaderboard()
    }

    pub fn login(&mut self, username: &str) -> Result<()> {
        let account = self.accounts.load(username)?;
        log::info!("'{}' logged in", account.username);
        self.current_user = Some(account.username);
        Ok(())
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.current_user.take() {
            log::info!("'{}' logged out", user);
        }
    }

    /// The logged-in player's account
    pub fn account(&self) -> Result<Account> {
        let user = self.current_user.as_deref().ok_or(CenterError::NotLoggedIn)?;
        self.accounts.load(user)
    }

    /// Resolve a game identifier for the logged-in player
    pub fn launch(&self, game_id: &str) -> Result<GameKind> {
        let user = self.current_user.as_deref().ok_or(CenterError::NotLoggedIn)?;
        let kind: GameKind = game_id.parse()?;
        log::info!("'{}' launched {}", user, kind.display_name());
        Ok(kind)
    }

    /// Record a finished session; a run that never started (`None`) records nothing
    pub fn finish_game(&mut self, kind: GameKind, score: Option<u64>) -> Result<Option<GameStats>> {
        self.finish_game_at(kind, score, Local::now().naive_local())
    }

    pub fn finish_game_at(
        &mut self,
        kind: GameKind,
        score: Option<u64>,
        at: NaiveDateTime,
    ) -> Result<Option<GameStats>> {
        let Some(score) = score else {
            log::info!("{} closed before it started, nothing recorded", kind.display_name());
            return Ok(None);
        };
        let user = self
            .current_user
            .clone()
            .ok_or(CenterError::NotLoggedIn)?;

        let stats = self.accounts.record_score(&user, kind, score)?;
        self.refresh_leaderboard()?;
        self.history.append(LogEntry::new(at, &user, kind, score))?;
        Ok(Some(stats))
    }

    /// Launch `game_id`, let the autopilot play it for up to `limit`, and record the result
    pub fn play_headless(&mut self, game_id: &str, seed: u64, limit: Duration) -> Result<HeadlessRun> {
        let kind = self.launch(game_id)?;
        let run = match kind {
            GameKind::Snake => run_headless(SnakeState::new(seed), &self.settings, limit),
            GameKind::Balls => run_headless(BallsState::new(seed), &self.settings, limit),
            GameKind::Letters => run_headless(FallingState::letters(seed), &self.settings, limit),
            GameKind::Digits => run_headless(FallingState::digits(seed), &self.settings, limit),
        };
        self.finish_game(kind, run.score)?;
        Ok(run)
    }

    /// Rebuild the leaderboard from every account on disk
    pub fn refresh_leaderboard(&mut self) -> Result<()> {
        let accounts = self.accounts.load_all()?;
        self.leaderboard = Leaderboard::from_accounts(&accounts, self.settings.leaderboard_size);
        Ok(())
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Session log, newest first
    pub fn history(&self) -> Vec<&LogEntry> {
        self.history.newest_first()
    }
}
