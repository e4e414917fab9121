//! Player accounts
//!
//! One JSON file per player under the accounts directory. Every score update
//! is a full read-modify-write of that file.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CenterError, Result};
use crate::games::GameKind;

/// Longest accepted username
pub const MAX_USERNAME_LEN: usize = 32;

/// Per-game results for one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub high_score: u64,
    pub last_score: u64,
}

impl GameStats {
    /// Record a finished run; returns true on a new high score
    pub fn record(&mut self, score: u64) -> bool {
        self.last_score = score;
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }
}

/// A player account as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(default)]
    pub games: BTreeMap<GameKind, GameStats>,
}

impl Account {
    /// Fresh account with zeroed stats for every game
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            games: GameKind::ALL
                .into_iter()
                .map(|kind| (kind, GameStats::default()))
                .collect(),
        }
    }

    pub fn stats(&self, kind: GameKind) -> GameStats {
        self.games.get(&kind).copied().unwrap_or_default()
    }

    pub fn high_score(&self, kind: GameKind) -> u64 {
        self.stats(kind).high_score
    }
}

/// Check a username is usable as a file name and return it trimmed
pub fn validate_username(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    let valid = !trimmed.is_empty()
        && trimmed.chars().count() <= MAX_USERNAME_LEN
        && trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(trimmed)
    } else {
        Err(CenterError::InvalidUsername(name.to_string()))
    }
}

/// Directory of account files
#[derive(Debug, Clone)]
pub struct AccountStore {
    dir: PathBuf,
}

impl AccountStore {
    /// Open the store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CenterError::io(&dir, e))?;
        Ok(Self { dir })
    }

    fn path(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{username}.json"))
    }

    pub fn exists(&self, username: &str) -> bool {
        validate_username(username).is_ok_and(|name| self.path(name).is_file())
    }

    /// Register a new player
    pub fn create(&self, username: &str) -> Result<Account> {
        let name = validate_username(username)?;
        if self.exists(name) {
            return Err(CenterError::UsernameTaken(name.to_string()));
        }
        let account = Account::new(name);
        self.save(&account)?;
        log::info!("Account '{}' created", name);
        Ok(account)
    }

    pub fn load(&self, username: &str) -> Result<Account> {
        let name = validate_username(username)?;
        let path = self.path(name);
        if !path.is_file() {
            return Err(CenterError::UnknownUser(name.to_string()));
        }
        let json = fs::read_to_string(&path).map_err(|e| CenterError::io(&path, e))?;
        serde_json::from_str(&json).map_err(|e| CenterError::json(&path, e))
    }

    pub fn save(&self, account: &Account) -> Result<()> {
        let path = self.path(&account.username);
        let json =
            serde_json::to_string_pretty(account).map_err(|e| CenterError::json(&path, e))?;
        fs::write(&path, json).map_err(|e| CenterError::io(&path, e))
    }

    /// Record a finished run for `username`
    pub fn record_score(&self, username: &str, kind: GameKind, score: u64) -> Result<GameStats> {
        let mut account = self.load(username)?;
        let stats = account.games.entry(kind).or_default();
        if stats.record(score) {
            log::info!("New {} high score for '{}': {}", kind, username, score);
        }
        let stats = *stats;
        self.save(&account)?;
        Ok(stats)
    }

    /// Every readable account, sorted by name; unreadable files are skipped
    pub fn load_all(&self) -> Result<Vec<Account>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CenterError::io(&self.dir, e))?;

        let mut accounts = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", self.dir.display(), e);
                    continue;
                }
            };
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| CenterError::io(&path, e))
                .and_then(|json| {
                    serde_json::from_str::<Account>(&json).map_err(|e| CenterError::json(&path, e))
                });
            match parsed {
                Ok(account) => accounts.push(account),
                Err(e) => log::warn!("Skipping account: {}", e),
            }
        }

        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }
}
