//! Session log
//!
//! A bounded list of finished runs, persisted as one JSON array and rewritten
//! wholesale on every append.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{CenterError, Result};
use crate::games::GameKind;

/// Timestamp format used in the log file
pub const DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// One finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub date: String,
    pub player: String,
    /// Capitalized game name
    pub game: String,
    pub score: u64,
}

impl LogEntry {
    pub fn new(at: NaiveDateTime, player: &str, kind: GameKind, score: u64) -> Self {
        Self {
            date: at.format(DATE_FORMAT).to_string(),
            player: player.to_string(),
            game: kind.display_name().to_string(),
            score,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, DATE_FORMAT).ok()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}: {}",
            self.date, self.player, self.game, self.score
        )
    }
}

/// The on-disk session log
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
    capacity: usize,
    entries: Vec<LogEntry>,
}

impl SessionLog {
    /// Load the log; a missing or corrupt file yields an empty log
    pub fn load(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<Vec<LogEntry>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Ignoring corrupt session log {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(_) => {
                log::info!("No session log at {}, starting empty", path.display());
                Vec::new()
            }
        };

        let mut log = Self {
            path,
            capacity: capacity.max(1),
            entries,
        };
        log.trim();
        log
    }

    /// Entries in file order, oldest first
    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a run and rewrite the file
    pub fn append(&mut self, entry: LogEntry) -> Result<()> {
        log::debug!("Session log: {}", entry);
        self.entries.push(entry);
        self.trim();
        self.save()
    }

    fn trim(&mut self) {
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CenterError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CenterError::json(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| CenterError::io(&self.path, e))
    }

    /// Entries newest first; entries with an unreadable date follow in file order
    pub fn newest_first(&self) -> Vec<&LogEntry> {
        let mut dated: Vec<(NaiveDateTime, &LogEntry)> = Vec::new();
        let mut undated = Vec::new();
        for entry in &self.entries {
            match entry.parsed_date() {
                Some(at) => dated.push((at, entry)),
                None => undated.push(entry),
            }
        }
        // Stable, so equal timestamps keep file order
        dated.sort_by(|a, b| b.0.cmp(&a.0));
        dated.into_iter().map(|(_, e)| e).chain(undated).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_entry_format() {
        let entry = LogEntry::new(at(5, 9), "alice", GameKind::Balls, 7);
        assert_eq!(entry.date, "05.03.2024 09:00:00");
        assert_eq!(entry.game, "Balls");
        assert_eq!(entry.parsed_date(), Some(at(5, 9)));
        assert_eq!(entry.to_string(), "05.03.2024 09:00:00 (alice) Balls: 7");
    }

    #[test]
    fn test_missing_and_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SessionLog::load(dir.path().join("logs.json"), 100).is_empty());

        let path = dir.path().join("bad.json");
        fs::write(&path, "[{").unwrap();
        assert!(SessionLog::load(&path, 100).is_empty());
    }

    #[test]
    fn test_append_caps_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("logs.json");
        let mut log = SessionLog::load(&path, 3);
        for score in 0..5 {
            log.append(LogEntry::new(at(1, score as u32), "bob", GameKind::Snake, score))
                .unwrap();
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].score, 2);

        let reloaded = SessionLog::load(&path, 3);
        assert_eq!(reloaded.entries(), log.entries());
    }

    #[test]
    fn test_newest_first_with_bad_dates_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        let bad_a = LogEntry {
            date: "yesterday".into(),
            score: 1,
            ..LogEntry::default()
        };
        let bad_b = LogEntry {
            date: String::new(),
            score: 2,
            ..LogEntry::default()
        };
        let entries = vec![
            bad_a,
            LogEntry::new(at(2, 0), "a", GameKind::Digits, 3),
            bad_b,
            LogEntry::new(at(9, 0), "b", GameKind::Digits, 4),
        ];
        fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let log = SessionLog::load(&path, 100);
        let scores: Vec<u64> = log.newest_first().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![4, 3, 1, 2]);
    }

    #[test]
    fn test_partial_entries_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        fs::write(&path, r#"[{"date": "01.01.2024 00:00:00", "player": "x"}]"#).unwrap();
        let log = SessionLog::load(&path, 100);
        assert_eq!(log.entries()[0].score, 0);
        assert_eq!(log.entries()[0].game, "");
    }
}
