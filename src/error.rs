//! Error types for the game center

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by account, history and game-launch operations
#[derive(Debug, Error)]
pub enum CenterError {
    #[error("unknown game '{0}'")]
    UnknownGame(String),

    #[error("invalid username '{0}'")]
    InvalidUsername(String),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("log in before starting a game")]
    NotLoggedIn,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CenterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CenterError>;
