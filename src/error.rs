//! Error types for the profile store and activation engine.
//!
//! The command layer wraps these in `anyhow` for context, but the core keeps
//! them typed so callers can react to a missing profile or a half-finished
//! switch differently from a plain I/O failure.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("profile file {} is corrupt: {reason}", path.display())]
    CorruptProfile { path: PathBuf, reason: String },

    #[error("profile '{0}' not found (use `gitprof list` to see available profiles)")]
    ProfileNotFound(String),

    #[error(
        "partially switched: wrote {} but failed to write {}",
        written.display(),
        failed.display()
    )]
    PartialActivation {
        written: PathBuf,
        failed: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote activation on {destination} failed: {reason}")]
    RemoteTransportFailure { destination: String, reason: String },

    #[error(
        "invalid nickname '{0}': use 1-64 letters, digits, '-', '_' or '.', not starting with '.'"
    )]
    InvalidNickname(String),

    #[error("invalid remote destination: {0}")]
    InvalidRemote(String),

    #[error("git config {key} failed: {reason}")]
    GitConfig { key: String, reason: String },

    #[error("cannot access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// A short follow-up suggestion for the operator, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ProfileNotFound(_) => Some("run: gitprof list"),
            Self::PartialActivation { .. } => {
                Some("fix the failing path and run the same switch again")
            }
            Self::CorruptProfile { .. } => {
                Some("repair or remove the file, then run: gitprof add")
            }
            Self::RemoteTransportFailure { .. } => {
                Some("check that `ssh user@host` works from this machine")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
