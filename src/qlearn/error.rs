//! Error taxonomy for training, play and persistence.
//!
//! Game-level errors (`IllegalAction`, `MalformedNotation`, `EmptyLegalMoveSet`)
//! are meant to be recovered locally by the caller. Persistence and configuration
//! errors are fatal for a run and carry enough context to print directly.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::qlearn::config::ConfigError;

/// Errors produced by the Q-learning core and its chess adapter.
#[derive(Debug, Error)]
pub enum QLearnError {
    /// The persisted Q-table is absent or unreadable.
    #[error("model file {} is missing or unreadable: {source}", path.display())]
    MissingModel {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A move was requested that is not legal in the current position.
    #[error("move {0} is not legal in the current position")]
    IllegalAction(String),

    /// No legal moves although the game is not reported over.
    #[error("no legal moves available in a position that is not game over")]
    EmptyLegalMoveSet,

    /// Text that cannot be parsed as a move.
    #[error("malformed move notation '{0}' (expected UCI, e.g. e2e4 or e7e8q)")]
    MalformedNotation(String),

    /// A FEN string the rules engine rejected.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// A snapshot file that is not a Q-table.
    #[error("{} is not a valid Q-table snapshot: {source}", path.display())]
    CorruptSnapshot {
        /// Snapshot path.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot written by an incompatible schema.
    #[error("snapshot version {found} is not supported (expected {expected})")]
    UnsupportedVersion {
        /// Version tag found in the snapshot.
        found: u32,
        /// Version this build reads and writes.
        expected: u32,
    },

    /// Failure while writing a snapshot.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A report or table that could not be rendered as JSON.
    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid hyperparameters or config file.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QLearnError>;
