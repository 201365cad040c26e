//! Tabular Q-learning core.
//!
//! This module contains the learning side of the crate:
//! - [`QTable`]: two-level state/action value storage with snapshot persistence
//! - [`QLearningAgent`]: epsilon-greedy policy and Bellman update
//! - [`Trainer`]: episode loop against the greedy opponent
//! - [`evaluate_policy`]: parallel evaluation matches of a frozen policy

pub mod agent;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod storage;
pub mod trainer;

pub use agent::{best_known_action, select_action, QLearningAgent};
pub use config::{ConfigError, EpisodeOutcome, QLearningConfig, TrainingConfig, TrainingStats};
pub use error::{QLearnError, Result};
pub use evaluation::{evaluate_policy, play_evaluation_game, GameRecord, MatchReport};
pub use storage::{QTable, QTableSnapshot, SnapshotEntry, SNAPSHOT_VERSION};
pub use trainer::{EpisodeSummary, Trainer};
