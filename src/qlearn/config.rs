//! Configuration options for the Q-learning agent and its training loop.
//!
//! This module provides the hyperparameters that control the Bellman update
//! and the exploration schedule, plus the episode-level training settings and
//! the statistics collected while training.

use std::fs;
use std::path::Path;

use chess::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::GameResult;

/// Hyperparameters for the tabular Q-learning policy.
///
/// These are configuration, not learned state: they are fixed at construction
/// except for the exploration rate, which the agent decays after each episode.
///
/// # Example
/// ```
/// use chess_qlearner::qlearn::QLearningConfig;
///
/// let config = QLearningConfig::default().with_seed(7);
/// assert_eq!(config.learning_rate, 0.1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate α, in (0, 1].
    pub learning_rate: f64,

    /// Discount factor γ, in [0, 1].
    pub discount_factor: f64,

    /// Initial exploration rate ε, in [0, 1].
    ///
    /// With probability ε the agent plays a uniformly random legal move
    /// instead of the best move it knows.
    pub epsilon: f64,

    /// Floor below which ε is never decayed.
    pub epsilon_min: f64,

    /// Multiplicative decay applied to ε once per finished episode, in (0, 1].
    pub epsilon_decay: f64,

    /// Random seed for reproducibility.
    ///
    /// If set, exploration and random fallbacks are reproducible.
    /// If `None`, the agent seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            epsilon: 0.9,
            epsilon_min: 0.05,
            epsilon_decay: 0.9995,
            seed: None,
        }
    }
}

impl QLearningConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for playing with a trained table: no exploration.
    pub fn exploit() -> Self {
        Self {
            epsilon: 0.0,
            epsilon_min: 0.0,
            ..Default::default()
        }
    }

    /// Builder method: set the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Builder method: set the discount factor.
    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    /// Builder method: set the initial exploration rate.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.clamp(0.0, 1.0);
        self
    }

    /// Builder method: set the exploration floor.
    pub fn with_epsilon_min(mut self, epsilon_min: f64) -> Self {
        self.epsilon_min = epsilon_min.clamp(0.0, 1.0);
        self
    }

    /// Builder method: set the per-episode decay factor.
    pub fn with_epsilon_decay(mut self, epsilon_decay: f64) -> Self {
        self.epsilon_decay = epsilon_decay;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from a JSON string and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }

        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(ConfigError::InvalidDiscount(self.discount_factor));
        }

        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::InvalidEpsilon("epsilon", self.epsilon));
        }

        if !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(ConfigError::InvalidEpsilon("epsilon_min", self.epsilon_min));
        }

        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(ConfigError::InvalidDecay(self.epsilon_decay));
        }

        Ok(())
    }
}

/// Episode-level settings for the training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of self-play episodes to run.
    pub episodes: u64,

    /// Optional ply cap per episode.
    ///
    /// `None` lets the rules engine end every game (checkmate, stalemate,
    /// insufficient material, seventy-five moves, fivefold repetition).
    pub max_plies: Option<usize>,

    /// Episodes between progress callbacks and log lines.
    pub progress_interval: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 20_000,
            max_plies: None,
            progress_interval: 100,
        }
    }
}

impl TrainingConfig {
    /// Short runs for tests and smoke checks.
    pub fn quick(episodes: u64) -> Self {
        Self {
            episodes,
            max_plies: Some(60),
            progress_interval: episodes.max(1),
        }
    }

    /// Builder method: set the ply cap.
    pub fn with_max_plies(mut self, max_plies: usize) -> Self {
        self.max_plies = Some(max_plies);
        self
    }
}

/// Errors that can occur when validating or loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Learning rate is out of range (0, 1].
    #[error("learning rate {0} is out of range (0, 1]")]
    InvalidLearningRate(f64),
    /// Discount factor is out of range [0, 1].
    #[error("discount factor {0} is out of range [0, 1]")]
    InvalidDiscount(f64),
    /// An exploration rate is out of range [0, 1].
    #[error("{0} {1} is out of range [0, 1]")]
    InvalidEpsilon(&'static str, f64),
    /// Decay factor is out of range (0, 1].
    #[error("epsilon decay {0} is out of range (0, 1]")]
    InvalidDecay(f64),
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),
    /// Config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// How an episode ended, from the learning agent's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    /// The agent delivered checkmate.
    Win,
    /// Stalemate or any automatic draw.
    Draw,
    /// The agent was checkmated.
    Loss,
    /// The ply cap (or an empty move set) stopped the game first.
    Unfinished,
}

impl EpisodeOutcome {
    /// Translate a game result into the perspective of `color`.
    pub fn from_result(result: Option<GameResult>, color: Color) -> Self {
        match result {
            None => EpisodeOutcome::Unfinished,
            Some(GameResult::Draw) => EpisodeOutcome::Draw,
            Some(GameResult::WhiteWins) if color == Color::White => EpisodeOutcome::Win,
            Some(GameResult::BlackWins) if color == Color::Black => EpisodeOutcome::Win,
            Some(_) => EpisodeOutcome::Loss,
        }
    }
}

/// Statistics tracked during training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Total number of episodes completed.
    pub episodes: u64,

    /// Total plies played by both sides.
    pub plies: u64,

    /// Number of Bellman updates applied.
    pub updates: u64,

    /// Number of distinct state keys in the Q-table.
    pub states: usize,

    /// Exploration rate after the last decay.
    pub epsilon: f64,

    /// Episodes won by the agent.
    pub wins: u64,

    /// Episodes drawn.
    pub draws: u64,

    /// Episodes lost by the agent.
    pub losses: u64,

    /// Episodes cut off before the game ended.
    pub unfinished: u64,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Episodes per second.
    pub episodes_per_second: f64,
}

impl TrainingStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update episodes per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.episodes_per_second = self.episodes as f64 / self.elapsed_seconds;
        }
    }

    /// Count one finished episode.
    pub fn record_outcome(&mut self, outcome: EpisodeOutcome) {
        match outcome {
            EpisodeOutcome::Win => self.wins += 1,
            EpisodeOutcome::Draw => self.draws += 1,
            EpisodeOutcome::Loss => self.losses += 1,
            EpisodeOutcome::Unfinished => self.unfinished += 1,
        }
    }
}
