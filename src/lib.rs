//! # Chess Q-Learner
//!
//! A tabular Q-learning chess agent trained by playing against a greedy
//! one-ply opponent.
//!
//! ## Features
//!
//! - **Lossy State Abstraction**: (own material, opponent material, own mobility)
//! - **Material Rewards**: Change in material balance plus a checkmate bonus
//! - **Epsilon-Greedy Policy**: Deterministic first-wins tie-breaking, multiplicative ε decay
//! - **Snapshots**: Versioned JSON persistence of the Q-table with bit-exact reload
//! - **Evaluation Arena**: Parallel greedy matches of a frozen policy
//!
//! ## Quick Start
//!
//! ```no_run
//! use chess::Color;
//! use chess_qlearner::{QLearningAgent, QLearningConfig, Trainer, TrainingConfig};
//!
//! let agent = QLearningAgent::new(Color::White, QLearningConfig::default().with_seed(42))?;
//! let mut trainer = Trainer::new(agent, TrainingConfig::default());
//! trainer.run()?;
//! trainer.save_model("q_table.json")?;
//! # Ok::<(), chess_qlearner::QLearnError>(())
//! ```
//!
//! ## Modules
//!
//! - [`qlearn`]: Q-table, policy, training loop and evaluation
//! - [`game`]: Chess positions, state abstraction, rewards and the greedy opponent
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Trainer                              │
//! │  - episode loop         - ε decay per episode                │
//! │  - Bellman updates      - statistics / progress callbacks    │
//! └──────────────────────────────────────────────────────────────┘
//!          │                       │                      │
//!          ▼                       ▼                      ▼
//!   ┌──────────────┐      ┌──────────────────┐    ┌────────────────┐
//!   │ QLearning    │      │ RewardEnvironment│    │ GreedyOpponent │
//!   │ Agent+QTable │      │ (live position)  │    │ (pure lookahead│
//!   └──────────────┘      └──────────────────┘    └────────────────┘
//! ```

#![warn(missing_docs)]

/// Tabular Q-learning module.
///
/// Storage, policy, training loop and evaluation.
pub mod qlearn;

/// Chess adapter module.
///
/// Wraps the `chess` rules engine and provides the state abstraction, reward
/// environment and greedy opponent.
pub mod game;

// Re-export commonly used types at crate root for convenience
pub use game::{GameResult, GreedyOpponent, Position, RewardEnvironment, StateKey};
pub use qlearn::{
    evaluate_policy, MatchReport, QLearnError, QLearningAgent, QLearningConfig, QTable, Trainer,
    TrainingConfig, TrainingStats,
};
