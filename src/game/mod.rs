//! Chess-specific components.
//!
//! This module adapts the `chess` rules engine to the learning core:
//!
//! - [`position`]: board plus the draw bookkeeping the engine does not keep
//! - [`abstraction`]: the three-integer [`StateKey`] the Q-table is keyed by
//! - [`environment`]: material rewards and the live game position
//! - [`mobility`]: move counts for the side not on move
//! - [`opponent`]: the greedy one-ply sparring partner
//! - [`notation`]: UCI move text, the Q-table's action key
//!
//! The learning core never inspects a board directly; it only sees state keys,
//! move lists and rewards produced here.

pub mod abstraction;
pub mod environment;
pub mod mobility;
pub mod notation;
pub mod opponent;
pub mod position;

pub use abstraction::{state_key, StateKey};
pub use environment::{RewardEnvironment, CHECKMATE_BONUS, PIECE_VALUES};
pub use notation::{parse_move, parse_uci, to_uci};
pub use opponent::GreedyOpponent;
pub use position::{GameResult, Position};
