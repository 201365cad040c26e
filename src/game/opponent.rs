//! Greedy one-ply sparring partner.

use chess::{ChessMove, Color};

use crate::game::environment::RewardEnvironment;
use crate::game::position::Position;

/// Non-learning opponent that plays the move with the best immediate reward.
///
/// Every legal move is tried on a disposable copy of the position and scored
/// with the same reward the learning agent receives. The first move reaching a
/// strictly higher reward wins, so ties go to the earliest move in generation
/// order.
#[derive(Debug, Clone, Copy)]
pub struct GreedyOpponent {
    color: Color,
}

impl GreedyOpponent {
    /// Opponent playing `color`.
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    /// Side this opponent plays.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Best one-step move for the side to move, or `None` if there are no legal moves.
    ///
    /// `position` is only read; all simulation happens on copies.
    pub fn get_move(&self, position: &Position) -> Option<ChessMove> {
        let mut best_move = None;
        let mut max_reward = f64::NEG_INFINITY;

        for mv in position.legal_moves() {
            let Ok((reward, _)) = RewardEnvironment::evaluate(position, mv) else {
                continue;
            };
            if reward > max_reward {
                max_reward = reward;
                best_move = Some(mv);
            }
        }

        best_move
    }
}
