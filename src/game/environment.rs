//! Material-based reward environment.
//!
//! The environment owns the one live position of a game. Rewarded moves go
//! through [`RewardEnvironment::step`], unrewarded ones (the opponent's) through
//! [`RewardEnvironment::play`]; both commit permanently. Speculative lookahead
//! uses [`RewardEnvironment::evaluate`], which works on a private copy and never
//! touches any live position.

use chess::{ChessMove, Color, Piece};

use crate::game::notation::to_uci;
use crate::game::position::Position;
use crate::qlearn::error::{QLearnError, Result};

/// Piece values in tenths of a pawn. The bishop's extra tenth breaks ties with the knight.
pub const PIECE_VALUES: [(Piece, i32); 5] = [
    (Piece::Pawn, 10),
    (Piece::Knight, 30),
    (Piece::Bishop, 31),
    (Piece::Rook, 50),
    (Piece::Queen, 90),
];

/// Bonus for delivering checkmate.
pub const CHECKMATE_BONUS: f64 = 100.0;

/// Material of `color` in tenths of a pawn.
pub fn material_tenths(position: &Position, color: Color) -> i32 {
    PIECE_VALUES
        .iter()
        .map(|&(piece, value)| position.piece_count(piece, color) as i32 * value)
        .sum()
}

/// Material of `color` in pawns.
pub fn material_value(position: &Position, color: Color) -> f64 {
    material_tenths(position, color) as f64 / 10.0
}

fn material_balance(position: &Position, color: Color) -> i32 {
    material_tenths(position, color) - material_tenths(position, !color)
}

/// Reward for `mover` going from `before` to `after`.
///
/// The change in material balance, plus [`CHECKMATE_BONUS`] if the move mated.
/// Stalemate and insufficient material add nothing.
fn transition_reward(before: &Position, after: &Position, mover: Color) -> f64 {
    let delta = material_balance(after, mover) - material_balance(before, mover);
    let mut reward = delta as f64 / 10.0;
    if after.is_checkmate() {
        reward += CHECKMATE_BONUS;
    }
    reward
}

/// Environment wrapping the live position of a game.
#[derive(Debug, Clone, Default)]
pub struct RewardEnvironment {
    position: Position,
}

impl RewardEnvironment {
    /// Environment at the starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment at an arbitrary position.
    pub fn with_position(position: Position) -> Self {
        Self { position }
    }

    /// Reset to the starting position.
    pub fn reset(&mut self) -> &Position {
        self.position = Position::new();
        &self.position
    }

    /// The live position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Swap in another position, returning the one it replaces.
    pub fn replace_position(&mut self, position: Position) -> Position {
        std::mem::replace(&mut self.position, position)
    }

    /// Whether the live game is over.
    pub fn is_done(&self) -> bool {
        self.position.is_game_over()
    }

    /// Apply `mv` for the side to move and return `(new position, reward, done)`.
    ///
    /// The reward is from the mover's perspective. The move is committed; there
    /// is no rollback.
    pub fn step(&mut self, mv: ChessMove) -> Result<(&Position, f64, bool)> {
        let mover = self.position.side_to_move();
        let before = self.position.clone();
        self.position.try_push(mv)?;
        let reward = transition_reward(&before, &self.position, mover);
        let done = self.position.is_game_over();
        Ok((&self.position, reward, done))
    }

    /// Apply `mv` without any reward bookkeeping.
    pub fn play(&mut self, mv: ChessMove) -> Result<()> {
        self.position.try_push(mv)
    }

    /// One-step `(reward, done)` of `mv` from `position`, computed on a disposable copy.
    pub fn evaluate(position: &Position, mv: ChessMove) -> Result<(f64, bool)> {
        if !position.is_legal(mv) {
            return Err(QLearnError::IllegalAction(to_uci(mv)));
        }
        let mut after = position.clone();
        after.push(mv);
        let reward = transition_reward(position, &after, position.side_to_move());
        Ok((reward, after.is_game_over()))
    }
}
