//! State abstraction for the Q-table.
//!
//! A full chess position is far too large to key a table by, so the agent sees
//! only three small integers: its own material count, the opponent's material
//! count, and its own mobility. Many positions collapse onto the same key; that
//! loss is what keeps the table bounded.

use std::fmt;

use chess::{Color, Piece};
use serde::{Deserialize, Serialize};

use crate::game::position::Position;

/// Piece types that count toward material. The king is always present and excluded.
pub const COUNTED_PIECES: [Piece; 5] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
];

/// Compact, hashable summary of a position from one side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    /// Number of non-king pieces the agent owns.
    pub own_material: u8,
    /// Number of non-king pieces the opponent owns.
    pub opponent_material: u8,
    /// Legal moves the agent would have if it were its turn.
    pub own_mobility: u16,
}

impl StateKey {
    /// Build a key from raw counts.
    pub fn new(own_material: u8, opponent_material: u8, own_mobility: u16) -> Self {
        Self {
            own_material,
            opponent_material,
            own_mobility,
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.own_material, self.opponent_material, self.own_mobility
        )
    }
}

fn material_count(position: &Position, color: Color) -> u8 {
    COUNTED_PIECES
        .iter()
        .map(|&piece| position.piece_count(piece, color))
        .sum::<u32>() as u8
}

/// Reduce `position` to the key seen by the side playing `color`.
///
/// Mobility is counted as if `color` were to move, even when the opponent is
/// on move, which previews the agent's mobility after its own move. The
/// override is done on a private copy; `position` is never modified.
pub fn state_key(position: &Position, color: Color) -> StateKey {
    StateKey {
        own_material: material_count(position, color),
        opponent_material: material_count(position, !color),
        own_mobility: position.legal_move_count_for(color) as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse_uci;

    #[test]
    fn test_start_position_key() {
        let position = Position::new();
        assert_eq!(state_key(&position, Color::White), StateKey::new(15, 15, 20));
        assert_eq!(state_key(&position, Color::Black), StateKey::new(15, 15, 20));
    }

    #[test]
    fn test_key_is_deterministic_and_pure() {
        let mut position = Position::new();
        position.try_push(parse_uci("e2e4").unwrap()).unwrap();
        let before = position.clone();

        let first = state_key(&position, Color::White);
        let second = state_key(&position, Color::White);

        assert_eq!(first, second);
        assert_eq!(position, before);
        assert_eq!(position.side_to_move(), Color::Black);
        // White previews its own mobility even though Black is on move
        assert!(first.own_mobility > 20);
    }

    #[test]
    fn test_material_after_capture() {
        let mut position =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
                .unwrap();
        position.try_push(parse_uci("e4d5").unwrap()).unwrap();

        let white = state_key(&position, Color::White);
        let black = state_key(&position, Color::Black);
        assert_eq!((white.own_material, white.opponent_material), (15, 14));
        assert_eq!((black.own_material, black.opponent_material), (14, 15));
    }

    #[test]
    fn test_mobility_after_giving_check() {
        let mut position = Position::new();
        for text in ["e2e4", "f7f6", "d1h5"] {
            position.try_push(parse_uci(text).unwrap()).unwrap();
        }
        let before = position.clone();

        let key = state_key(&position, Color::White);
        assert!(position.is_check());
        assert_eq!((key.own_material, key.opponent_material), (15, 15));
        assert!(key.own_mobility > 20);
        assert_eq!(position, before);
    }

    #[test]
    fn test_mobility_after_checkmate() {
        // After Fool's mate White is mated; Black keeps counting its own moves
        let position = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert!(state_key(&position, Color::Black).own_mobility > 0);
        assert_eq!(state_key(&position, Color::White).own_mobility, 0);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(StateKey::new(3, 2, 17).to_string(), "(3, 2, 17)");
    }
}
