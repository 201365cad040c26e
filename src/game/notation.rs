//! UCI move notation.
//!
//! Moves are keyed in the Q-table by their UCI text (`e2e4`, `e7e8q`, castling
//! as the king's two-square move), which is stable across engine instances and
//! round-trips exactly through [`to_uci`] and [`parse_uci`].

use chess::ChessMove;

use crate::game::position::Position;
use crate::qlearn::error::{QLearnError, Result};

/// Render a move as UCI text.
pub fn to_uci(mv: ChessMove) -> String {
    mv.to_string()
}

/// Parse UCI text into a move without checking legality.
///
/// Accepts upper or lower case and surrounding whitespace.
pub fn parse_uci(text: &str) -> Result<ChessMove> {
    let malformed = || QLearnError::MalformedNotation(text.to_string());
    let normalized = text.trim().to_ascii_lowercase();

    if !normalized.is_ascii() || !matches!(normalized.len(), 4 | 5) {
        return Err(malformed());
    }
    if normalized[..2] == normalized[2..4] {
        return Err(malformed());
    }

    normalized.parse::<ChessMove>().map_err(|_| malformed())
}

/// Parse UCI text and check it against the legal moves of `position`.
///
/// Malformed text yields `MalformedNotation`; well-formed but illegal moves
/// yield `IllegalAction`. Both are meant to be recovered by re-prompting.
pub fn parse_move(position: &Position, text: &str) -> Result<ChessMove> {
    let mv = parse_uci(text)?;
    if !position.is_legal(mv) {
        return Err(QLearnError::IllegalAction(to_uci(mv)));
    }
    Ok(mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Piece;

    #[test]
    fn test_uci_round_trip_for_all_start_moves() {
        let position = Position::new();
        for mv in position.legal_moves() {
            let text = to_uci(mv);
            assert_eq!(parse_uci(&text).unwrap(), mv, "round trip failed for {}", text);
        }
    }

    #[test]
    fn test_promotion_notation() {
        let mv = parse_uci("e7e8q").unwrap();
        assert_eq!(mv.get_promotion(), Some(Piece::Queen));
        assert_eq!(to_uci(mv), "e7e8q");
        assert_eq!(to_uci(parse_uci("A7A8N").unwrap()), "a7a8n");
    }

    #[test]
    fn test_parses_into_engine_moves() {
        use chess::Square;

        assert_eq!(
            parse_uci(" E7E8Q ").unwrap(),
            ChessMove::new(Square::E7, Square::E8, Some(Piece::Queen))
        );
        assert_eq!(
            parse_uci("e1g1").unwrap(),
            ChessMove::new(Square::E1, Square::G1, None)
        );
        assert_eq!(to_uci(ChessMove::new(Square::B2, Square::A1, Some(Piece::Knight))), "b2a1n");
    }

    #[test]
    fn test_malformed_notation() {
        for text in ["", "e2", "e2e4e5", "i2i4", "e0e4", "e2e4k", "e2e2", "Nf3"] {
            assert!(
                matches!(parse_uci(text), Err(QLearnError::MalformedNotation(_))),
                "{} should be malformed",
                text
            );
        }
    }

    #[test]
    fn test_parse_move_checks_legality() {
        let position = Position::new();
        assert!(parse_move(&position, "e2e4").is_ok());
        assert!(matches!(
            parse_move(&position, "e2e5"),
            Err(QLearnError::IllegalAction(_))
        ));
        assert!(matches!(
            parse_move(&position, "g8f6"),
            Err(QLearnError::IllegalAction(_))
        ));
        assert!(matches!(
            parse_move(&position, "hello"),
            Err(QLearnError::MalformedNotation(_))
        ));
    }
}
