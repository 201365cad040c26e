//! Move counting for the side that is not on move.
//!
//! `chess::Board::null_move` refuses to pass the turn while the side to move
//! is in check, yet the state abstraction still needs the other side's move
//! count in exactly that situation (right after a checking move). This module
//! counts those moves from the crate's attack tables, filtered by the safety
//! of the counting side's own king.

use chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_pawn_moves,
    get_rook_moves, BitBoard, Board, Color, File, Piece, Rank, Square, EMPTY,
};

/// Promotion choices generated for every pawn move onto the last rank.
const PROMOTION_PIECES: usize = 4;

/// Number of legal moves `color` would have on `board` if it were its turn.
///
/// Counts each promotion choice separately and includes castling. En passant
/// never applies: the en passant square always belongs to the side to move.
pub fn move_count_for(board: &Board, color: Color) -> usize {
    let own = *board.color_combined(color);
    let occupied = *board.combined();
    let king = board.king_square(color);
    let last_rank = match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    };

    let mut count = 0;
    for from in own {
        let Some(piece) = board.piece_on(from) else {
            continue;
        };
        let targets = match piece {
            Piece::Pawn => get_pawn_moves(from, color, occupied),
            Piece::Knight => get_knight_moves(from),
            Piece::Bishop => get_bishop_moves(from, occupied),
            Piece::Rook => get_rook_moves(from, occupied),
            Piece::Queen => get_bishop_moves(from, occupied) | get_rook_moves(from, occupied),
            Piece::King => get_king_moves(from),
        } & !own;

        for to in targets {
            let king_after = if piece == Piece::King { to } else { king };
            if !king_safe_after(board, color, from, to, king_after) {
                continue;
            }
            count += if piece == Piece::Pawn && to.get_rank() == last_rank {
                PROMOTION_PIECES
            } else {
                1
            };
        }
    }

    count + castle_count(board, color)
}

/// Whether `color`'s king on `king` is safe once a piece moves `from` -> `to`.
fn king_safe_after(board: &Board, color: Color, from: Square, to: Square, king: Square) -> bool {
    let to_bb = BitBoard::from_square(to);
    let occupied = (*board.combined() & !BitBoard::from_square(from)) | to_bb;
    let enemies = *board.color_combined(!color) & !to_bb;
    !is_attacked(board, king, color, occupied, enemies)
}

/// Whether `square` is attacked by `enemies`, as seen by `color`.
fn is_attacked(
    board: &Board,
    square: Square,
    color: Color,
    occupied: BitBoard,
    enemies: BitBoard,
) -> bool {
    let enemy = |piece: Piece| *board.pieces(piece) & enemies;
    let diagonal = enemy(Piece::Bishop) | enemy(Piece::Queen);
    let straight = enemy(Piece::Rook) | enemy(Piece::Queen);

    (get_knight_moves(square) & enemy(Piece::Knight)) != EMPTY
        || (get_bishop_moves(square, occupied) & diagonal) != EMPTY
        || (get_rook_moves(square, occupied) & straight) != EMPTY
        || get_pawn_attacks(square, color, enemy(Piece::Pawn)) != EMPTY
        || (get_king_moves(square) & enemy(Piece::King)) != EMPTY
}

fn castle_count(board: &Board, color: Color) -> usize {
    let rights = board.castle_rights(color);
    if !rights.has_kingside() && !rights.has_queenside() {
        return 0;
    }

    let king = board.king_square(color);
    let occupied = *board.combined();
    let enemies = *board.color_combined(!color);
    if is_attacked(board, king, color, occupied, enemies) {
        return 0;
    }

    let square = |file: File| Square::make_square(king.get_rank(), file);
    let empty = |files: &[File]| files.iter().all(|&f| board.piece_on(square(f)).is_none());
    let unattacked = |files: &[File]| {
        files
            .iter()
            .all(|&f| !is_attacked(board, square(f), color, occupied, enemies))
    };

    let mut count = 0;
    if rights.has_kingside() && empty(&[File::F, File::G]) && unattacked(&[File::F, File::G]) {
        count += 1;
    }
    if rights.has_queenside()
        && empty(&[File::B, File::C, File::D])
        && unattacked(&[File::C, File::D])
    {
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::MoveGen;
    use std::str::FromStr;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn test_matches_engine_for_side_to_move() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/3P1N2/PPP2PPP/RNBQK2R w KQkq - 1 5",
            "r3k2r/pppq1ppp/2npbn2/4p3/4P3/2NPBN2/PPPQ1PPP/R3K2R b KQkq - 0 8",
            "8/P6k/8/8/8/8/8/K7 w - - 0 1",
            "4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1",
            "4k3/4r3/8/8/8/8/3P4/4K3 w - - 0 1",
        ];
        for fen in fens {
            let board = board(fen);
            assert_eq!(
                move_count_for(&board, board.side_to_move()),
                MoveGen::new_legal(&board).len(),
                "move count differs for {}",
                fen
            );
        }
    }

    #[test]
    fn test_matches_null_move_when_not_in_check() {
        let board = board("r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/3P1N2/PPP2PPP/RNBQK2R w KQkq - 1 5");
        let swapped = board.null_move().unwrap();
        assert_eq!(
            move_count_for(&board, Color::Black),
            MoveGen::new_legal(&swapped).len()
        );
    }

    #[test]
    fn test_counts_checking_side_while_opponent_in_check() {
        // Black is in check from the rook on e2; white still has its king and rook moves
        let board = board("4k3/8/8/8/8/8/4R3/K7 b - - 0 1");
        assert!(board.null_move().is_none());
        // King a1: a2, b1, b2. Rook e2: 7 along the rank, e1, e3..e8 (e8 is the king's square)
        assert_eq!(move_count_for(&board, Color::White), 3 + 7 + 1 + 6);
    }
}
