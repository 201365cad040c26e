//! Chess position backed by the `chess` crate.
//!
//! `chess::Board` knows legality, check, checkmate and stalemate but keeps no
//! game history. `Position` adds the bookkeeping needed for the automatic draw
//! rules (insufficient material, seventy-five moves, fivefold repetition) so a
//! self-play episode always reaches a terminal state.

use std::fmt;
use std::str::FromStr;

use chess::{
    BitBoard, Board, BoardStatus, ChessMove, Color, File, MoveGen, Piece, Rank, Square, EMPTY,
};

use crate::game::mobility::move_count_for;
use crate::game::notation::to_uci;
use crate::qlearn::error::{QLearnError, Result};

/// Dark squares (a1 is dark).
const DARK_SQUARES: BitBoard = BitBoard(0xAA55_AA55_AA55_AA55);

/// Halfmove clock value at which the seventy-five-move rule ends the game.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of the same position that end the game.
const FIVEFOLD: usize = 5;

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    /// First side (White) won.
    WhiteWins,
    /// Second side (Black) won.
    BlackWins,
    /// Drawn game.
    Draw,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::WhiteWins => write!(f, "1-0"),
            GameResult::BlackWins => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
        }
    }
}

/// A complete game position: board, side to move and draw bookkeeping.
///
/// Cloning a `Position` yields an independent deep copy, which is what all
/// speculative evaluation works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    /// Plies since the last capture or pawn move.
    halfmove_clock: u32,
    /// Zobrist hashes since the last irreversible move, current position last.
    history: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    /// Wrap a bare board with a fresh history.
    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            halfmove_clock: 0,
            history: vec![board.get_hash()],
        }
    }

    /// Parse a FEN string. The halfmove clock is taken from the fifth field if present.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let board = Board::from_str(fen)
            .map_err(|e| QLearnError::InvalidPosition(format!("{fen}: {e:?}")))?;
        let mut position = Self::from_board(board);
        position.halfmove_clock = fen
            .split_whitespace()
            .nth(4)
            .and_then(|field| field.parse().ok())
            .unwrap_or(0);
        Ok(position)
    }

    /// The underlying rules-engine board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Legal moves for the side to move, in the engine's generation order.
    ///
    /// The order is stable for a given position; tie-breaking everywhere in
    /// the crate relies on it.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    /// Whether `mv` is legal for the side to move.
    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.board.legal(mv)
    }

    /// Number of legal moves `color` would have if it were its turn.
    ///
    /// Works on a private copy; `self` is never touched. The engine cannot pass
    /// the turn while the side to move is in check, so that case is counted
    /// from the attack tables instead.
    pub fn legal_move_count_for(&self, color: Color) -> usize {
        if self.board.side_to_move() == color {
            return MoveGen::new_legal(&self.board).len();
        }
        match self.board.null_move() {
            Some(swapped) => MoveGen::new_legal(&swapped).len(),
            None => move_count_for(&self.board, color),
        }
    }

    /// Number of pieces of one type and colour.
    pub fn piece_count(&self, piece: Piece, color: Color) -> u32 {
        (*self.board.pieces(piece) & *self.board.color_combined(color)).popcnt()
    }

    /// Apply a move, checking legality first.
    pub fn try_push(&mut self, mv: ChessMove) -> Result<()> {
        if !self.is_legal(mv) {
            return Err(QLearnError::IllegalAction(to_uci(mv)));
        }
        self.push(mv);
        Ok(())
    }

    /// Apply a move that the caller has already checked for legality.
    pub fn push(&mut self, mv: ChessMove) {
        let irreversible = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();

        self.board = self.board.make_move_new(mv);

        if irreversible {
            self.halfmove_clock = 0;
            self.history.clear();
        } else {
            self.halfmove_clock += 1;
        }
        self.history.push(self.board.get_hash());
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        *self.board.checkers() != EMPTY
    }

    /// Whether the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    /// Whether the side to move is stalemated.
    pub fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    /// Neither side can possibly deliver mate.
    ///
    /// Covers bare kings, a single minor piece, and any number of bishops all
    /// standing on squares of one colour.
    pub fn is_insufficient_material(&self) -> bool {
        let board = &self.board;
        let heavy =
            *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy != EMPTY {
            return false;
        }

        let knights = board.pieces(Piece::Knight).popcnt();
        let bishops = *board.pieces(Piece::Bishop);

        match (knights, bishops.popcnt()) {
            (0, 0) | (1, 0) | (0, 1) => true,
            (0, _) => bishops & DARK_SQUARES == EMPTY || bishops & !DARK_SQUARES == EMPTY,
            _ => false,
        }
    }

    /// 75 moves by each side without a capture or pawn move.
    pub fn is_seventyfive_moves(&self) -> bool {
        self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES && !self.is_checkmate()
    }

    /// The current position has occurred five times.
    pub fn is_fivefold_repetition(&self) -> bool {
        let current = self.board.get_hash();
        self.history.iter().filter(|&&hash| hash == current).count() >= FIVEFOLD
    }

    /// Whether the game has ended without any claim being required.
    pub fn is_game_over(&self) -> bool {
        self.board.status() != BoardStatus::Ongoing
            || self.is_insufficient_material()
            || self.is_seventyfive_moves()
            || self.is_fivefold_repetition()
    }

    /// Result if the game is over, `None` otherwise.
    pub fn outcome(&self) -> Option<GameResult> {
        if self.is_checkmate() {
            return Some(match self.side_to_move() {
                Color::White => GameResult::BlackWins,
                Color::Black => GameResult::WhiteWins,
            });
        }
        if self.is_game_over() {
            return Some(GameResult::Draw);
        }
        None
    }
}

fn piece_symbol(piece: Piece, color: Color) -> char {
    let symbol = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => symbol.to_ascii_uppercase(),
        Color::Black => symbol,
    }
}

impl fmt::Display for Position {
    /// ASCII diagram, rank 8 at the top, `.` for empty squares.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            let row: Vec<String> = (0..8)
                .map(|file| {
                    let square =
                        Square::make_square(Rank::from_index(rank), File::from_index(file));
                    match (self.board.piece_on(square), self.board.color_on(square)) {
                        (Some(piece), Some(color)) => piece_symbol(piece, color).to_string(),
                        _ => ".".to_string(),
                    }
                })
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}
