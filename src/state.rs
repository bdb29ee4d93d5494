use std::cell::OnceCell;
use std::fmt;

use tracing::warn;

use crate::board::{Board, Color, Piece, Position};
use crate::error::ChessError;
use crate::evaluation::Evaluator;
use crate::movegen::Move;

/// Castling availability, tracked per color and per wing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_kingside: false,
        white_queenside: false,
        black_kingside: false,
        black_queenside: false,
    };

    /// Rights a freshly imported board can still have: king and rook on their
    /// original squares.
    pub fn inferred(board: &Board) -> Self {
        let at = |x: i8, y: i8, piece: Piece, color: Color| {
            board.get(Position::new(x, y)) == Some((piece, color))
        };
        let white_king = at(4, 7, Piece::King, Color::White);
        let black_king = at(4, 0, Piece::King, Color::Black);
        CastlingRights {
            white_kingside: white_king && at(7, 7, Piece::Rook, Color::White),
            white_queenside: white_king && at(0, 7, Piece::Rook, Color::White),
            black_kingside: black_king && at(7, 0, Piece::Rook, Color::Black),
            black_queenside: black_king && at(0, 0, Piece::Rook, Color::Black),
        }
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    fn revoke(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// A rook leaving or being captured on its corner loses that wing.
    fn touch(&mut self, pos: Position) {
        match (pos.x, pos.y) {
            (7, 7) => self.white_kingside = false,
            (0, 7) => self.white_queenside = false,
            (7, 0) => self.black_kingside = false,
            (0, 0) => self.black_queenside = false,
            _ => {}
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        CastlingRights::ALL
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let flags = [
            (self.white_kingside, 'K'),
            (self.white_queenside, 'Q'),
            (self.black_kingside, 'k'),
            (self.black_queenside, 'q'),
        ];
        let mut any = false;
        for (set, c) in flags {
            if set {
                write!(f, "{}", c)?;
                any = true;
            }
        }
        if !any {
            write!(f, "-")?;
        }
        Ok(())
    }
}

/// An immutable position. Moves produce new states; the legal move list is
/// computed at most once per state.
#[derive(Debug, Clone)]
pub struct State {
    board: Board,
    turn: Color,
    en_passant: Option<Position>,
    castling: CastlingRights,
    legal_moves: OnceCell<Vec<Move>>,
}

impl State {
    pub fn new(
        board: Board,
        turn: Color,
        en_passant: Option<Position>,
        castling: CastlingRights,
    ) -> Self {
        Self {
            board,
            turn,
            en_passant,
            castling,
            legal_moves: OnceCell::new(),
        }
    }

    pub fn initial() -> Self {
        State::new(Board::initial(), Color::White, None, CastlingRights::ALL)
    }

    pub fn from_board_str(
        board: &str,
        turn: Color,
        en_passant: Option<Position>,
        castling: CastlingRights,
    ) -> Result<Self, ChessError> {
        Ok(State::new(Board::import(board)?, turn, en_passant, castling))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn en_passant(&self) -> Option<Position> {
        self.en_passant
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn export(&self) -> String {
        self.board.export()
    }

    pub fn to_matrix(&self) -> [[Option<(Piece, Color)>; 8]; 8] {
        self.board.to_matrix()
    }

    /// Cache key: board occupancy, side to move, en passant target and
    /// castling rights.
    pub fn signature(&self) -> String {
        let turn = match self.turn {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let en_passant = self
            .en_passant
            .map_or_else(|| "-".to_string(), |pos| pos.to_string());
        format!("{}{} {} {}", self.board.export(), turn, en_passant, self.castling)
    }

    pub fn is_enemy(&self, piece: (Piece, Color)) -> bool {
        piece.1 != self.turn
    }

    /// Moves the piece on `from` to `to` without checking legality, applying
    /// en passant, promotion and castling as implied by the board.
    pub fn apply_move(&self, from: Position, to: Position) -> Result<State, ChessError> {
        let (piece, color) = match self.board.get(from) {
            Some(cell) => cell,
            None => {
                warn!(%from, %to, "refusing to move from an empty square");
                return Err(ChessError::NoPieceAt(from));
            }
        };

        let mut board = self.board;
        board.clear(from);
        board.set(to, (piece, color))?;

        // Double step leaves a capturable square behind
        let en_passant = if piece == Piece::Pawn && from.x == to.x && (to.y - from.y).abs() == 2 {
            Some(Position::new(from.x, (from.y + to.y) / 2))
        } else {
            None
        };

        if piece == Piece::Pawn && from.x != to.x && Some(to) == self.en_passant {
            board.clear(Position::new(to.x, from.y));
        }

        if piece == Piece::Pawn && to.y == color.promotion_row() {
            board.set(to, (Piece::Queen, color))?;
        }

        let home = Position::new(4, color.home_row());
        if piece == Piece::King && from == home && to.y == from.y {
            let rook_move = match to.x - from.x {
                2 if self.castling.kingside(color) => Some((7, 5)),
                -2 if self.castling.queenside(color) => Some((0, 3)),
                _ => None,
            };
            if let Some((rook_from, rook_to)) = rook_move {
                let rook_from = Position::new(rook_from, from.y);
                if let Some(rook) = board.get(rook_from) {
                    board.clear(rook_from);
                    board.set(Position::new(rook_to, from.y), rook)?;
                }
            }
        }

        let mut castling = self.castling;
        if piece == Piece::King {
            castling.revoke(color);
        }
        castling.touch(from);
        castling.touch(to);

        Ok(State::new(board, self.turn.opposite(), en_passant, castling))
    }

    /// Like `apply_move`, but only for moves `valid_moves` allows.
    pub fn play(&self, from: Position, to: Position) -> Result<State, ChessError> {
        if self.board.get(from).is_none() {
            return Err(ChessError::NoPieceAt(from));
        }
        if !self.valid_moves(from).contains(&to) {
            warn!(%from, %to, "rejecting illegal move");
            return Err(ChessError::IllegalMove { from, to });
        }
        self.apply_move(from, to)
    }

    pub fn all_possible_moves(&self) -> &[Move] {
        self.legal_moves.get_or_init(|| {
            self.board
                .pieces()
                .filter(|&(_, cell)| !self.is_enemy(cell))
                .flat_map(|(from, _)| {
                    self.valid_moves(from)
                        .into_iter()
                        .map(move |to| Move::new(from, to))
                })
                .collect()
        })
    }

    pub fn in_check(&self) -> bool {
        let king = self
            .board
            .find_piece(|_, piece| piece == (Piece::King, self.turn));
        match king {
            Some(king) => self.is_attacked_by(king, self.turn.opposite()),
            None => false,
        }
    }

    /// Pawns are tried first since they are the cheapest pieces to prove mobile.
    pub fn has_no_possible_moves(&self) -> bool {
        if let Some(moves) = self.legal_moves.get() {
            return moves.is_empty();
        }

        let turn = self.turn;
        let pawns = self
            .board
            .pieces()
            .filter(move |&(_, (piece, color))| color == turn && piece == Piece::Pawn);
        let others = self
            .board
            .pieces()
            .filter(move |&(_, (piece, color))| color == turn && piece != Piece::Pawn);

        !pawns
            .chain(others)
            .any(|(from, _)| !self.valid_moves(from).is_empty())
    }

    pub fn in_checkmate(&self) -> bool {
        self.in_check() && self.has_no_possible_moves()
    }

    pub fn in_stalemate(&self) -> bool {
        !self.in_check() && self.has_no_possible_moves()
    }

    /// Static evaluation relative to the side to move.
    pub fn score(&self) -> i32 {
        Evaluator::new().evaluate(self)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.turn == other.turn
            && self.en_passant == other.en_passant
            && self.castling == other.castling
    }
}

impl Eq for State {}

impl Default for State {
    fn default() -> Self {
        State::initial()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.board)?;
        let turn = match self.turn {
            Color::White => "white",
            Color::Black => "black",
        };
        write!(f, "{} to move, castling {}", turn, self.castling)?;
        if let Some(target) = self.en_passant {
            write!(f, ", en passant {}", target)?;
        }
        writeln!(f)
    }
}
