use thiserror::Error;

use crate::board::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("position {0:?} is outside the board")]
    OutOfRange(Position),

    #[error("board string must hold 64 cells, found {0}")]
    InvalidBoardLength(usize),

    #[error("unknown piece glyph {0:?}")]
    UnknownGlyph(char),

    #[error("no piece at {0} to move")]
    NoPieceAt(Position),

    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Position, to: Position },

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search was cancelled")]
    Cancelled,
}
