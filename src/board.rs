use std::fmt;
use std::str::FromStr;

use crate::error::ChessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn step. Black sits at the top of the board string.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn home_row(&self) -> i8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn pawn_row(&self) -> i8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    pub fn promotion_row(&self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

/// A cell on the board. `x` is the file (0 = a), `y` the row counted from
/// black's side (0 = rank 8). Coordinates may point off the board while
/// generating moves; they are filtered before anything is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    pub fn is_on_board(&self) -> bool {
        (0..8).contains(&self.x) && (0..8).contains(&self.y)
    }

    pub fn offset(&self, dx: i8, dy: i8) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    fn index(&self) -> Option<usize> {
        if self.is_on_board() {
            Some(self.y as usize * 8 + self.x as usize)
        } else {
            None
        }
    }

    fn from_index(index: usize) -> Position {
        Position::new((index % 8) as i8, (index / 8) as i8)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.is_on_board() {
            return write!(f, "({}, {})", self.x, self.y);
        }
        write!(f, "{}{}", (b'a' + self.x as u8) as char, 8 - self.y)
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (file, rank) = match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => (file, rank),
            _ => return Err(ChessError::InvalidSquare(s.to_string())),
        };
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let x = (file as u8 - b'a') as i8;
        let y = 8 - (rank as u8 - b'0') as i8;
        Ok(Position::new(x, y))
    }
}

const VARIATION_SELECTOR: char = '\u{FE0E}';

pub fn glyph(piece: Piece, color: Color) -> char {
    match (color, piece) {
        (Color::White, Piece::King) => '♔',
        (Color::White, Piece::Queen) => '♕',
        (Color::White, Piece::Rook) => '♖',
        (Color::White, Piece::Bishop) => '♗',
        (Color::White, Piece::Knight) => '♘',
        (Color::White, Piece::Pawn) => '♙',
        (Color::Black, Piece::King) => '♚',
        (Color::Black, Piece::Queen) => '♛',
        (Color::Black, Piece::Rook) => '♜',
        (Color::Black, Piece::Bishop) => '♝',
        (Color::Black, Piece::Knight) => '♞',
        (Color::Black, Piece::Pawn) => '♟',
    }
}

pub fn piece_from_glyph(c: char) -> Result<Option<(Piece, Color)>, ChessError> {
    let cell = match c {
        ' ' => None,
        '♔' => Some((Piece::King, Color::White)),
        '♕' => Some((Piece::Queen, Color::White)),
        '♖' => Some((Piece::Rook, Color::White)),
        '♗' => Some((Piece::Bishop, Color::White)),
        '♘' => Some((Piece::Knight, Color::White)),
        '♙' => Some((Piece::Pawn, Color::White)),
        '♚' => Some((Piece::King, Color::Black)),
        '♛' => Some((Piece::Queen, Color::Black)),
        '♜' => Some((Piece::Rook, Color::Black)),
        '♝' => Some((Piece::Bishop, Color::Black)),
        '♞' => Some((Piece::Knight, Color::Black)),
        '♟' => Some((Piece::Pawn, Color::Black)),
        other => return Err(ChessError::UnknownGlyph(other)),
    };
    Ok(cell)
}

pub const INITIAL: &str = concat!(
    "♜♞♝♛♚♝♞♜",
    "♟♟♟♟♟♟♟♟",
    "        ",
    "        ",
    "        ",
    "        ",
    "♙♙♙♙♙♙♙♙",
    "♖♘♗♕♔♗♘♖",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<(Piece, Color)>; 64],
}

impl Board {
    pub fn empty() -> Self {
        Self { cells: [None; 64] }
    }

    pub fn initial() -> Self {
        // INITIAL is a well-formed constant
        Self::import(INITIAL).unwrap_or_else(|_| Self::empty())
    }

    /// Parses the 64-cell glyph string. Newlines are ignored, as is a text
    /// variation selector following a glyph.
    pub fn import(s: &str) -> Result<Self, ChessError> {
        let glyphs: Vec<char> = s
            .chars()
            .filter(|&c| c != '\n' && c != '\r' && c != VARIATION_SELECTOR)
            .collect();
        if glyphs.len() != 64 {
            return Err(ChessError::InvalidBoardLength(glyphs.len()));
        }

        let mut board = Board::empty();
        for (i, &c) in glyphs.iter().enumerate() {
            board.cells[i] = piece_from_glyph(c)?;
        }
        Ok(board)
    }

    pub fn export(&self) -> String {
        let mut output = String::with_capacity(64 * 3 + 8);
        for (i, cell) in self.cells.iter().enumerate() {
            match cell {
                Some((piece, color)) => output.push(glyph(*piece, *color)),
                None => output.push(' '),
            }
            if i % 8 == 7 {
                output.push('\n');
            }
        }
        output
    }

    /// Out-of-range reads are not an error; they simply hold nothing.
    pub fn get(&self, pos: Position) -> Option<(Piece, Color)> {
        pos.index().and_then(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: Position, piece: (Piece, Color)) -> Result<(), ChessError> {
        let index = pos.index().ok_or(ChessError::OutOfRange(pos))?;
        self.cells[index] = Some(piece);
        Ok(())
    }

    pub fn clear(&mut self, pos: Position) {
        if let Some(index) = pos.index() {
            self.cells[index] = None;
        }
    }

    pub fn for_each_piece<F>(&self, mut visit: F)
    where
        F: FnMut(Position, (Piece, Color)),
    {
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(piece) = cell {
                visit(Position::from_index(i), *piece);
            }
        }
    }

    pub fn find_piece<F>(&self, mut predicate: F) -> Option<Position>
    where
        F: FnMut(Position, (Piece, Color)) -> bool,
    {
        self.pieces().find(|&(pos, piece)| predicate(pos, piece)).map(|(pos, _)| pos)
    }

    /// Occupied cells in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, (Piece, Color))> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.map(|piece| (Position::from_index(i), piece)))
    }

    pub fn to_matrix(&self) -> [[Option<(Piece, Color)>; 8]; 8] {
        let mut rows = [[None; 8]; 8];
        for (i, cell) in self.cells.iter().enumerate() {
            rows[i / 8][i % 8] = *cell;
        }
        rows
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::initial()
    }
}

impl FromStr for Board {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::import(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for y in 0..8 {
            result.push_str(&format!("{} ", 8 - y));
            for x in 0..8 {
                match self.get(Position::new(x, y)) {
                    Some((piece, color)) => result.push(glyph(piece, color)),
                    None => result.push('.'),
                }
                if x < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h\n");
        write!(f, "{}", result)
    }
}
