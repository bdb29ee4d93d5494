use std::fmt;

use crate::board::{Color, Piece, Position};
use crate::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-1, -2), (1, -2), (-1, 2), (1, 2),
    (-2, -1), (2, -1), (-2, 1), (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = QUEEN_DIRECTIONS;

impl State {
    /// Squares a piece standing on `from` controls, regardless of who occupies
    /// them. Slider rays include the first occupied square they hit.
    pub fn attacked_positions(&self, piece: Piece, color: Color, from: Position) -> Vec<Position> {
        let mut attacks = Vec::new();

        match piece {
            Piece::Pawn => {
                let dy = color.forward();
                attacks.push(from.offset(-1, dy));
                attacks.push(from.offset(1, dy));
            }
            Piece::Knight => {
                attacks.extend(KNIGHT_OFFSETS.iter().map(|&(dx, dy)| from.offset(dx, dy)));
            }
            Piece::King => {
                attacks.extend(KING_OFFSETS.iter().map(|&(dx, dy)| from.offset(dx, dy)));
            }
            Piece::Rook => self.cast_rays(from, &ROOK_DIRECTIONS, &mut attacks),
            Piece::Bishop => self.cast_rays(from, &BISHOP_DIRECTIONS, &mut attacks),
            Piece::Queen => self.cast_rays(from, &QUEEN_DIRECTIONS, &mut attacks),
        }

        attacks.retain(|pos| pos.is_on_board());
        attacks
    }

    fn cast_rays(&self, from: Position, directions: &[(i8, i8)], attacks: &mut Vec<Position>) {
        for &(dx, dy) in directions {
            let mut pos = from.offset(dx, dy);
            while pos.is_on_board() {
                attacks.push(pos);
                if self.board().get(pos).is_some() {
                    break;
                }
                pos = pos.offset(dx, dy);
            }
        }
    }

    fn attacked_positions_by(&self, attacker: Color) -> Vec<Position> {
        self.board()
            .pieces()
            .filter(|&(_, (_, color))| color == attacker)
            .flat_map(|(pos, (piece, color))| self.attacked_positions(piece, color, pos))
            .collect()
    }

    pub fn all_attacked_positions_by_me(&self) -> Vec<Position> {
        self.attacked_positions_by(self.turn())
    }

    pub fn all_attacked_positions_by_the_enemy(&self) -> Vec<Position> {
        self.attacked_positions_by(self.turn().opposite())
    }

    /// Raw attack test. Never goes through legal move generation, which itself
    /// relies on this to detect checks.
    pub(crate) fn is_attacked_by(&self, target: Position, attacker: Color) -> bool {
        self.board()
            .pieces()
            .filter(|&(_, (_, color))| color == attacker)
            .any(|(pos, (piece, color))| self.attacked_positions(piece, color, pos).contains(&target))
    }

    pub fn can_attack_position(&self, pos: Position) -> bool {
        self.is_attacked_by(pos, self.turn())
    }

    pub fn can_capture_enemy_king(&self) -> bool {
        let enemy = self.turn().opposite();
        match self.board().find_piece(|_, piece| piece == (Piece::King, enemy)) {
            Some(king) => self.can_attack_position(king),
            None => false,
        }
    }

    /// Legal destinations for the piece of the side to move standing on `from`.
    pub fn valid_moves(&self, from: Position) -> Vec<Position> {
        let (piece, color) = match self.board().get(from) {
            Some(cell) if !self.is_enemy(cell) => cell,
            _ => return Vec::new(),
        };

        let mut moves = match piece {
            Piece::Pawn => self.pawn_moves(from, color),
            Piece::Knight => self.step_moves(from, &KNIGHT_OFFSETS),
            Piece::Bishop => self.slide_moves(from, &BISHOP_DIRECTIONS),
            Piece::Rook => self.slide_moves(from, &ROOK_DIRECTIONS),
            Piece::Queen => self.slide_moves(from, &QUEEN_DIRECTIONS),
            Piece::King => {
                let mut moves = self.step_moves(from, &KING_OFFSETS);
                moves.extend(self.castling_moves(from, color));
                moves
            }
        };

        // Filter moves out of the board, then moves leaving our king capturable
        moves.retain(|pos| pos.is_on_board());
        moves.retain(|&to| {
            self.apply_move(from, to)
                .map(|next| !next.can_capture_enemy_king())
                .unwrap_or(false)
        });
        moves
    }

    fn is_empty(&self, pos: Position) -> bool {
        pos.is_on_board() && self.board().get(pos).is_none()
    }

    fn holds_enemy(&self, pos: Position) -> bool {
        self.board().get(pos).map_or(false, |cell| self.is_enemy(cell))
    }

    fn pawn_moves(&self, from: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::new();
        let dy = color.forward();

        let single = from.offset(0, dy);
        if self.is_empty(single) {
            moves.push(single);

            let double = from.offset(0, 2 * dy);
            if from.y == color.pawn_row() && self.is_empty(double) {
                moves.push(double);
            }
        }

        for dx in [-1, 1] {
            let capture = from.offset(dx, dy);
            if self.holds_enemy(capture) {
                moves.push(capture);
            }
        }

        // En passant: the pawn must stand on the rank the enemy pawn landed on
        if let Some(target) = self.en_passant() {
            let flanking_row = color.pawn_row() + 3 * dy;
            if from.y == flanking_row && (target.x - from.x).abs() == 1 && target.y == from.y + dy {
                moves.push(target);
            }
        }

        moves
    }

    fn step_moves(&self, from: Position, offsets: &[(i8, i8)]) -> Vec<Position> {
        offsets
            .iter()
            .map(|&(dx, dy)| from.offset(dx, dy))
            .filter(|&pos| self.is_empty(pos) || self.holds_enemy(pos))
            .collect()
    }

    fn slide_moves(&self, from: Position, directions: &[(i8, i8)]) -> Vec<Position> {
        let mut moves = Vec::new();
        for &(dx, dy) in directions {
            let mut pos = from.offset(dx, dy);
            while pos.is_on_board() {
                match self.board().get(pos) {
                    None => moves.push(pos),
                    Some(cell) => {
                        if self.is_enemy(cell) {
                            moves.push(pos);
                        }
                        break;
                    }
                }
                pos = pos.offset(dx, dy);
            }
        }
        moves
    }

    fn castling_moves(&self, from: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::new();
        let row = color.home_row();
        if from != Position::new(4, row) {
            return moves;
        }

        if self.castling().kingside(color) && self.castling_path_clear(color, 7, &[5, 6], &[4, 5, 6]) {
            moves.push(Position::new(6, row));
        }
        if self.castling().queenside(color) && self.castling_path_clear(color, 0, &[1, 2, 3], &[4, 3, 2]) {
            moves.push(Position::new(2, row));
        }

        moves
    }

    /// Rook in its corner, nothing in between, and no square the king stands
    /// on or crosses is attacked.
    fn castling_path_clear(&self, color: Color, rook_x: i8, between: &[i8], king_path: &[i8]) -> bool {
        let row = color.home_row();
        let enemy = color.opposite();

        self.board().get(Position::new(rook_x, row)) == Some((Piece::Rook, color))
            && between.iter().all(|&x| self.is_empty(Position::new(x, row)))
            && king_path
                .iter()
                .all(|&x| !self.is_attacked_by(Position::new(x, row), enemy))
    }
}
