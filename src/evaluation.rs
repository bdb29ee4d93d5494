use crate::board::Piece;
use crate::state::State;

/// Score of being checkmated, from the mated side's point of view.
pub const MATE_SCORE: i32 = 1_000_000;

/// Scores at least this large can only come from a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    // Bonus per attacked square, own minus enemy
    pub mobility_weight: i32,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 300,
            bishop_value: 300,
            rook_value: 500,
            queen_value: 900,
            king_value: 0,

            mobility_weight: 0,
        }
    }

    pub fn with_mobility_weight(mut self, weight: i32) -> Self {
        self.mobility_weight = weight;
        self
    }

    /// Evaluates `state` for the side to move: 0 for stalemate, `-MATE_SCORE`
    /// when mated, otherwise material (plus mobility when weighted).
    pub fn evaluate(&self, state: &State) -> i32 {
        if state.has_no_possible_moves() {
            return if state.in_check() { -MATE_SCORE } else { 0 };
        }

        let mut score = 0;
        state.board().for_each_piece(|_, (piece, color)| {
            let value = self.piece_value(piece);
            score += if color == state.turn() { value } else { -value };
        });

        score + self.evaluate_mobility(state)
    }

    pub fn piece_value(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.pawn_value,
            Piece::Knight => self.knight_value,
            Piece::Bishop => self.bishop_value,
            Piece::Rook => self.rook_value,
            Piece::Queen => self.queen_value,
            Piece::King => self.king_value,
        }
    }

    fn evaluate_mobility(&self, state: &State) -> i32 {
        if self.mobility_weight == 0 {
            return 0;
        }

        // Raw attack sets on both sides keep the term symmetric
        let own = state.all_attacked_positions_by_me().len() as i32;
        let enemy = state.all_attacked_positions_by_the_enemy().len() as i32;
        self.mobility_weight * (own - enemy)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}
