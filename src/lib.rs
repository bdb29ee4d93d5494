pub mod board;
pub mod error;
pub mod evaluation;
pub mod movegen;
pub mod protocol;
pub mod search;
pub mod state;
pub mod transposition;

pub use board::{Board, Color, Piece, Position};
pub use error::{ChessError, SearchError};
pub use movegen::Move;
pub use search::{CancelToken, SearchConfig, SearchEngine};
pub use state::{CastlingRights, State};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn pos(square: &str) -> Position {
        square.parse().unwrap()
    }

    fn play_all(state: State, moves: &[(&str, &str)]) -> State {
        moves
            .iter()
            .fold(state, |state, (from, to)| state.play(pos(from), pos(to)).unwrap())
    }

    const CASTLING: &str = concat!(
        "    ♚   ",
        "        ",
        "        ",
        "        ",
        "        ",
        "        ",
        "        ",
        "♖   ♔  ♖",
    );

    fn castling_state() -> State {
        State::from_board_str(CASTLING, Color::White, None, CastlingRights::ALL).unwrap()
    }

    #[test]
    fn test_initial_position() {
        let state = State::initial();
        let moves = state.all_possible_moves();

        // 16 pawn moves and 4 knight moves
        assert_eq!(moves.len(), 20);
        let knight_moves = moves
            .iter()
            .filter(|mv| state.board().get(mv.from) == Some((Piece::Knight, Color::White)))
            .count();
        assert_eq!(knight_moves, 4);
    }

    #[test]
    fn test_perft_initial_position() {
        let state = State::initial();

        assert_eq!(perft(&state, 1), 20);
        assert_eq!(perft(&state, 2), 400);
        assert_eq!(perft(&state, 3), 8902);
    }

    fn perft(state: &State, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = state.all_possible_moves();
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for mv in moves {
            let next = state.apply_move(mv.from, mv.to).unwrap();
            nodes += perft(&next, depth - 1);
        }

        nodes
    }

    #[test]
    fn test_fools_mate() {
        let state = play_all(
            State::initial(),
            &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
        );

        assert!(state.in_check());
        assert!(state.in_checkmate());
        assert!(!state.in_stalemate());
        assert!(state.all_possible_moves().is_empty());
        assert_eq!(state.score(), -evaluation::MATE_SCORE);
    }

    #[test]
    fn test_check_is_not_mate() {
        let state = play_all(State::initial(), &[("e2", "e4"), ("f7", "f6"), ("d1", "h5")]);

        assert!(state.in_check());
        assert!(!state.in_checkmate());
        assert_eq!(state.all_possible_moves(), &[Move::new(pos("g7"), pos("g6"))]);
    }

    #[test]
    fn test_stalemate() {
        let state = State::from_board_str(
            concat!(
                "♚       ",
                "  ♕     ",
                "        ",
                "        ",
                "        ",
                "        ",
                "        ",
                "       ♔",
            ),
            Color::Black,
            None,
            CastlingRights::NONE,
        )
        .unwrap();

        assert!(!state.in_check());
        assert!(state.in_stalemate());
        assert!(!state.in_checkmate());
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_en_passant() {
        let state = play_all(
            State::initial(),
            &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")],
        );
        assert_eq!(state.en_passant(), Some(pos("d6")));
        assert!(state.valid_moves(pos("e5")).contains(&pos("d6")));

        let captured = state.play(pos("e5"), pos("d6")).unwrap();
        assert_eq!(captured.board().get(pos("d6")), Some((Piece::Pawn, Color::White)));
        assert_eq!(captured.board().get(pos("d5")), None);
        assert_eq!(captured.board().get(pos("e5")), None);
    }

    #[test]
    fn test_en_passant_expires_after_one_ply() {
        let state = play_all(
            State::initial(),
            &[
                ("e2", "e4"),
                ("a7", "a6"),
                ("e4", "e5"),
                ("d7", "d5"),
                ("h2", "h3"),
                ("h7", "h6"),
            ],
        );
        assert!(!state.valid_moves(pos("e5")).contains(&pos("d6")));
    }

    #[test]
    fn test_black_en_passant() {
        let state = play_all(
            State::initial(),
            &[("a2", "a3"), ("d7", "d5"), ("a3", "a4"), ("d5", "d4"), ("e2", "e4")],
        );
        assert!(state.valid_moves(pos("d4")).contains(&pos("e3")));

        let captured = state.play(pos("d4"), pos("e3")).unwrap();
        assert_eq!(captured.board().get(pos("e4")), None);
        assert_eq!(captured.board().get(pos("e3")), Some((Piece::Pawn, Color::Black)));
    }

    #[test]
    fn test_castling_both_sides() {
        let state = castling_state();
        let moves = state.valid_moves(pos("e1"));
        assert!(moves.contains(&pos("g1")));
        assert!(moves.contains(&pos("c1")));

        let kingside = state.play(pos("e1"), pos("g1")).unwrap();
        assert_eq!(kingside.board().get(pos("f1")), Some((Piece::Rook, Color::White)));
        assert_eq!(kingside.board().get(pos("h1")), None);
        assert!(!kingside.castling().white_kingside);
        assert!(!kingside.castling().white_queenside);

        let queenside = state.play(pos("e1"), pos("c1")).unwrap();
        assert_eq!(queenside.board().get(pos("d1")), Some((Piece::Rook, Color::White)));
        assert_eq!(queenside.board().get(pos("a1")), None);
    }

    #[test]
    fn test_castling_lost_after_rook_moves() {
        let state = play_all(
            castling_state(),
            &[("h1", "h2"), ("e8", "d8"), ("h2", "h1"), ("d8", "e8")],
        );
        let moves = state.valid_moves(pos("e1"));
        assert!(!moves.contains(&pos("g1")));
        assert!(moves.contains(&pos("c1")));
    }

    #[test]
    fn test_castling_lost_after_king_moves() {
        let state = play_all(
            castling_state(),
            &[("e1", "e2"), ("e8", "d8"), ("e2", "e1"), ("d8", "e8")],
        );
        let moves = state.valid_moves(pos("e1"));
        assert!(!moves.contains(&pos("g1")));
        assert!(!moves.contains(&pos("c1")));
    }

    #[test]
    fn test_no_castling_through_attacked_square() {
        let state = State::from_board_str(
            concat!(
                "    ♚♜  ",
                "        ",
                "        ",
                "        ",
                "        ",
                "        ",
                "        ",
                "♖   ♔  ♖",
            ),
            Color::White,
            None,
            CastlingRights::ALL,
        )
        .unwrap();

        let moves = state.valid_moves(pos("e1"));
        assert!(!moves.contains(&pos("g1")));
        assert!(moves.contains(&pos("c1")));
    }

    #[test]
    fn test_no_castling_out_of_check_or_through_pieces() {
        let in_check = State::from_board_str(
            concat!(
                "    ♚   ",
                "        ",
                "        ",
                "        ",
                "       ♝",
                "        ",
                "        ",
                "♖   ♔  ♖",
            ),
            Color::White,
            None,
            CastlingRights::ALL,
        )
        .unwrap();
        assert!(in_check.in_check());
        let moves = in_check.valid_moves(pos("e1"));
        assert!(!moves.contains(&pos("g1")));
        assert!(!moves.contains(&pos("c1")));

        let blocked = State::initial();
        assert!(blocked.valid_moves(pos("e1")).is_empty());
    }

    #[test]
    fn test_random_playouts_keep_rules_consistent() {
        let mut rng = StdRng::seed_from_u64(0x5a1_e0);

        for _ in 0..4 {
            let mut state = State::initial();
            for _ in 0..80 {
                let reimported = Board::import(&state.export()).unwrap();
                assert_eq!(&reimported, state.board());

                let mut own_pieces = Vec::new();
                state.board().for_each_piece(|from, piece| {
                    if !state.is_enemy(piece) {
                        own_pieces.push(from);
                    }
                });

                for from in own_pieces {
                    for to in state.valid_moves(from) {
                        assert!(to.is_on_board());
                        let next = state.apply_move(from, to).unwrap();
                        assert!(!next.can_capture_enemy_king(), "{}{} leaves the king en prise", from, to);
                    }
                }

                let no_moves = state.all_possible_moves().is_empty();
                assert_eq!(state.in_checkmate(), state.in_check() && no_moves);
                assert_eq!(state.in_stalemate(), !state.in_check() && no_moves);

                let mv = match state.all_possible_moves().choose(&mut rng) {
                    Some(mv) => *mv,
                    None => break,
                };
                state = state.play(mv.from, mv.to).unwrap();
            }
        }
    }

    #[test]
    fn test_suggest_move_from_initial_position() {
        let config = SearchConfig::default().with_depth(2);
        let mut engine = SearchEngine::with_config(State::initial(), config);

        let suggested = engine.suggest_move().unwrap().unwrap();
        assert!(engine.available_moves().contains(&suggested));

        let best = engine.score(suggested.from, suggested.to).unwrap().unwrap();
        for mv in engine.available_moves().to_vec() {
            let score = engine.score(mv.from, mv.to).unwrap().unwrap();
            assert!(best >= score, "{} scored {} above {} ({})", mv, score, suggested, best);
        }
    }

    #[test]
    fn test_rank_moves_orders_best_first() {
        let config = SearchConfig::default().with_depth(1);
        let mut engine = SearchEngine::with_config(State::initial(), config);

        let ranked = engine.rank_moves().unwrap();
        assert_eq!(ranked.len(), 20);
        assert!(ranked.windows(2).all(|pair| pair[0].1 >= pair[1].1));
    }
}
