use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::board::Position;
use crate::error::SearchError;
use crate::evaluation::{Evaluator, MATE_THRESHOLD};
use crate::movegen::Move;
use crate::state::State;
use crate::transposition::{NodeType, TranspositionEntry, TranspositionTable};

/// Window bound used for "no bound at all". Larger than any mate score.
pub const INFINITY: i32 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies searched after each root move.
    pub depth: u32,
    /// Maximum number of cached positions.
    pub cache_capacity: usize,
    /// Reuse cached cutoff bounds only when they are safe for the current
    /// window. When unset every cached score deep enough is reused as exact.
    pub bound_aware_cache: bool,
    pub mobility_weight: i32,
}

impl SearchConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_bound_aware_cache(mut self, bound_aware: bool) -> Self {
        self.bound_aware_cache = bound_aware;
        self
    }

    pub fn with_mobility_weight(mut self, weight: i32) -> Self {
        self.mobility_weight = weight;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            cache_capacity: 1 << 20,
            bound_aware_cache: true,
            mobility_weight: 0,
        }
    }
}

/// Shared flag a caller can raise to abort a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SearchEngine {
    state: State,
    available_moves: Vec<Move>,
    config: SearchConfig,
    evaluator: Evaluator,
    transposition_table: TranspositionTable,
    cancel: CancelToken,
    nodes_searched: u64,
}

impl SearchEngine {
    pub fn new(state: State) -> Self {
        Self::with_config(state, SearchConfig::default())
    }

    pub fn with_config(state: State, config: SearchConfig) -> Self {
        let table = TranspositionTable::new(config.cache_capacity);
        Self::with_cache(state, config, table)
    }

    /// Builds an engine that keeps using a cache from an earlier engine,
    /// e.g. the one that searched the previous position of the same game.
    pub fn with_cache(state: State, config: SearchConfig, table: TranspositionTable) -> Self {
        let available_moves = state.all_possible_moves().to_vec();
        Self {
            state,
            available_moves,
            config,
            evaluator: Evaluator::new().with_mobility_weight(config.mobility_weight),
            transposition_table: table,
            cancel: CancelToken::new(),
            nodes_searched: 0,
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn into_cache(self) -> TranspositionTable {
        self.transposition_table
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn available_moves(&self) -> &[Move] {
        &self.available_moves
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.config.depth = depth;
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    pub fn cache(&self) -> &TranspositionTable {
        &self.transposition_table
    }

    /// Value of playing `from -> to` for the side to move at the root, or
    /// `None` when that is not a legal move.
    pub fn score(&mut self, from: Position, to: Position) -> Result<Option<i32>, SearchError> {
        let mv = Move::new(from, to);
        if !self.available_moves.contains(&mv) {
            return Ok(None);
        }

        let next = match self.state.apply_move(from, to) {
            Ok(next) => next,
            Err(_) => return Ok(None),
        };
        let score = self.search(&next, -INFINITY, INFINITY, self.config.depth)?;
        trace!(%mv, score, "scored root move");
        Ok(Some(score))
    }

    /// Highest scoring legal move. Ties go to the move found first in board
    /// order.
    pub fn suggest_move(&mut self) -> Result<Option<Move>, SearchError> {
        let mut best: Option<(Move, i32)> = None;

        for mv in self.available_moves.clone() {
            let score = match self.score(mv.from, mv.to)? {
                Some(score) => score,
                None => continue,
            };
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
        }

        debug!(
            best = ?best.map(|(mv, score)| (mv.to_string(), score)),
            nodes = self.nodes_searched,
            cached = self.transposition_table.len(),
            cache_hits = self.transposition_table.hits(),
            "search finished"
        );
        Ok(best.map(|(mv, _)| mv))
    }

    /// Every legal root move with its score, best first.
    pub fn rank_moves(&mut self) -> Result<Vec<(Move, i32)>, SearchError> {
        let mut ranked = Vec::with_capacity(self.available_moves.len());
        for mv in self.available_moves.clone() {
            if let Some(score) = self.score(mv.from, mv.to)? {
                ranked.push((mv, score));
            }
        }
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(ranked)
    }

    /// Negamax with alpha-beta pruning. `alpha` and `beta` are from the point
    /// of view of the side to move in `state`; the returned value is from the
    /// point of view of the side that moved into it.
    pub fn search(
        &mut self,
        state: &State,
        alpha: i32,
        beta: i32,
        depth: u32,
    ) -> Result<i32, SearchError> {
        if self.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        self.nodes_searched += 1;

        let key = state.signature();
        if let Some(score) =
            self.transposition_table
                .probe(&key, depth, alpha, beta, self.config.bound_aware_cache)
        {
            return Ok(score);
        }

        // Remaining depth rewards quick mates and delays being mated
        let bonus = depth as i32;

        if depth == 0 || state.has_no_possible_moves() {
            let score = -self.evaluator.evaluate(state) + bonus;
            self.store(key, depth, score, NodeType::Exact);
            return Ok(score);
        }

        let evaluator = self.evaluator;
        let mut children: Vec<(i32, State)> = state
            .all_possible_moves()
            .iter()
            .filter_map(|mv| state.apply_move(mv.from, mv.to).ok())
            .map(|child| (-evaluator.evaluate(&child) + bonus, child))
            .collect();
        children.sort_by(|a, b| b.0.cmp(&a.0));

        let original_alpha = alpha;
        let mut alpha = alpha;

        for (i, (_, child)) in children.iter().enumerate() {
            let value = if i == 0 {
                let probe = self.search(child, -alpha - 1, -alpha, depth - 1)?;
                if probe > alpha {
                    self.search(child, -beta, -alpha, depth - 1)?
                } else {
                    probe
                }
            } else {
                self.search(child, -beta, -alpha, depth - 1)?
            };

            // Forced mate, no need to look any further
            if value >= MATE_THRESHOLD && value > alpha {
                self.store(key, depth, -value, NodeType::UpperBound);
                return Ok(-value);
            }

            if value >= beta {
                self.store(key, depth, -beta, NodeType::UpperBound);
                return Ok(-beta);
            }

            if value > alpha {
                alpha = value;
            }
        }

        let node_type = if alpha > original_alpha {
            NodeType::Exact
        } else {
            NodeType::LowerBound
        };
        self.store(key, depth, -alpha, node_type);
        Ok(-alpha)
    }

    fn store(&mut self, key: String, depth: u32, score: i32, node_type: NodeType) {
        self.transposition_table.store(
            key,
            TranspositionEntry {
                depth,
                score,
                node_type,
            },
        );
    }
}
