use std::collections::{HashMap, VecDeque};

/// What a stored score says about the true value. Scores are kept exactly as
/// the search returns them, i.e. from the point of view of the side that moved
/// into the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Exact,
    /// The true value is at most the stored score (a fail-high cutoff).
    UpperBound,
    /// The true value is at least the stored score (every move failed low).
    LowerBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspositionEntry {
    pub depth: u32,
    pub score: i32,
    pub node_type: NodeType,
}

/// Signature-keyed score cache with a fixed capacity. When full, the entry
/// inserted first is evicted.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    table: HashMap<String, TranspositionEntry>,
    order: VecDeque<String>,
    size: usize,
    hits: u64,
}

impl TranspositionTable {
    pub fn new(size: usize) -> Self {
        Self {
            table: HashMap::new(),
            order: VecDeque::new(),
            size,
            hits: 0,
        }
    }

    pub fn store(&mut self, key: String, entry: TranspositionEntry) {
        if self.size == 0 {
            return;
        }
        if let Some(existing) = self.table.get_mut(&key) {
            *existing = entry;
            return;
        }

        while self.table.len() >= self.size {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.table.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.table.insert(key, entry);
    }

    /// Looks up a score searched at least `depth` plies deep. With
    /// `bound_aware` unset any such entry is reused as if it were exact;
    /// otherwise bounds are only reused when they decide the window
    /// `[alpha, beta]` the position is about to be searched with.
    pub fn probe(
        &mut self,
        key: &str,
        depth: u32,
        alpha: i32,
        beta: i32,
        bound_aware: bool,
    ) -> Option<i32> {
        let entry = *self.table.get(key)?;
        if entry.depth < depth {
            return None;
        }

        let usable = !bound_aware
            || match entry.node_type {
                NodeType::Exact => true,
                NodeType::UpperBound => -entry.score >= beta,
                NodeType::LowerBound => -entry.score <= alpha,
            };
        if usable {
            self.hits += 1;
            Some(entry.score)
        } else {
            None
        }
    }

    pub fn get(&self, key: &str) -> Option<&TranspositionEntry> {
        self.table.get(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.size
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.order.clear();
        self.hits = 0;
    }
}
