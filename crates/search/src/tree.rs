//! The concurrent best-first search tree.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use fusion_core::{GameState, Piece, SpawnRule};
use fusion_engine::{apply::lock as engine_lock, board_metrics, generate_placements, MovementMode};
use fusion_eval::{evaluate_accumulated, evaluate_transient, PlacementEvent, Weights};

use crate::hash::state_hash;
use crate::node::{Children, Edge, Node};
use crate::pc;

/// Perfect-clear sub-search mode, set via `Options::pc_priority`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PcPriority {
    #[default]
    Off,
    Fastest,
    Attack,
}

/// Everything the search tree needs to expand a node, independent of the
/// scheduler-level concerns (thread count, node budget) that live in
/// `fusion-bot::Options`.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub movement_mode: MovementMode,
    pub spawn_rule: SpawnRule,
    pub use_hold: bool,
    pub speculate: bool,
    pub pc_priority: PcPriority,
    pub weights: Weights,
    /// Lowest-column height (in cells) above which jeopardy weighting
    /// engages: risk if `incoming_garbage > 0` and the lowest column
    /// exceeds this threshold.
    pub jeopardy_threshold: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            movement_mode: MovementMode::ZeroG,
            spawn_rule: SpawnRule::Row19Or20,
            use_hold: true,
            speculate: true,
            pc_priority: PcPriority::Off,
            weights: Weights::default_weights(),
            jeopardy_threshold: 15,
        }
    }
}

/// The shared, concurrently-expandable search tree.
/// `root` is guarded by its own mutex so `advance_root` can swap it
/// atomically with respect to readers taking a snapshot; per-node
/// children/value locking is handled by [`Node`] itself.
pub struct SearchTree {
    root: Mutex<Node>,
    config: SearchConfig,
    /// Transposition table: interns nodes by state hash within the
    /// current generation so equal states share one node — a node may
    /// have multiple parents.
    table: Mutex<FxHashMap<u64, Node>>,
    epoch: AtomicU64,
    pending_garbage: AtomicU32,
    /// Expected delay (in pieces) before `pending_garbage` lands, used by
    /// the `timed_jeopardy` weight flag.
    expected_garbage_delay: AtomicU32,
}

impl SearchTree {
    pub fn new(initial_state: GameState, config: SearchConfig) -> Self {
        let hash = state_hash(&initial_state);
        let terminal = initial_state.board.is_topped_out();
        let metrics = board_metrics(&initial_state.board);
        let leaf_value = evaluate_accumulated(
            &metrics,
            &config.weights,
            initial_state.b2b,
            0,
            config.jeopardy_threshold,
            1,
        ) as i64;
        let root = Node::new(initial_state, hash, leaf_value, terminal);

        let mut table = FxHashMap::default();
        table.insert(hash, root.clone());

        Self {
            root: Mutex::new(root),
            config,
            table: Mutex::new(table),
            epoch: AtomicU64::new(0),
            pending_garbage: AtomicU32::new(0),
            expected_garbage_delay: AtomicU32::new(1),
        }
    }

    pub fn root(&self) -> Node {
        self.root.lock().expect("root lock poisoned").clone()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub fn set_pending_garbage(&self, lines: u32, expected_delay: u32) {
        self.pending_garbage.store(lines, Ordering::Relaxed);
        self.expected_garbage_delay
            .store(expected_delay.max(1), Ordering::Relaxed);
    }

    /// One worker think-cycle: select, expand, evaluate, back-propagate.
    /// Returns whether a node was actually expanded (for node-count
    /// accounting).
    pub fn think_once(&self) -> bool {
        let leaf = self.select();
        if leaf.is_terminal() || leaf.is_expanded() {
            leaf.record_visit();
            return false;
        }
        self.expand(&leaf);
        leaf.record_visit();
        true
    }

    /// Forward pass: descend from root choosing the best edge, stopping
    /// at an unexpanded node or a terminal node. `select_child` treats
    /// `Speculative` nodes like `Known` ones
    /// (DESIGN.md Open Question resolution #5) so a still-unresolved
    /// next piece doesn't stall the search at that depth.
    fn select(&self) -> Node {
        let mut current = self.root();
        loop {
            if current.is_terminal() || !current.is_expanded() {
                return current;
            }
            match current.select_child() {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Expand a leaf: generate every placement for the next piece to
    /// place (and the hold alternative, if applicable), lock each into a
    /// child state, evaluate, and attach edges.
    fn expand(&self, leaf: &Node) {
        let state = leaf.state();
        if state.current_piece().is_none() {
            if self.config.speculate && !state.bag_mask.is_empty() {
                self.expand_speculative(leaf, &state);
            } else {
                leaf.set_children(Children::Known(Vec::new()));
            }
        } else {
            let edges = self.generate_edges(&state, leaf);
            leaf.set_children(Children::Known(edges));
        }
        leaf.backpropagate();

        if self.config.pc_priority != PcPriority::Off {
            pc::probe(leaf, &self.config);
        }
    }

    /// Each bag-residue piece gets its own independent subtree of
    /// placements to generate and evaluate; fanned out with `rayon`,
    /// since the buckets don't interact, only the shared transposition
    /// table and parent back-links, both already lock-guarded.
    fn expand_speculative(&self, leaf: &Node, state: &GameState) {
        let pieces: Vec<Piece> = state.bag_mask.iter().collect();
        let buckets: Vec<(Piece, Vec<Edge>)> = pieces
            .into_par_iter()
            .map(|piece| {
                let mut bucket_state = state.clone();
                bucket_state.push_piece(piece);
                let edges = self.generate_edges(&bucket_state, leaf);
                (piece, edges)
            })
            .collect();
        leaf.set_children(Children::Speculative(buckets));
    }

    /// Generate both "current piece" and "hold" branches of children for
    /// `state`, deduping resulting states against the transposition table.
    fn generate_edges(&self, state: &GameState, parent: &Node) -> Vec<Edge> {
        let parent_weak = parent.downgrade();
        let skip_hold = !self.config.use_hold
            || (state.hold == state.current_piece() && state.hold.is_some());

        // The current-piece and hold-piece branches touch disjoint parts
        // of the placement/evaluation work and share only the
        // already-lock-guarded transposition table, so they fan out via
        // `rayon::join` rather than running serially.
        let (mut edges, hold_edges) = rayon::join(
            || {
                let mut out = Vec::new();
                self.generate_edges_for_choice(state, false, &parent_weak, &mut out);
                out
            },
            || {
                let mut out = Vec::new();
                if !skip_hold {
                    self.generate_edges_for_choice(state, true, &parent_weak, &mut out);
                }
                out
            },
        );
        edges.extend(hold_edges);
        edges
    }

    fn generate_edges_for_choice(
        &self,
        state: &GameState,
        use_hold_choice: bool,
        parent_weak: &crate::node::WeakNode,
        out: &mut Vec<Edge>,
    ) {
        let Some((piece, new_hold, new_next)) = resolve_piece_choice(state, use_hold_choice)
        else {
            return;
        };

        for placement in generate_placements(
            &state.board,
            piece,
            self.config.movement_mode,
            self.config.spawn_rule,
        ) {
            let (new_board, lines, tspin) = engine_lock(&state.board, &placement);
            let new_combo = if lines > 0 { state.combo + 1 } else { 0 };
            let qualifies_b2b = lines == 4 || tspin != fusion_core::SpinType::None;
            let new_b2b = if lines > 0 { qualifies_b2b } else { state.b2b };
            let perfect_clear = new_board.is_empty();
            let wasted_t = piece == Piece::T && tspin == fusion_core::SpinType::None;

            let event = PlacementEvent {
                lines_cleared: lines,
                tspin,
                b2b_before: state.b2b,
                combo_after: new_combo,
                path_length: placement.path.len(),
                perfect_clear,
                wasted_t,
            };
            let transient = evaluate_transient(&event, &self.config.weights);

            let metrics = board_metrics(&new_board);
            let incoming_garbage = self.pending_garbage.load(Ordering::Relaxed);
            let expected_delay = self.expected_garbage_delay.load(Ordering::Relaxed);
            let accumulated = evaluate_accumulated(
                &metrics,
                &self.config.weights,
                new_b2b,
                incoming_garbage,
                self.config.jeopardy_threshold,
                expected_delay,
            );

            let new_state = GameState {
                board: new_board,
                hold: new_hold,
                next: new_next.clone(),
                bag_mask: state.bag_mask,
                b2b: new_b2b,
                combo: new_combo,
            };
            let terminal = new_state.board.is_topped_out();
            let hash = state_hash(&new_state);

            let child = self.intern(hash, new_state, accumulated as i64, terminal);
            let edge_index = out.len();
            child.add_parent(parent_weak.clone(), edge_index);
            out.push(Edge {
                placement,
                hold_used: use_hold_choice,
                child,
                transient_reward: transient,
            });
        }
    }

    fn intern(&self, hash: u64, state: GameState, leaf_value: i64, terminal: bool) -> Node {
        let mut table = self.table.lock().expect("transposition table poisoned");
        if let Some(existing) = table.get(&hash) {
            if existing.state() == state {
                return existing.clone();
            }
        }
        let node = Node::new(state, hash, leaf_value, terminal);
        table.insert(hash, node.clone());
        node
    }

    /// Advance the root to the child of edge `edge_index`: the chosen
    /// subtree becomes the whole tree; everything else is dropped and,
    /// via the rebuilt
    /// transposition table, reclaimed.
    pub fn advance_root(&self, edge_index: usize) -> Option<Edge> {
        let current_root = self.root();
        let edges = current_root.children_snapshot()?;
        let edge = edges.get(edge_index)?.clone();

        *self.root.lock().expect("root lock poisoned") = edge.child.clone();
        self.rebuild_table_from(&edge.child);
        self.epoch.fetch_add(1, Ordering::AcqRel);
        Some(edge)
    }

    /// Replace the table with only nodes reachable from `new_root`,
    /// dropping strong references to everything else so unreachable
    /// nodes are reclaimed once their last `Arc` goes away.
    fn rebuild_table_from(&self, new_root: &Node) {
        let mut table = FxHashMap::default();
        let mut queue = VecDeque::new();
        queue.push_back(new_root.clone());
        while let Some(node) = queue.pop_front() {
            let hash = node.state_hash();
            if table.contains_key(&hash) {
                continue;
            }
            table.insert(hash, node.clone());
            if let Some(edges) = node.children_snapshot() {
                for edge in edges {
                    queue.push_back(edge.child);
                }
            }
        }
        *self.table.lock().expect("transposition table poisoned") = table;
    }

    /// Count of interned nodes reachable from the current root (an
    /// approximation of "nodes explored beneath the root" for
    /// `BotStatistics::nodes_searched`).
    pub fn node_count(&self) -> usize {
        self.table.lock().expect("transposition table poisoned").len()
    }

    /// `reset`: replace the whole tree with a fresh root built from
    /// `state`.
    pub fn reset(&self, state: GameState) {
        let hash = state_hash(&state);
        let terminal = state.board.is_topped_out();
        let metrics = board_metrics(&state.board);
        let leaf_value = evaluate_accumulated(
            &metrics,
            &self.config.weights,
            state.b2b,
            0,
            self.config.jeopardy_threshold,
            1,
        ) as i64;
        let root = Node::new(state, hash, leaf_value, terminal);

        let mut table = FxHashMap::default();
        table.insert(hash, root.clone());

        *self.root.lock().expect("root lock poisoned") = root;
        *self.table.lock().expect("transposition table poisoned") = table;
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// `add_next_piece`: reveal a piece into the queue.
    /// Pushes the piece onto every materialized node's own queue
    /// snapshot and collapses any speculative node whose bucket matches:
    /// collapse replaces the speculative variant with the matching
    /// known bucket.
    pub fn add_next_piece(&self, piece: Piece) {
        let root = self.root();
        Self::propagate_new_piece(&root, piece);
    }

    fn propagate_new_piece(node: &Node, piece: Piece) {
        if node.is_terminal() {
            return;
        }
        if node.collapse_speculative(piece).is_some() {
            node.backpropagate();
        } else {
            node.push_piece(piece);
        }
        if let Some(edges) = node.children_snapshot() {
            for edge in edges {
                Self::propagate_new_piece(&edge.child, piece);
            }
        }
    }
}

/// Resolve which piece gets placed for a given use-hold choice, and the
/// resulting hold/next: either the head of `next`, or the hold piece.
/// Standard guideline swap semantics: the current piece
/// moves into hold; if hold was previously empty, the *next* queue item
/// becomes the piece actually placed.
fn resolve_piece_choice(
    state: &GameState,
    use_hold: bool,
) -> Option<(Piece, Option<Piece>, std::collections::VecDeque<Piece>)> {
    let mut next = state.next.clone();
    if !use_hold {
        let piece = next.pop_front()?;
        Some((piece, state.hold, next))
    } else {
        let current = next.pop_front()?;
        match state.hold {
            Some(h) => Some((h, Some(current), next)),
            None => {
                let piece = next.pop_front()?;
                Some((piece, Some(current), next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::Piece;

    fn config() -> SearchConfig {
        SearchConfig {
            speculate: false,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_expand_generates_children_for_known_piece() {
        let state = GameState::with_queue([Piece::T]);
        let tree = SearchTree::new(state, config());
        assert!(tree.think_once());
        assert!(tree.root().is_expanded());
        assert!(!tree.root().children_snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_select_stops_at_unexpanded_leaf() {
        let state = GameState::with_queue([Piece::T, Piece::O]);
        let tree = SearchTree::new(state, config());
        // First cycle expands the root; second should descend one level
        // and expand a child instead of re-expanding root.
        assert!(tree.think_once());
        let root_value_after_first = tree.root().value();
        assert!(tree.think_once());
        // Expanding a grandchild can only raise (or hold) the root's
        // backed-up value, never lower it.
        assert!(tree.root().value() >= root_value_after_first);
    }

    #[test]
    fn test_advance_root_prunes_other_children() {
        let state = GameState::with_queue([Piece::T]);
        let tree = SearchTree::new(state, config());
        tree.think_once();
        let edges = tree.root().children_snapshot().unwrap();
        assert!(edges.len() > 1);
        let chosen = edges[0].child.clone();
        let edge = tree.advance_root(0).unwrap();
        assert!(edge.child.ptr_eq(&chosen));
        assert!(tree.root().ptr_eq(&chosen));
    }

    #[test]
    fn test_speculative_expansion_has_one_bucket_per_bag_piece() {
        let state = GameState::new();
        let mut cfg = config();
        cfg.speculate = true;
        let tree = SearchTree::new(state, cfg);
        tree.think_once();
        assert!(tree.root().is_speculative());
    }

    #[test]
    fn test_topped_out_board_yields_terminal_root() {
        let mut board = fusion_core::Board::new();
        for x in 0..fusion_core::Board::WIDTH {
            board.set(x, 20, true);
        }
        let mut state = GameState::with_queue([Piece::T]);
        state.board = board;
        let tree = SearchTree::new(state, config());
        assert!(tree.root().is_terminal());
        assert!(!tree.think_once());
    }
}
