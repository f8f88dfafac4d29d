//! Worker pool and controller.
//!
//! `std::thread` workers loop {select → expand → evaluate → back-propagate}
//! over a shared [`SearchTree`], preferring `std::sync` primitives over
//! exotic lock-free structures (DESIGN.md); a separate controller thread
//! owns budget enforcement and
//! move publication so a slow worker never blocks a caller's
//! `poll_next_move`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use fusion_core::{GameState, Piece};
use fusion_search::{Node, SearchTree};

use crate::options::Options;
use crate::result::{BotPollResult, BotStatistics, Move, PlanPlacement};

/// How often the controller re-checks budget/readiness when no change
/// has occurred. Short enough that `min_nodes == 0` publishes promptly,
/// long enough not to spin a core just polling an atomic.
const CONTROLLER_TICK: Duration = Duration::from_micros(500);

/// Upper bound on how many plies a principal-variation plan walks before
/// giving up (search depth rarely goes this deep in one request, but the
/// walk must terminate even if it did).
const MAX_PLAN_DEPTH: usize = 64;

struct PendingRequest {
    incoming_garbage: u32,
    /// `tree.node_count()` snapshot at request time, so budget is
    /// evaluated per-request rather than against the tree's lifetime
    /// total: a move request specifies `min_nodes` and `max_nodes`
    /// per-request.
    baseline_nodes: usize,
}

pub(crate) struct Shared {
    pub(crate) tree: SearchTree,
    pub(crate) options: Options,
    stop: AtomicBool,
    dead: AtomicBool,
    pending: Mutex<Option<PendingRequest>>,
    outcome: Mutex<Option<BotPollResult>>,
    cv: Condvar,
}

impl Shared {
    fn new(tree: SearchTree, options: Options) -> Self {
        Self {
            tree,
            options,
            stop: AtomicBool::new(false),
            dead: AtomicBool::new(false),
            pending: Mutex::new(None),
            outcome: Mutex::new(None),
            cv: Condvar::new(),
        }
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire) || self.tree.root().is_terminal()
    }

    pub(crate) fn request_move(&self, incoming_garbage: u32, expected_delay: u32) {
        self.tree.set_pending_garbage(incoming_garbage, expected_delay);
        let baseline_nodes = self.tree.node_count();
        *self.pending.lock().expect("pending lock poisoned") = Some(PendingRequest {
            incoming_garbage,
            baseline_nodes,
        });
    }

    /// Non-blocking: returns the last published outcome, or `Waiting` if
    /// none is ready yet and the bot isn't dead.
    pub(crate) fn poll(&self) -> BotPollResult {
        if self.is_dead() {
            return BotPollResult::Dead;
        }
        let mut outcome = self.outcome.lock().expect("outcome lock poisoned");
        match outcome.take() {
            Some(result) => result,
            None => BotPollResult::Waiting,
        }
    }

    /// Blocking: waits for a publish (move or death).
    pub(crate) fn block(&self) -> BotPollResult {
        if self.is_dead() {
            return BotPollResult::Dead;
        }
        let outcome = self.outcome.lock().expect("outcome lock poisoned");
        let mut outcome = self
            .cv
            .wait_while(outcome, |o| o.is_none() && !self.dead.load(Ordering::Acquire))
            .expect("outcome lock poisoned");
        match outcome.take() {
            Some(result) => result,
            None => BotPollResult::Dead,
        }
    }

    fn reset_scheduler_state(&self) {
        *self.pending.lock().expect("pending lock poisoned") = None;
        *self.outcome.lock().expect("outcome lock poisoned") = None;
        self.dead.store(false, Ordering::Release);
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.cv.notify_all();
    }
}

/// Owns worker and controller thread lifetime, plus the shared tree they
/// operate over.
pub(crate) struct Pool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    controller: Option<JoinHandle<()>>,
}

impl Pool {
    pub(crate) fn launch(initial_state: GameState, config: fusion_search::SearchConfig, options: Options) -> Self {
        let tree = SearchTree::new(initial_state, config);
        let shared = Arc::new(Shared::new(tree, options));

        let threads = shared.options.threads.max(1);
        let mut workers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let worker_shared = Arc::clone(&shared);
            workers.push(thread::spawn(move || worker_loop(worker_shared)));
        }

        let controller_shared = Arc::clone(&shared);
        let controller = Some(thread::spawn(move || controller_loop(controller_shared)));

        Self {
            shared,
            workers,
            controller,
        }
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    pub(crate) fn reset(&self, state: GameState) {
        self.shared.tree.reset(state);
        self.shared.reset_scheduler_state();
    }

    pub(crate) fn add_next_piece(&self, piece: Piece) {
        self.shared.tree.add_next_piece(piece);
    }

    /// `destroy()`: signal workers to stop and join them.
    /// Draining the request channel is implicit — `pending`/`outcome`
    /// are dropped with `Shared` once every `Arc` clone (including the
    /// ones the now-joined threads held) goes away.
    pub(crate) fn destroy(mut self) {
        self.shared.stop();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(controller) = self.controller.take() {
            let _ = controller.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    while !shared.stop.load(Ordering::Acquire) {
        let expanded = shared.tree.think_once();
        if !expanded {
            // No expandable frontier right now (queue lacks pieces and
            // speculation cannot bridge, or a reset just landed): don't
            // spin a core re-selecting the same dead end.
            thread::sleep(CONTROLLER_TICK);
        }
    }
}

fn controller_loop(shared: Arc<Shared>) {
    while !shared.stop.load(Ordering::Acquire) {
        let request = {
            let guard = shared.pending.lock().expect("pending lock poisoned");
            guard
                .as_ref()
                .map(|r| (r.baseline_nodes, r.incoming_garbage))
        };

        if let Some((baseline_nodes, incoming_garbage)) = request {
            if let Some(outcome) = try_publish(&shared, baseline_nodes, incoming_garbage) {
                *shared.pending.lock().expect("pending lock poisoned") = None;
                if matches!(outcome, BotPollResult::Dead) {
                    shared.dead.store(true, Ordering::Release);
                }
                *shared.outcome.lock().expect("outcome lock poisoned") = Some(outcome);
                shared.cv.notify_all();
                continue;
            }
        }
        thread::sleep(CONTROLLER_TICK);
    }
}

/// Returns `Some(outcome)` once the request is ready to publish, or
/// `None` to keep waiting.
fn try_publish(shared: &Shared, baseline_nodes: usize, incoming_garbage: u32) -> Option<BotPollResult> {
    let root = shared.tree.root();
    if root.is_terminal() {
        return Some(BotPollResult::Dead);
    }
    // A speculative root means the next piece to place isn't known yet
    // (the queue is empty and hold can't resolve it either) — there is
    // no concrete move to publish regardless of budget.
    if root.is_speculative() || !root.is_expanded() {
        return None;
    }
    let edges = root.children_snapshot()?;
    if edges.is_empty() {
        return Some(BotPollResult::Dead);
    }

    let min_nodes = shared.options.min_nodes;
    let max_nodes = shared.options.max_nodes.max(min_nodes);
    let expanded_since = (shared.tree.node_count().saturating_sub(baseline_nodes)) as u64;
    if expanded_since < min_nodes.min(max_nodes) {
        return None;
    }

    let _ = incoming_garbage; // already recorded on the tree by request_move
    Some(publish_move(shared, &root, &edges))
}

fn publish_move(shared: &Shared, root: &Node, edges: &[fusion_search::Edge]) -> BotPollResult {
    let best_index = root.best_edge_index().expect("edges non-empty, checked by caller");
    let chosen = edges[best_index].clone();

    let nodes_searched = shared.tree.node_count() as u64;
    let search_depth = plan_depth(&chosen.child);
    let original_rank_among_siblings = rank_among_siblings(edges, best_index);

    let plan = Some(build_plan(&chosen.child));

    let mv = Move {
        hold: chosen.hold_used,
        expected_cells: chosen.placement.cells(),
        movements: chosen.placement.path,
        statistics: BotStatistics {
            nodes_searched,
            search_depth,
            original_rank_among_siblings,
        },
        plan,
    };

    shared.tree.advance_root(best_index);
    BotPollResult::MoveProvided(mv)
}

/// Where `edges[chosen_index]` ranks among its siblings, sorted by
/// `transient + child.value` descending (feeds
/// `original_rank_among_siblings`); `0` means it was already the
/// top-scoring child.
fn rank_among_siblings(edges: &[fusion_search::Edge], chosen_index: usize) -> u32 {
    let chosen_score = edges[chosen_index].transient_reward as i64 + edges[chosen_index].child.value();
    let better = edges
        .iter()
        .filter(|e| e.transient_reward as i64 + e.child.value() > chosen_score)
        .count();
    better as u32
}

fn plan_depth(start: &Node) -> u32 {
    let mut depth = 0u32;
    let mut current = start.clone();
    while depth < MAX_PLAN_DEPTH as u32 {
        match current.selected_edge() {
            Some(edge) => {
                current = edge.child;
                depth += 1;
            }
            None => break,
        }
    }
    depth
}

fn build_plan(start: &Node) -> Vec<PlanPlacement> {
    let mut plan = Vec::new();
    let mut current = start.clone();
    for _ in 0..MAX_PLAN_DEPTH {
        let Some(edge) = current.selected_edge() else {
            break;
        };
        plan.push(PlanPlacement {
            piece: edge.placement.piece,
            tspin_status: edge.placement.tspin,
            expected_cells: edge.placement.cells(),
            cleared_lines: cleared_lines_of(&edge),
        });
        current = edge.child;
    }
    plan
}

/// Reconstructs which rows the placement cleared from the edge's child
/// state: any row at or below the placement's highest cell that reads
/// empty in the child board but would have been occupied by the
/// placement is one the lock cleared. `-1` fills absent slots in
/// `PlanPlacement::cleared_lines`.
fn cleared_lines_of(edge: &fusion_search::Edge) -> [i8; 4] {
    let mut out = [-1i8; 4];
    let rows_touched: std::collections::BTreeSet<i8> =
        edge.placement.cells().iter().map(|&(_, y)| y).collect();
    let child_board = edge.child.state().board;
    let mut i = 0usize;
    for &y in rows_touched.iter() {
        if i >= 4 {
            break;
        }
        if y < 0 {
            continue;
        }
        let row_now_empty =
            (0..fusion_core::Board::WIDTH).all(|x| !child_board.get(x, y as usize));
        // A row the placement touched that reads back empty after the
        // lock was either cleared, or (for rows above the clear) shifted
        // down by an earlier clear; both cases correctly signal "this
        // row's original content is gone", the caller-relevant fact for
        // a plan preview.
        if row_now_empty {
            out[i] = y;
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::Piece;
    use fusion_search::SearchConfig;

    fn opts() -> Options {
        Options {
            min_nodes: 1,
            max_nodes: 50,
            threads: 1,
            ..Options::default_options()
        }
    }

    #[test]
    fn test_pool_publishes_a_move_for_a_simple_request() {
        let state = GameState::with_queue([Piece::T, Piece::O, Piece::I]);
        let pool = Pool::launch(state, SearchConfig::default(), opts());
        pool.shared().request_move(0, 1);

        let mut result = BotPollResult::Waiting;
        for _ in 0..2000 {
            result = pool.shared().poll();
            if !matches!(result, BotPollResult::Waiting) {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert!(matches!(result, BotPollResult::MoveProvided(_)));
        pool.destroy();
    }

    #[test]
    fn test_topped_out_root_is_dead() {
        let mut board = fusion_core::Board::new();
        for x in 0..fusion_core::Board::WIDTH {
            board.set(x, 20, true);
        }
        let mut state = GameState::with_queue([Piece::T]);
        state.board = board;
        let pool = Pool::launch(state, SearchConfig::default(), opts());
        pool.shared().request_move(0, 1);

        let mut result = BotPollResult::Waiting;
        for _ in 0..500 {
            result = pool.shared().poll();
            if !matches!(result, BotPollResult::Waiting) {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(result, BotPollResult::Dead);
        pool.destroy();
    }
}
