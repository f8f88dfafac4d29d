//! Bounded perfect-clear sub-search, gated by `Options::pc_priority`.
//!
//! A depth-first search over upcoming pieces (and the hold swap) that
//! backtracks with [`fusion_engine::unapply_mut`] rather than cloning the
//! board per node, in an undo-based search style. Independent of the
//! main best-first tree: the caller decides
//! when to run it (typically once per `request_move`, from the current
//! root) rather than on every node expansion, since it is depth-bounded
//! and comparatively expensive per call.

use std::collections::VecDeque;

use fusion_core::{Board, GameState, Piece, Placement, SpawnRule};
use fusion_engine::{apply_mut, generate_placements, unapply_mut};

use crate::node::Node;
use crate::tree::{PcPriority, SearchConfig};

/// Upper bound on how many upcoming pieces the PC search is willing to
/// commit to; beyond this the search space is too large to explore
/// exhaustively within a single think cycle.
const MAX_PC_DEPTH: usize = 11;

/// Value floor applied to a leaf whose state has a guaranteed
/// perfect-clear continuation: a very large positive reward. Chosen
/// well above any realistic sum of
/// [`fusion_eval::Weights::perfect_clear`] across a few placements so a
/// confirmed PC line always outranks ordinary play.
const PC_FOUND_FLOOR: i64 = 1_000_000;

/// Extra floor per line cleared along the way, consulted only in
/// `attack` mode so a higher-damage PC sequence outranks a faster but
/// lower-damage one once both clear the base floor.
const PC_ATTACK_LINE_BONUS: i64 = 1_000;

/// Probe a newly-expanded leaf's state for a perfect-clear continuation
/// and, if one exists, short-circuit its evaluator value. A no-op when
/// `pc_priority` is `Off`, the
/// state is already empty, or no plan is found within
/// [`MAX_PC_DEPTH`]/the remaining queue length.
pub fn probe(leaf: &Node, config: &SearchConfig) {
    if config.pc_priority == PcPriority::Off {
        return;
    }
    let state = leaf.state();
    if state.board.is_empty() {
        return;
    }
    let available = state.next.len() + usize::from(config.use_hold && state.hold.is_some());
    if available == 0 {
        return;
    }

    if let Some(result) = search(&state, config, available) {
        let mut floor = PC_FOUND_FLOOR;
        if config.pc_priority == PcPriority::Attack {
            floor += PC_ATTACK_LINE_BONUS * result.lines_cleared as i64;
        }
        if leaf.boost_value(floor) {
            leaf.backpropagate();
        }
    }
}

/// One placement of a found perfect-clear plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcPlan {
    pub placement: Placement,
    pub hold_used: bool,
}

/// Result of a successful perfect-clear search. "Fastest" priority
/// minimizes piece count; "attack" priority maximizes total lines
/// cleared across the plan before the board goes empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcSearchResult {
    pub plan: Vec<PcPlan>,
    pub lines_cleared: u32,
}

/// Search for a perfect clear starting from `state`, trying at most
/// `max_pieces` placements. Returns `None` if priority is `Off` or no
/// plan was found within the depth bound.
pub fn search(state: &GameState, config: &SearchConfig, max_pieces: usize) -> Option<PcSearchResult> {
    if config.pc_priority == PcPriority::Off {
        return None;
    }
    let max_pieces = max_pieces.min(MAX_PC_DEPTH);

    let mut board = state.board.clone();
    let mut queue: VecDeque<Piece> = state.next.clone();
    let mut hold = state.hold;
    let mut plan = Vec::new();
    let mut best: Option<PcSearchResult> = None;

    dfs(
        &mut board,
        &mut queue,
        &mut hold,
        &mut plan,
        0,
        max_pieces,
        config.spawn_rule,
        config.pc_priority,
        &mut best,
    );
    best
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    board: &mut Board,
    queue: &mut VecDeque<Piece>,
    hold: &mut Option<Piece>,
    plan: &mut Vec<(Placement, bool, u32)>,
    lines_so_far: u32,
    max_pieces: usize,
    spawn_rule: SpawnRule,
    priority: PcPriority,
    best: &mut Option<PcSearchResult>,
) {
    if board.is_empty() && !plan.is_empty() {
        let candidate = PcSearchResult {
            plan: plan
                .iter()
                .map(|(placement, hold_used, _)| PcPlan {
                    placement: *placement,
                    hold_used: *hold_used,
                })
                .collect(),
            lines_cleared: lines_so_far,
        };
        let better = match best {
            None => true,
            Some(existing) => match priority {
                PcPriority::Fastest | PcPriority::Off => candidate.plan.len() < existing.plan.len(),
                PcPriority::Attack => {
                    candidate.lines_cleared > existing.lines_cleared
                        || (candidate.lines_cleared == existing.lines_cleared
                            && candidate.plan.len() < existing.plan.len())
                }
            },
        };
        if better {
            *best = Some(candidate);
        }
        // Fastest mode: the first (shallowest, by DFS depth order) plan
        // at this depth is as good as any other at the same depth, so
        // there's no need to keep searching siblings once one is found
        // at the current piece count. Attack mode keeps exploring in
        // case a deeper plan clears more total lines.
        if priority == PcPriority::Fastest {
            return;
        }
    }
    if plan.len() >= max_pieces || queue.is_empty() {
        return;
    }

    for use_hold in [false, true] {
        // Mirrors `tree::resolve_piece_choice`'s swap semantics: holding
        // with an empty hold swaps the head of the queue into hold and
        // plays the piece behind it; holding with a full hold swaps the
        // held piece in for the head.
        let prior_hold = *hold;
        let piece = if use_hold {
            let swapped_in = queue.pop_front();
            let Some(swapped_in) = swapped_in else {
                continue;
            };
            match prior_hold {
                Some(h) => {
                    *hold = Some(swapped_in);
                    h
                }
                None => {
                    let Some(p) = queue.pop_front() else {
                        queue.push_front(swapped_in);
                        continue;
                    };
                    *hold = Some(swapped_in);
                    p
                }
            }
        } else {
            let Some(p) = queue.pop_front() else {
                continue;
            };
            p
        };

        for placement in generate_placements(board, piece, fusion_engine::MovementMode::ZeroG, spawn_rule) {
            let undo = apply_mut(board, &placement);
            let lines = undo.lines_cleared() as u32;
            plan.push((placement, use_hold, lines));
            dfs(
                board,
                queue,
                hold,
                plan,
                lines_so_far + lines,
                max_pieces,
                spawn_rule,
                priority,
                best,
            );
            plan.pop();
            unapply_mut(board, &undo);
        }

        // Undo the queue/hold rotation in the reverse order it was applied.
        *hold = prior_hold;
        if use_hold {
            match prior_hold {
                Some(_) => queue.push_front(piece),
                None => {
                    queue.push_front(piece);
                    queue.push_front(hold.unwrap_or(piece));
                }
            }
        } else {
            queue.push_front(piece);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::Piece;

    fn config(priority: PcPriority) -> SearchConfig {
        SearchConfig {
            pc_priority: priority,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_off_priority_returns_none() {
        let state = GameState::with_queue([Piece::O; 4]);
        assert!(search(&state, &config(PcPriority::Off), 4).is_none());
    }

    #[test]
    fn test_no_plan_within_depth_returns_none() {
        let state = GameState::with_queue([Piece::S]);
        let result = search(&state, &config(PcPriority::Fastest), 1);
        assert!(result.is_none());
    }

    #[test]
    fn test_probe_boosts_leaf_with_guaranteed_pc() {
        // A single O piece on an otherwise-empty two-column board clears
        // both rows and empties the board: a trivial one-piece PC.
        let mut board = Board::new();
        for x in 2..Board::WIDTH {
            board.set(x, 0, true);
            board.set(x, 1, true);
        }
        let mut state = GameState::with_queue([Piece::O]);
        state.board = board;
        let leaf = Node::new(state, 0, 0, false);
        probe(&leaf, &config(PcPriority::Fastest));
        assert!(leaf.value() >= PC_FOUND_FLOOR);
    }

    #[test]
    fn test_probe_is_noop_when_priority_off() {
        let state = GameState::with_queue([Piece::O]);
        let leaf = Node::new(state, 0, 0, false);
        probe(&leaf, &config(PcPriority::Off));
        assert_eq!(leaf.value(), 0);
    }
}
