//! Move/plan result types returned by `poll_next_move`/`block_next_move`.

use fusion_core::{Path, Piece, SpinType};

/// Bot-provided diagnostics about the search that produced a move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BotStatistics {
    /// Nodes explored beneath the root that was just advanced past.
    pub nodes_searched: u64,
    /// Depth of the search tree below the old root at publish time.
    pub search_depth: u32,
    /// Where the chosen edge ranked among its siblings (by score,
    /// descending; `0` means it was the top-scoring child) before
    /// descent advanced the root onto it.
    pub original_rank_among_siblings: u32,
}

/// A single placement in a principal-variation plan. `cleared_lines`
/// uses `-1` for absent slots rather than an `Option` array, so the
/// type stays a plain fixed-size record all the way to the FFI
/// boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanPlacement {
    pub piece: Piece,
    pub tspin_status: SpinType,
    pub expected_cells: [(i8, i8); 4],
    pub cleared_lines: [i8; 4],
}

/// A chosen placement and its executable input path. Carries both the
/// legacy `nodes`/`depth`/`original_rank` trio and the newer optional
/// `plan` field simultaneously (DESIGN.md Open Question resolution #1:
/// "union superset", not a guess at which generation of the C API is
/// canonical).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Move {
    /// Whether this move requires holding first: the edge was generated
    /// from the hold-piece branch.
    pub hold: bool,
    pub expected_cells: [(i8, i8); 4],
    pub movements: Path,
    pub statistics: BotStatistics,
    /// Principal-variation sequence of placements from the new root,
    /// when requested.
    pub plan: Option<Vec<PlanPlacement>>,
}

/// Result of `poll_next_move`/`block_next_move`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotPollResult {
    MoveProvided(Move),
    Waiting,
    /// Terminal: every surviving branch tops out, or a worker crashed.
    /// Further requests also return `Dead`.
    Dead,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_without_plan_is_none() {
        let mv = Move {
            hold: false,
            expected_cells: [(0, 0); 4],
            movements: Path::new(),
            statistics: BotStatistics::default(),
            plan: None,
        };
        assert!(mv.plan.is_none());
    }
}
