//! fusion-eval - evaluator.
//!
//! Two scalar outputs per placement: a *transient* reward for the
//! placement event itself (clears, spins, combo, time) and an
//! *accumulated* heuristic over the resulting board's shape. Both are
//! dot products of a placement/board observation against a read-only
//! [`Weights`] record — no global mutable state, matching the CC ABI's
//! `CCWeights` field list, split into the two separate channels.

use fusion_core::SpinType;
use fusion_engine::BoardMetrics;

/// Evaluator coefficients. Field types and names follow the CC ABI's
/// `CCWeights` verbatim. `row_transitions` has no dedicated coefficient
/// in that list (see DESIGN.md Open Question resolutions) —
/// `BoardMetrics::row_transitions` is still computed and available to
/// callers that want it, but the accumulated-reward dot product below
/// does not weight it separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Weights {
    pub back_to_back: i32,
    pub bumpiness: i32,
    pub bumpiness_sq: i32,
    pub height: i32,
    pub top_half: i32,
    pub top_quarter: i32,
    pub cavity_cells: i32,
    pub cavity_cells_sq: i32,
    pub overhang_cells: i32,
    pub overhang_cells_sq: i32,
    pub covered_cells: i32,
    pub covered_cells_sq: i32,
    pub tslot: [i32; 4],
    pub well_depth: i32,
    pub max_well_depth: i32,
    pub well_column: [i32; 10],

    pub b2b_clear: i32,
    pub clear1: i32,
    pub clear2: i32,
    pub clear3: i32,
    pub clear4: i32,
    pub tspin1: i32,
    pub tspin2: i32,
    pub tspin3: i32,
    pub mini_tspin1: i32,
    pub mini_tspin2: i32,
    pub perfect_clear: i32,
    pub combo_garbage: i32,
    pub move_time: i32,
    pub wasted_t: i32,

    /// Whether the bag residue should be consulted when speculating.
    pub use_bag: bool,
    /// Scale jeopardy by expected garbage arrival time rather than a flat
    /// per-line term.
    pub timed_jeopardy: bool,
    /// Let perfect-clear sub-search damage estimates feed `combo_garbage`
    /// (consumed by `fusion-search`'s PC sub-search, not by this crate
    /// directly).
    pub stack_pc_damage: bool,
}

impl Weights {
    /// Mirrors `cc_default_weights`: a balanced profile tuned for deep
    /// search.
    pub fn default_weights() -> Self {
        Self {
            back_to_back: 52,
            bumpiness: -24,
            bumpiness_sq: -7,
            height: -39,
            top_half: -150,
            top_quarter: -511,
            cavity_cells: -173,
            cavity_cells_sq: -3,
            overhang_cells: -34,
            overhang_cells_sq: -1,
            covered_cells: -17,
            covered_cells_sq: -1,
            tslot: [8, 148, 192, 407],
            well_depth: 57,
            max_well_depth: 17,
            well_column: [26, 17, 12, 16, 4, 6, 16, 12, 17, 26],

            b2b_clear: 104,
            clear1: -150,
            clear2: -100,
            clear3: -50,
            clear4: 400,
            tspin1: 130,
            tspin2: 400,
            tspin3: 700,
            mini_tspin1: 0,
            mini_tspin2: 100,
            perfect_clear: 999,
            combo_garbage: 150,
            move_time: -3,
            wasted_t: -150,

            use_bag: true,
            timed_jeopardy: true,
            stack_pc_damage: false,
        }
    }

    /// A shallower-search-friendly reduction of [`Self::default_weights`]:
    /// halves the positional/shape terms while leaving the event-driven
    /// terms (clears, spins, PC) untouched, so a shallow search still
    /// chases the same tactical wins per node at lower per-node cost.
    pub fn fast_weights() -> Self {
        let d = Self::default_weights();
        Self {
            bumpiness: d.bumpiness / 2,
            bumpiness_sq: d.bumpiness_sq / 2,
            height: d.height / 2,
            top_half: d.top_half / 2,
            top_quarter: d.top_quarter / 2,
            cavity_cells: d.cavity_cells / 2,
            cavity_cells_sq: d.cavity_cells_sq / 2,
            overhang_cells: d.overhang_cells / 2,
            overhang_cells_sq: d.overhang_cells_sq / 2,
            covered_cells: d.covered_cells / 2,
            covered_cells_sq: d.covered_cells_sq / 2,
            ..d
        }
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::default_weights()
    }
}

/// Observations about the placement event itself, independent of the
/// resulting board shape.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlacementEvent {
    pub lines_cleared: u8,
    pub tspin: SpinType,
    /// Whether `b2b` was already true *before* this placement and the
    /// clear preserves it (a b2b-qualifying clear: tetris or T-spin).
    pub b2b_before: bool,
    /// Combo count *after* this placement (0 if no clear).
    pub combo_after: u32,
    pub path_length: usize,
    pub perfect_clear: bool,
    /// A T piece was locked without producing a T-spin.
    pub wasted_t: bool,
}

/// Sums configured weights for the placement event. Returns a signed
/// score; positive weights reward desirable properties.
pub fn evaluate_transient(event: &PlacementEvent, weights: &Weights) -> i32 {
    let mut score = 0i32;

    score += match event.lines_cleared {
        1 => weights.clear1,
        2 => weights.clear2,
        3 => weights.clear3,
        4 => weights.clear4,
        _ => 0,
    };

    score += match event.tspin {
        SpinType::Full => match event.lines_cleared {
            1 => weights.tspin1,
            2 => weights.tspin2,
            3 => weights.tspin3,
            _ => 0,
        },
        SpinType::Mini => match event.lines_cleared {
            1 => weights.mini_tspin1,
            2 => weights.mini_tspin2,
            _ => 0,
        },
        SpinType::None => 0,
    };

    let is_b2b_clear = event.lines_cleared == 4 || event.tspin != SpinType::None;
    if event.b2b_before && is_b2b_clear && event.lines_cleared > 0 {
        score += weights.b2b_clear;
    }

    if event.perfect_clear {
        score += weights.perfect_clear;
    }

    score += weights.combo_garbage * event.combo_after as i32;
    score += weights.move_time * event.path_length as i32;

    if event.wasted_t {
        score += weights.wasted_t;
    }

    score
}

/// A heuristic over the resulting board. `b2b_now` is the board's b2b
/// status after the placement; `incoming_garbage` and
/// `jeopardy_threshold` feed the risk term.
pub fn evaluate_accumulated(
    metrics: &BoardMetrics,
    weights: &Weights,
    b2b_now: bool,
    incoming_garbage: u32,
    jeopardy_threshold: u8,
    expected_garbage_delay: u32,
) -> i32 {
    let mut score = 0i32;

    score += weights.bumpiness * metrics.bumpiness as i32;
    score += weights.bumpiness_sq * metrics.bumpiness_sq as i32;
    score += weights.height * metrics.max_height as i32;
    score += weights.top_half * metrics.top_half as i32;
    score += weights.top_quarter * metrics.top_quarter as i32;
    score += weights.cavity_cells * metrics.cavity_cells as i32;
    score += weights.cavity_cells_sq * (metrics.cavity_cells * metrics.cavity_cells) as i32;
    score += weights.overhang_cells * metrics.overhang_cells as i32;
    score += weights.overhang_cells_sq * (metrics.overhang_cells * metrics.overhang_cells) as i32;
    score += weights.covered_cells * metrics.covered_cells as i32;
    score += weights.covered_cells_sq * (metrics.covered_cells * metrics.covered_cells) as i32;

    for i in 0..4 {
        score += weights.tslot[i] * metrics.tslot[i] as i32;
    }

    let capped_well = metrics.well_depth.min(weights.max_well_depth.max(0) as u8);
    score += weights.well_depth * capped_well as i32;
    if metrics.well_depth > 0 {
        score += weights.well_column[metrics.well_column];
    }

    if b2b_now {
        score += weights.back_to_back;
    }

    if incoming_garbage > 0 && metrics.heights.iter().any(|&h| h as u32 > u32::from(jeopardy_threshold))
    {
        let jeopardy = if weights.timed_jeopardy {
            incoming_garbage as i32 * -(expected_garbage_delay.max(1) as i32)
        } else {
            incoming_garbage as i32 * -10
        };
        score += jeopardy;
    }

    score
}
