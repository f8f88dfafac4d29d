//! Board metrics: pure heuristic inputs consumed by `fusion-eval`.

use fusion_core::Board;

/// Per-column heights plus the aggregate shape metrics the evaluator's
/// accumulated-reward term sums over. All fields are pure functions of
/// the board; nothing here depends on piece history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoardMetrics {
    pub heights: [u8; Board::WIDTH],
    /// Empty cells below the column's height (a filled-over gap). Named
    /// `cavity` rather than `hole` to avoid ambiguity with the per-column
    /// `overhang`/`covered` splits below.
    pub cavity_cells: u32,
    /// Filled cells with an empty cell directly below them.
    pub overhang_cells: u32,
    /// Empty cells with at least one filled cell above them in the
    /// column.
    pub covered_cells: u32,
    pub row_transitions: u32,
    pub bumpiness: u32,
    pub bumpiness_sq: u32,
    pub max_height: u8,
    pub top_half: u32,
    pub top_quarter: u32,
    /// Depth of the deepest single-column well.
    pub well_depth: u8,
    pub well_column: usize,
    /// Shallow single (TSS), shallow double, deep double-or-triple, and
    /// triple-TSD slot counts, in that order.
    pub tslot: [u32; 4],
}

const TOP_HALF_ROW: usize = Board::VISIBLE_HEIGHT / 2;
const TOP_QUARTER_ROW: usize = Board::VISIBLE_HEIGHT - Board::VISIBLE_HEIGHT / 4;

pub fn board_metrics(board: &Board) -> BoardMetrics {
    let mut heights = [0u8; Board::WIDTH];
    for (x, height) in heights.iter_mut().enumerate() {
        *height = column_height(board, x);
    }

    let max_height = *heights.iter().max().unwrap_or(&0);

    let mut cavity_cells = 0u32;
    let mut overhang_cells = 0u32;
    let mut covered_cells = 0u32;
    for x in 0..Board::WIDTH {
        let h = heights[x] as usize;
        let mut seen_filled_above = false;
        for y in (0..h).rev() {
            let filled = board.get(x, y);
            if !filled {
                cavity_cells += 1;
                if seen_filled_above {
                    covered_cells += 1;
                }
            } else {
                seen_filled_above = true;
                if y > 0 && !board.get(x, y - 1) {
                    overhang_cells += 1;
                }
            }
        }
    }

    let row_transitions = row_transitions(board, max_height);

    let mut bumpiness = 0u32;
    for x in 0..Board::WIDTH - 1 {
        bumpiness += (heights[x] as i32 - heights[x + 1] as i32).unsigned_abs();
    }
    let bumpiness_sq = {
        let mut sq = 0u32;
        for x in 0..Board::WIDTH - 1 {
            let diff = (heights[x] as i32 - heights[x + 1] as i32).unsigned_abs();
            sq += diff * diff;
        }
        sq
    };

    let mut top_half = 0u32;
    let mut top_quarter = 0u32;
    for x in 0..Board::WIDTH {
        for y in TOP_HALF_ROW..Board::VISIBLE_HEIGHT {
            if board.get(x, y) {
                top_half += 1;
            }
        }
        for y in TOP_QUARTER_ROW..Board::VISIBLE_HEIGHT {
            if board.get(x, y) {
                top_quarter += 1;
            }
        }
    }

    let (well_depth, well_column) = deepest_well(&heights);
    let tslot = tslot_counts(&heights);

    BoardMetrics {
        heights,
        cavity_cells,
        overhang_cells,
        covered_cells,
        row_transitions,
        bumpiness,
        bumpiness_sq,
        max_height,
        top_half,
        top_quarter,
        well_depth,
        well_column,
        tslot,
    }
}

fn column_height(board: &Board, x: usize) -> u8 {
    for y in (0..Board::HEIGHT).rev() {
        if board.get(x, y) {
            return (y + 1) as u8;
        }
    }
    0
}

/// Transitions between filled/empty cells along each row up to the
/// tallest column, treating the board edges as filled walls.
fn row_transitions(board: &Board, max_height: u8) -> u32 {
    let mut transitions = 0u32;
    for y in 0..(max_height as usize).max(1) {
        let mut prev = true;
        for x in 0..Board::WIDTH {
            let cur = board.get(x, y);
            if cur != prev {
                transitions += 1;
            }
            prev = cur;
        }
        if !prev {
            transitions += 1;
        }
    }
    transitions
}

/// Deepest single-column well: the column whose neighbors both stand
/// higher than it by the largest margin, boundary columns treated as
/// flanked by the board height.
fn deepest_well(heights: &[u8; Board::WIDTH]) -> (u8, usize) {
    let mut best_depth = 0u8;
    let mut best_col = 0usize;
    for x in 0..Board::WIDTH {
        let left = if x == 0 {
            Board::HEIGHT as i32
        } else {
            heights[x - 1] as i32
        };
        let right = if x == Board::WIDTH - 1 {
            Board::HEIGHT as i32
        } else {
            heights[x + 1] as i32
        };
        let depth = left.min(right) - heights[x] as i32;
        if depth > best_depth as i32 {
            best_depth = depth as u8;
            best_col = x;
        }
    }
    (best_depth, best_col)
}

/// Approximate T-slot detection from column-height differences alone
/// (no explicit overhang-shape scan): a capped notch on one side only is
/// a shallow single; capped on both sides, depth 1 is a shallow double,
/// depth >= 2 a deep double-or-triple, and a one-sided overhang of depth
/// >= 3 additionally counts as a triple TSD.
fn tslot_counts(heights: &[u8; Board::WIDTH]) -> [u32; 4] {
    let mut counts = [0u32; 4];
    for x in 1..Board::WIDTH - 1 {
        let center = heights[x] as i32;
        let diff_l = heights[x - 1] as i32 - center;
        let diff_r = heights[x + 1] as i32 - center;

        if diff_l >= 1 && diff_r >= 1 {
            let depth = diff_l.min(diff_r);
            if depth == 1 {
                counts[1] += 1;
            } else {
                counts[2] += 1;
            }
            if diff_l >= 3 || diff_r >= 3 {
                counts[3] += 1;
            }
        } else if diff_l >= 2 || diff_r >= 2 {
            counts[0] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_metrics() {
        let board = Board::new();
        let m = board_metrics(&board);
        assert_eq!(m.max_height, 0);
        assert_eq!(m.cavity_cells, 0);
        assert_eq!(m.overhang_cells, 0);
        assert_eq!(m.bumpiness, 0);
    }

    #[test]
    fn test_cavity_and_overhang() {
        let mut board = Board::new();
        board.set(0, 0, false);
        board.set(0, 1, true); // overhang above an empty cell at y=0
        let m = board_metrics(&board);
        assert_eq!(m.heights[0], 2);
        assert_eq!(m.cavity_cells, 1);
        assert_eq!(m.overhang_cells, 1);
        assert_eq!(m.covered_cells, 1);
    }

    #[test]
    fn test_covered_cells_deeper_stack() {
        let mut board = Board::new();
        // column 0: filled at y=2, empty at y=0 and y=1
        board.set(0, 2, true);
        let m = board_metrics(&board);
        assert_eq!(m.heights[0], 3);
        assert_eq!(m.cavity_cells, 2);
        // both gaps sit under the filled cell at y=2.
        assert_eq!(m.covered_cells, 2);
    }

    #[test]
    fn test_bumpiness_and_squared() {
        let mut board = Board::new();
        board.set(0, 0, true);
        board.set(1, 0, true);
        board.set(1, 1, true);
        board.set(1, 2, true);
        let m = board_metrics(&board);
        assert_eq!(m.heights[0], 1);
        assert_eq!(m.heights[1], 3);
        assert_eq!(m.bumpiness, 2);
        assert_eq!(m.bumpiness_sq, 4);
    }

    #[test]
    fn test_deepest_well() {
        let mut board = Board::new();
        for x in 0..Board::WIDTH {
            if x != 4 {
                board.set(x, 0, true);
                board.set(x, 1, true);
            }
        }
        let m = board_metrics(&board);
        assert_eq!(m.well_column, 4);
        assert_eq!(m.well_depth, 2);
    }

    #[test]
    fn test_tslot_shallow_double() {
        // column 4 is a one-deep notch flanked by equal higher neighbors.
        let mut board = Board::new();
        for x in 0..Board::WIDTH {
            if x != 4 {
                board.set(x, 0, true);
            }
        }
        let m = board_metrics(&board);
        assert_eq!(m.tslot[1], 1);
    }
}
