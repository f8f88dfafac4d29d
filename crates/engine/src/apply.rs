//! Lock, line-clear and undo.

use fusion_core::{Board, Placement, SpinType};

/// Writes the placement's cells, clears full rows top-down in one pass,
/// and reports the clear count alongside the T-spin classification
/// already attached to the placement.
pub fn lock(board: &Board, placement: &Placement) -> (Board, u8, SpinType) {
    let mut next = board.clone();
    for (x, y) in placement.cells() {
        next.set_raw(x as usize, y as usize);
    }
    let lines = next.clear_lines();
    (next, lines, placement.tspin)
}

/// Maximum lines a single piece can clear.
pub const MAX_CLEARED_ROWS: usize = 4;

/// Undo information for [`apply_mut`]: the placement that was locked and
/// the rows that were cleared, in increasing row-index order, so the
/// clear can be cascaded back in during [`unapply_mut`].
#[derive(Clone, Copy)]
pub struct UndoInfo {
    pub placement: Placement,
    cleared_rows: [(u8, u16); MAX_CLEARED_ROWS],
    cleared_count: u8,
}

/// Apply a placement in place, returning undo info for reversal. Used by
/// the perfect-clear sub-search, which backtracks through many candidate
/// sequences and would otherwise pay a full board clone per node.
pub fn apply_mut(board: &mut Board, placement: &Placement) -> UndoInfo {
    for (x, y) in placement.cells() {
        board.set_raw(x as usize, y as usize);
    }

    let mut cleared_rows = [(0u8, 0u16); MAX_CLEARED_ROWS];
    let mut cleared_count = 0u8;
    let mut new_columns = [0u64; Board::WIDTH];
    let mut write_y = 0usize;

    for read_y in 0..Board::HEIGHT {
        if board.is_row_full(read_y) {
            if (cleared_count as usize) < MAX_CLEARED_ROWS {
                cleared_rows[cleared_count as usize] = (read_y as u8, board.row(read_y));
            }
            cleared_count += 1;
        } else {
            for x in 0..Board::WIDTH {
                if board.get(x, read_y) {
                    new_columns[x] |= 1 << write_y;
                }
            }
            write_y += 1;
        }
    }

    for x in 0..Board::WIDTH {
        board.set_column(x, new_columns[x]);
    }

    UndoInfo {
        placement: *placement,
        cleared_rows,
        cleared_count: cleared_count.min(MAX_CLEARED_ROWS as u8),
    }
}

impl UndoInfo {
    /// How many rows `apply_mut` cleared.
    pub fn lines_cleared(&self) -> u8 {
        self.cleared_count
    }
}

/// Reverse an [`apply_mut`] call, restoring `board` to its pre-lock state.
pub fn unapply_mut(board: &mut Board, undo: &UndoInfo) {
    // Re-insert cleared rows in increasing original-index order so each
    // insertion sees the board exactly as it was before the next row
    // (at a higher original index) was removed.
    for i in 0..undo.cleared_count as usize {
        let (row_y, row_bitmap) = undo.cleared_rows[i];
        let row_y = row_y as usize;
        for x in 0..Board::WIDTH {
            let col = board.column(x);
            let lower = col & ((1u64 << row_y) - 1);
            let upper = col >> row_y;
            let bit = ((row_bitmap >> x) & 1) as u64;
            board.set_column(x, lower | (bit << row_y) | (upper << (row_y + 1)));
        }
    }

    for (x, y) in undo.placement.cells() {
        board.clear_raw(x as usize, y as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::{Piece, Rotation};

    #[test]
    fn test_lock_t_piece_empty() {
        let board = Board::new();
        let placement = Placement::new(Piece::T, Rotation::North, 4, 0);
        let (next, lines, tspin) = lock(&board, &placement);

        assert_eq!(lines, 0);
        assert_eq!(tspin, SpinType::None);
        assert!(next.get(3, 0));
        assert!(next.get(4, 0));
        assert!(next.get(5, 0));
        assert!(next.get(4, 1));
    }

    #[test]
    fn test_lock_i_piece_line_clear() {
        let mut board = Board::new();
        for x in 0..10 {
            if !(4..=7).contains(&x) {
                board.set(x, 0, true);
            }
        }
        let placement = Placement::new(Piece::I, Rotation::North, 5, 0);
        let (next, lines, _) = lock(&board, &placement);

        assert_eq!(lines, 1);
        for x in 0..10 {
            assert!(!next.get(x, 0));
        }
    }

    #[test]
    fn test_apply_unapply_round_trip() {
        let mut board = Board::new();
        for x in 0..10 {
            if !(4..=7).contains(&x) {
                board.set(x, 0, true);
            }
        }
        board.set(2, 3, true);
        let before = board.clone();

        let placement = Placement::new(Piece::I, Rotation::North, 5, 0);
        let undo = apply_mut(&mut board, &placement);
        assert_eq!(board.clear_lines(), 0); // already cleared by apply_mut
        unapply_mut(&mut board, &undo);

        assert_eq!(board, before);
    }

    #[test]
    fn test_apply_unapply_no_clear() {
        let mut board = Board::new();
        board.set(1, 1, true);
        let before = board.clone();
        let placement = Placement::new(Piece::O, Rotation::North, 4, 5);
        let undo = apply_mut(&mut board, &placement);
        unapply_mut(&mut board, &undo);
        assert_eq!(board, before);
    }
}
