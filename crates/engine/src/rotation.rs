//! Rotation, shift, soft-drop and T-spin classification.

use crate::collision::can_place;
use crate::kicks::{get_kicks, last_kick_index};
use fusion_core::{Board, Piece, Rotation, SpinType};

/// Result of a successful rotation: the new orientation/position and
/// which kick (if any) was accepted. `kick_index` is `None` for a
/// same-spot rotation, `Some(0)` for the first kick offset tried, etc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationResult {
    pub new_rotation: Rotation,
    pub new_x: i8,
    pub new_y: i8,
    pub kick_index: Option<usize>,
}

/// Applies the rotation and walks the kick table, returning the first
/// kick that leaves the piece collision-free, or `None` if every kick
/// fails.
pub fn rotate(
    board: &Board,
    piece: Piece,
    rotation: Rotation,
    x: i8,
    y: i8,
    clockwise: bool,
) -> Option<RotationResult> {
    let to = if clockwise { rotation.cw() } else { rotation.ccw() };
    rotate_to(board, piece, rotation, to, x, y)
}

/// 180-degree rotation (SRS+ extension, also exercised by the kernel).
pub fn rotate_180(
    board: &Board,
    piece: Piece,
    rotation: Rotation,
    x: i8,
    y: i8,
) -> Option<RotationResult> {
    rotate_to(board, piece, rotation, rotation.flip(), x, y)
}

fn rotate_to(
    board: &Board,
    piece: Piece,
    from: Rotation,
    to: Rotation,
    x: i8,
    y: i8,
) -> Option<RotationResult> {
    if can_place(board, piece, to, x, y) {
        return Some(RotationResult {
            new_rotation: to,
            new_x: x,
            new_y: y,
            kick_index: None,
        });
    }

    for (i, (dx, dy)) in get_kicks(piece, from, to).iter().enumerate() {
        let nx = x + dx;
        let ny = y + dy;
        if can_place(board, piece, to, nx, ny) {
            return Some(RotationResult {
                new_rotation: to,
                new_x: nx,
                new_y: ny,
                kick_index: Some(i),
            });
        }
    }

    None
}

/// Move one column over if the destination is collision-free.
pub fn shift(board: &Board, piece: Piece, rotation: Rotation, x: i8, y: i8, dx: i8) -> Option<i8> {
    let new_x = x + dx;
    if can_place(board, piece, rotation, new_x, y) {
        Some(new_x)
    } else {
        None
    }
}

/// Single-step fall, used by the BFS movegen; `soft_drop` (all the way
/// down) is `hard_drop_y` in [`crate::collision`] applied repeatedly.
pub fn step_down(board: &Board, piece: Piece, rotation: Rotation, x: i8, y: i8) -> Option<i8> {
    let new_y = y - 1;
    if can_place(board, piece, rotation, x, new_y) {
        Some(new_y)
    } else {
        None
    }
}

/// T-spin classification by the three-corner rule.
/// Non-T pieces always classify as `None`. A T-spin requires the last
/// move into this position to have been a rotation; at least three of
/// the four diagonal corners around the T's center must be filled, and
/// whether the two "front" corners (relative to the final rotation) are
/// both filled decides full vs. mini — except that a kick requiring the
/// large offset (the last entry in the kick table) upgrades mini to
/// full.
pub fn tspin_classify(
    board: &Board,
    piece: Piece,
    rotation: Rotation,
    x: i8,
    y: i8,
    last_move_was_rotation: bool,
    kick_index: Option<usize>,
    rotated_from: Rotation,
) -> SpinType {
    if piece != Piece::T || !last_move_was_rotation {
        return SpinType::None;
    }

    let corners = [(x - 1, y + 1), (x + 1, y + 1), (x - 1, y - 1), (x + 1, y - 1)];
    let mut filled = 0u8;
    let mut front_filled = 0u8;

    for (i, &(cx, cy)) in corners.iter().enumerate() {
        let occupied = cx < 0
            || cx >= Board::WIDTH as i8
            || cy < 0
            || cy >= Board::HEIGHT as i8
            || board.get(cx as usize, cy as usize);

        if occupied {
            filled += 1;
            let is_front = match rotation {
                Rotation::North => i < 2,
                Rotation::East => i == 1 || i == 3,
                Rotation::South => i >= 2,
                Rotation::West => i == 0 || i == 2,
            };
            if is_front {
                front_filled += 1;
            }
        }
    }

    if filled < 3 {
        return SpinType::None;
    }

    if front_filled >= 2 {
        return SpinType::Full;
    }

    let used_large_offset = match kick_index {
        Some(idx) => last_kick_index(piece, rotated_from, rotation) == Some(idx),
        None => false,
    };

    if used_large_offset {
        SpinType::Full
    } else {
        SpinType::Mini
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rotation() {
        let board = Board::new();
        let result = rotate(&board, Piece::T, Rotation::North, 4, 5, true);
        assert!(result.is_some());
        let r = result.unwrap();
        assert_eq!(r.new_rotation, Rotation::East);
        assert_eq!(r.kick_index, None);
    }

    #[test]
    fn test_wall_kick() {
        let board = Board::new();
        let result = rotate(&board, Piece::T, Rotation::North, 0, 5, true);
        assert!(result.is_some());
        assert!(result.unwrap().kick_index.is_some());
    }

    #[test]
    fn test_move_left() {
        let board = Board::new();
        assert_eq!(shift(&board, Piece::T, Rotation::North, 4, 0, -1), Some(3));
    }

    #[test]
    fn test_move_blocked() {
        let board = Board::new();
        assert_eq!(shift(&board, Piece::T, Rotation::North, 0, 0, -1), None);
    }

    #[test]
    fn test_180_rotation() {
        let board = Board::new();
        let result = rotate_180(&board, Piece::T, Rotation::North, 4, 5);
        assert!(result.is_some());
        assert_eq!(result.unwrap().new_rotation, Rotation::South);
    }

    #[test]
    fn test_non_t_piece_never_spins() {
        let mut board = Board::new();
        for row in 0..Board::HEIGHT {
            for col in 0..Board::WIDTH {
                board.set(col, row, true);
            }
        }
        for (dx, dy) in Piece::L.minos(Rotation::North) {
            board.set((4 + dx) as usize, (1 + dy) as usize, false);
        }
        let spin = tspin_classify(
            &board,
            Piece::L,
            Rotation::North,
            4,
            1,
            true,
            None,
            Rotation::West,
        );
        assert_eq!(spin, SpinType::None);
    }

    #[test]
    fn test_tspin_triple_corner_full() {
        // Cage every cell except a T-shaped slot at (4, 1) North.
        let mut board = Board::new();
        for row in 0..Board::HEIGHT {
            for col in 0..Board::WIDTH {
                board.set(col, row, true);
            }
        }
        for (dx, dy) in Piece::T.minos(Rotation::North) {
            board.set((4 + dx) as usize, (1 + dy) as usize, false);
        }
        assert!(can_place(&board, Piece::T, Rotation::North, 4, 1));
        let spin = tspin_classify(
            &board,
            Piece::T,
            Rotation::North,
            4,
            1,
            true,
            None,
            Rotation::West,
        );
        assert_eq!(spin, SpinType::Full);
    }
}
