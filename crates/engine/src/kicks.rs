//! SRS+ kick tables for piece rotation.

use fusion_core::{Piece, Rotation};

/// Get kick offsets for a rotation transition, in try-order. The first
/// offset that leaves the piece in an empty, collision-free position is
/// the one `rotate` accepts.
pub fn get_kicks(piece: Piece, from: Rotation, to: Rotation) -> &'static [(i8, i8)] {
    let key = rotation_key(from, to);
    match piece {
        Piece::I => get_i_kicks(key),
        Piece::O => &[],
        _ => get_jlstz_kicks(key),
    }
}

/// Index of the kick offset that counts as a "large offset" for the
/// purposes of the mini-to-full T-spin upgrade: a kick requiring this
/// offset upgrades a mini T-spin to full. For JLSTZ this is the last kick
/// in the table (the 0,2 / 0,-2 vertical kick); the I piece never
/// triggers a T-spin so this is only consulted for `Piece::T`.
pub fn last_kick_index(piece: Piece, from: Rotation, to: Rotation) -> Option<usize> {
    let kicks = get_kicks(piece, from, to);
    if kicks.is_empty() {
        None
    } else {
        Some(kicks.len() - 1)
    }
}

fn rotation_key(from: Rotation, to: Rotation) -> u8 {
    rotation_index(from) * 10 + rotation_index(to)
}

fn rotation_index(r: Rotation) -> u8 {
    match r {
        Rotation::North => 0,
        Rotation::East => 1,
        Rotation::South => 2,
        Rotation::West => 3,
    }
}

/// JLSTZ kick table (SRS+).
fn get_jlstz_kicks(key: u8) -> &'static [(i8, i8)] {
    match key {
        01 => &[(-1, 0), (-1, -1), (0, 2), (-1, 2)],
        12 => &[(1, 0), (1, 1), (0, -2), (1, -2)],
        23 => &[(1, 0), (1, -1), (0, 2), (1, 2)],
        30 => &[(-1, 0), (-1, 1), (0, -2), (-1, -2)],

        10 => &[(1, 0), (1, 1), (0, -2), (1, -2)],
        21 => &[(-1, 0), (-1, -1), (0, 2), (-1, 2)],
        32 => &[(-1, 0), (-1, 1), (0, -2), (-1, -2)],
        03 => &[(1, 0), (1, -1), (0, 2), (1, 2)],

        02 => &[(0, -1), (1, -1), (-1, -1), (1, 0), (-1, 0)],
        20 => &[(0, 1), (-1, 1), (1, 1), (-1, 0), (1, 0)],
        13 => &[(1, 0), (1, -2), (1, -1), (0, -2), (0, -1)],
        31 => &[(-1, 0), (-1, -2), (-1, -1), (0, -2), (0, -1)],

        _ => &[],
    }
}

/// I piece kick table (SRS+).
fn get_i_kicks(key: u8) -> &'static [(i8, i8)] {
    match key {
        01 => &[(-2, 0), (1, 0), (-2, 1), (1, -2)],
        12 => &[(-1, 0), (2, 0), (-1, -2), (2, 1)],
        23 => &[(2, 0), (-1, 0), (2, -1), (-1, 2)],
        30 => &[(1, 0), (-2, 0), (1, 2), (-2, -1)],

        10 => &[(2, 0), (-1, 0), (2, -1), (-1, 2)],
        21 => &[(1, 0), (-2, 0), (1, 2), (-2, -1)],
        32 => &[(-2, 0), (1, 0), (-2, 1), (1, -2)],
        03 => &[(-1, 0), (2, 0), (-1, -2), (2, 1)],

        02 | 20 | 13 | 31 => &[],

        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_cw_kicks() {
        let kicks = get_kicks(Piece::T, Rotation::North, Rotation::East);
        assert_eq!(kicks.len(), 4);
        assert_eq!(kicks[0], (-1, 0));
    }

    #[test]
    fn test_i_kicks() {
        let kicks = get_kicks(Piece::I, Rotation::North, Rotation::East);
        assert_eq!(kicks.len(), 4);
        assert_eq!(kicks[0], (-2, 0));
    }

    #[test]
    fn test_o_no_kicks() {
        let kicks = get_kicks(Piece::O, Rotation::North, Rotation::East);
        assert!(kicks.is_empty());
    }

    #[test]
    fn test_180_kicks() {
        let kicks = get_kicks(Piece::T, Rotation::North, Rotation::South);
        assert_eq!(kicks.len(), 5);
    }
}
