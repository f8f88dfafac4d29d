//! Placement and input-path types.

use serde::{Deserialize, Serialize};

/// A single input in a placement's path.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Movement {
    Left,
    Right,
    Cw,
    Ccw,
    /// 180-degree rotation (SRS+ extension; see `fusion_engine::kicks`).
    Rotate180,
    SoftDrop,
}

/// Maximum path length a placement may carry: an external contract on the
/// movements array size. Placements requiring a longer path are dropped
/// rather than truncated.
pub const MAX_PATH_LEN: usize = 32;

/// Stack-allocated input path, capped at [`MAX_PATH_LEN`] moves.
///
/// No heap allocation per placement.
#[derive(Clone, Copy, Eq, Debug, Serialize, Deserialize)]
pub struct Path {
    moves: [Movement; MAX_PATH_LEN],
    len: u8,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl std::hash::Hash for Path {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl Path {
    pub const fn new() -> Self {
        Self {
            moves: [Movement::Left; MAX_PATH_LEN],
            len: 0,
        }
    }

    /// Push a movement. Returns `false` (and does not push) if the path
    /// is already at [`MAX_PATH_LEN`].
    #[must_use]
    pub fn push(&mut self, m: Movement) -> bool {
        if self.len as usize >= MAX_PATH_LEN {
            return false;
        }
        self.moves[self.len as usize] = m;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Movement] {
        &self.moves[..self.len as usize]
    }

    pub fn from_slice(moves: &[Movement]) -> Option<Self> {
        if moves.len() > MAX_PATH_LEN {
            return None;
        }
        let mut path = Self::new();
        for &m in moves {
            path.push(m);
        }
        Some(path)
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SpinType {
    None,
    Mini,
    Full,
}

/// A final, locked-in piece placement: rotation state, anchor position,
/// T-spin classification and the canonical path that reaches it from
/// spawn.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Placement {
    pub piece: crate::Piece,
    pub rotation: crate::Rotation,
    pub anchor_x: i8,
    pub anchor_y: i8,
    pub tspin: SpinType,
    pub path: Path,
}

impl Placement {
    pub fn new(piece: crate::Piece, rotation: crate::Rotation, x: i8, y: i8) -> Self {
        Self {
            piece,
            rotation,
            anchor_x: x,
            anchor_y: y,
            tspin: SpinType::None,
            path: Path::new(),
        }
    }

    pub fn with_tspin(mut self, tspin: SpinType) -> Self {
        self.tspin = tspin;
        self
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }

    /// The four occupied cells this placement locks in, at its final
    /// position.
    pub fn cells(&self) -> [(i8, i8); 4] {
        let mut out = [(0i8, 0i8); 4];
        for (i, (dx, dy)) in self.piece.minos(self.rotation).into_iter().enumerate() {
            out[i] = (self.anchor_x + dx, self.anchor_y + dy);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Piece, Rotation};

    #[test]
    fn test_placement_new() {
        let p = Placement::new(Piece::T, Rotation::North, 4, 0);
        assert_eq!(p.piece, Piece::T);
        assert_eq!(p.tspin, SpinType::None);
        assert!(p.path.is_empty());
    }

    #[test]
    fn test_path_push_caps_at_32() {
        let mut path = Path::new();
        for _ in 0..32 {
            assert!(path.push(Movement::Left));
        }
        assert!(!path.push(Movement::Left));
        assert_eq!(path.len(), 32);
    }

    #[test]
    fn test_placement_cells() {
        let p = Placement::new(Piece::O, Rotation::North, 4, 0);
        let cells = p.cells();
        assert!(cells.contains(&(4, 0)));
        assert!(cells.contains(&(5, 1)));
    }
}
