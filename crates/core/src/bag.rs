//! Bag-residue tracking: the set of pieces still to be drawn from the
//! current seven-piece bag.

use crate::Piece;
use serde::{Deserialize, Serialize};

/// Bitset over [`Piece::ALL`] recording which pieces remain in the
/// current bag. Invariant: `1 <= len() <= 7`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BagMask(u8);

impl BagMask {
    pub const EMPTY: Self = Self(0);

    pub fn full() -> Self {
        let mut mask = 0u8;
        for p in Piece::ALL {
            mask |= 1 << p.index();
        }
        Self(mask)
    }

    pub fn contains(self, piece: Piece) -> bool {
        self.0 & (1 << piece.index()) != 0
    }

    pub fn insert(&mut self, piece: Piece) {
        self.0 |= 1 << piece.index();
    }

    pub fn remove(&mut self, piece: Piece) {
        self.0 &= !(1 << piece.index());
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = Piece> {
        Piece::ALL.into_iter().filter(move |&p| self.contains(p))
    }

    /// Draw `piece` from the bag. If the bag is now empty, refill it to
    /// all seven pieces minus any already visible in `revealed`.
    pub fn draw(&mut self, piece: Piece, revealed: impl Iterator<Item = Piece>) {
        self.remove(piece);
        if self.is_empty() {
            *self = Self::full();
            for p in revealed {
                self.remove(p);
            }
        }
    }
}

impl Default for BagMask {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_bag_has_all_seven() {
        let bag = BagMask::full();
        assert_eq!(bag.len(), 7);
        for p in Piece::ALL {
            assert!(bag.contains(p));
        }
    }

    #[test]
    fn test_draw_removes_piece() {
        let mut bag = BagMask::full();
        bag.draw(Piece::T, std::iter::empty());
        assert!(!bag.contains(Piece::T));
        assert_eq!(bag.len(), 6);
    }

    #[test]
    fn test_draw_last_piece_refills_minus_revealed() {
        let mut bag = BagMask::EMPTY;
        bag.insert(Piece::I);
        // Drawing the last piece refills, excluding what's already visible.
        bag.draw(Piece::I, [Piece::T, Piece::O].into_iter());
        assert_eq!(bag.len(), 5);
        assert!(!bag.contains(Piece::T));
        assert!(!bag.contains(Piece::O));
        assert!(bag.contains(Piece::I));
    }
}
