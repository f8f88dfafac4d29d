//! Game state representation.

use crate::{BagMask, Board, Piece};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// `(board, hold, next, bag_mask, b2b, combo)` — two game states are
/// equivalent for memoization iff all of these fields are equal.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub hold: Option<Piece>,
    pub next: VecDeque<Piece>,
    pub bag_mask: BagMask,
    pub b2b: bool,
    pub combo: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            board: Board::new(),
            hold: None,
            next: VecDeque::new(),
            bag_mask: BagMask::full(),
            b2b: false,
            combo: 0,
        }
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(queue: impl IntoIterator<Item = Piece>) -> Self {
        Self {
            next: queue.into_iter().collect(),
            ..Self::default()
        }
    }

    /// The piece that would be placed if the next placement does not use
    /// hold.
    pub fn current_piece(&self) -> Option<Piece> {
        self.next.front().copied()
    }

    /// Append a newly revealed piece to the queue, maintaining the bag
    /// invariant.
    pub fn push_piece(&mut self, piece: Piece) {
        self.bag_mask.draw(piece, self.next.iter().copied());
        self.next.push_back(piece);
    }

    /// Is a piece consistent with the known bag residue? Used to reject
    /// `add_next_piece` calls when speculation is enabled.
    pub fn is_consistent_with_bag(&self, piece: Piece) -> bool {
        self.bag_mask.contains(piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let s = GameState::new();
        assert_eq!(s.combo, 0);
        assert!(!s.b2b);
        assert!(s.current_piece().is_none());
        assert!(s.hold.is_none());
        assert_eq!(s.bag_mask.len(), 7);
    }

    #[test]
    fn test_clone_equality() {
        let s1 = GameState::new();
        let s2 = s1.clone();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_with_queue() {
        let s = GameState::with_queue([Piece::T, Piece::I, Piece::O]);
        assert_eq!(s.current_piece(), Some(Piece::T));
        assert_eq!(s.next.len(), 3);
    }

    #[test]
    fn test_push_piece_updates_bag() {
        let mut s = GameState::new();
        s.bag_mask = BagMask::EMPTY;
        s.bag_mask.insert(Piece::I);
        s.push_piece(Piece::I);
        assert_eq!(s.bag_mask.len(), 7);
        assert_eq!(s.next.back(), Some(&Piece::I));
    }
}
