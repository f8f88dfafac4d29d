//! State hashing for transposition interning: two game states are
//! equivalent for memoization iff their full field sets are equal.

use fusion_core::GameState;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Hash a [`GameState`] by its full equivalence-defining field set:
/// board, hold, queue contents, bag residue, b2b, combo.
pub fn state_hash(state: &GameState) -> u64 {
    let mut hasher = FxHasher::default();
    for x in 0..fusion_core::Board::WIDTH {
        state.board.column(x).hash(&mut hasher);
    }
    state.hold.hash(&mut hasher);
    for piece in &state.next {
        piece.hash(&mut hasher);
    }
    // BagMask has no public bit accessor beyond contains/iter; hash its
    // member set instead of reaching for internals.
    for piece in state.bag_mask.iter() {
        piece.hash(&mut hasher);
    }
    state.b2b.hash(&mut hasher);
    state.combo.hash(&mut hasher);
    hasher.finish()
}
