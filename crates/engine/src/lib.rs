//! fusion-engine - game-logic kernel and placement generator.
//!
//! Pure functions over [`fusion_core::Board`] and the seven piece shapes:
//! rotation with wall/floor kicks, gravity settle, line clear, T-spin
//! classification, board heuristics, and the placement generator that
//! enumerates every reachable final placement under a movement mode.

pub mod apply;
pub mod collision;
pub mod kicks;
pub mod metrics;
pub mod movegen;
pub mod rotation;

pub use apply::{apply_mut, lock, unapply_mut, UndoInfo, MAX_CLEARED_ROWS};
pub use collision::{can_place, collides, hard_drop_y};
pub use kicks::{get_kicks, last_kick_index};
pub use metrics::{board_metrics, BoardMetrics};
pub use movegen::{generate_placements, MovementMode};
pub use rotation::{rotate, rotate_180, shift, step_down, tspin_classify, RotationResult};
