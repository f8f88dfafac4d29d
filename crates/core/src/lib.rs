//! Fusion core crate - fundamental types for the bot's game-state model.

mod bag;
mod board;
mod board_heights;
mod movement;
mod piece;
mod state;

pub use bag::BagMask;
pub use board::Board;
pub use board_heights::BoardWithHeights;
pub use movement::{Movement, Path, Placement, SpinType, MAX_PATH_LEN};
pub use piece::{Piece, Rotation, SpawnRule};
pub use state::GameState;
