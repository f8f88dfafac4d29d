//! fusion-bot - the async bot facade: scheduler, worker pool and the
//! public surface `fusion-ffi` wraps.

mod bot;
mod error;
mod options;
mod result;
mod scheduler;

pub use bot::{default_weights, fast_weights, Bot};
pub use error::BotError;
pub use options::Options;
pub use result::{BotPollResult, BotStatistics, Move, PlanPlacement};

pub use fusion_core::{Piece, SpawnRule};
pub use fusion_engine::MovementMode;
pub use fusion_eval::Weights;
pub use fusion_search::PcPriority;
