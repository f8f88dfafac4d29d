//! Bot-level configuration.

use fusion_core::SpawnRule;
use fusion_engine::MovementMode;
use fusion_search::PcPriority;

/// Knobs that govern the scheduler rather than the evaluator (those live
/// in [`fusion_eval::Weights`]). Field names and defaults mirror the CC
/// ABI's `CCOptions`, extended with `spawn_rule` and `pc_priority`, which
/// that ABI doesn't carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub movement_mode: MovementMode,
    pub spawn_rule: SpawnRule,
    pub pc_priority: PcPriority,
    /// The controller will not publish a move before the tree beneath
    /// root has reached this many expansions.
    pub min_nodes: u64,
    /// The controller forces publication once the tree beneath root has
    /// reached this many expansions.
    pub max_nodes: u64,
    /// Worker thread count; `threads == 1` runs single-threaded and is
    /// fully deterministic for a fixed piece sequence.
    pub threads: usize,
    pub use_hold: bool,
    pub speculate: bool,
    /// Lowest-column height above which the evaluator's jeopardy term
    /// engages.
    pub jeopardy_threshold: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self::default_options()
    }
}

impl Options {
    /// A balanced profile for an interactive opponent bot.
    pub fn default_options() -> Self {
        Self {
            movement_mode: MovementMode::ZeroG,
            spawn_rule: SpawnRule::Row19Or20,
            pc_priority: PcPriority::Off,
            min_nodes: 0,
            max_nodes: 500_000,
            threads: 4,
            use_hold: true,
            speculate: true,
            jeopardy_threshold: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_use_hold_and_speculate() {
        let opts = Options::default_options();
        assert!(opts.use_hold);
        assert!(opts.speculate);
        assert!(opts.threads >= 1);
    }
}
