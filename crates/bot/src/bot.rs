//! The async bot facade, the surface the FFI crate wraps verbatim.

use fusion_core::{BagMask, Board, GameState, Piece};
use fusion_eval::Weights;
use fusion_search::SearchConfig;

use crate::error::BotError;
use crate::options::Options;
use crate::result::BotPollResult;
use crate::scheduler::Pool;

fn search_config(options: &Options, weights: Weights) -> SearchConfig {
    SearchConfig {
        movement_mode: options.movement_mode,
        spawn_rule: options.spawn_rule,
        use_hold: options.use_hold,
        speculate: options.speculate,
        pc_priority: options.pc_priority,
        weights,
        jeopardy_threshold: options.jeopardy_threshold,
    }
}

/// Read-only presets, re-exported from `fusion_eval` rather than
/// duplicated.
pub fn default_weights() -> Weights {
    Weights::default_weights()
}

pub fn fast_weights() -> Weights {
    Weights::fast_weights()
}

/// Mirrors the CC ABI's `CCAsyncBot`: a handle to a running worker pool
/// plus controller thread. Dropping it without calling [`Bot::destroy`]
/// leaks the threads until the process exits; an `extern "C"` handle
/// can't run a `Drop` impl across the FFI boundary, so callers must call
/// `destroy` explicitly.
pub struct Bot {
    pool: Pool,
}

impl Bot {
    /// Start a bot from an empty board with no known pieces yet.
    pub fn launch(options: Options, weights: Weights) -> Self {
        Self::launch_with_state(GameState::new(), options, weights)
    }

    /// Start from a caller-supplied field, bag residue, hold piece,
    /// back-to-back flag and combo count, as a running game might hand
    /// off mid-match.
    pub fn launch_with_board(
        field: &[bool],
        bag_residue: BagMask,
        hold: Option<Piece>,
        b2b: bool,
        combo: u32,
        options: Options,
        weights: Weights,
    ) -> Result<Self, BotError> {
        let board = Board::from_row_major(field)
            .ok_or_else(|| BotError::InvalidArgument("field must be 200 or 400 cells".into()))?;
        let state = GameState {
            board,
            hold,
            next: Default::default(),
            bag_mask: bag_residue,
            b2b,
            combo,
        };
        Ok(Self::launch_with_state(state, options, weights))
    }

    fn launch_with_state(state: GameState, options: Options, weights: Weights) -> Self {
        let config = search_config(&options, weights);
        let pool = Pool::launch(state, config, options);
        Self { pool }
    }

    /// Reveal the next piece in the queue. Rejected when speculation is
    /// enabled and `piece` isn't in the current bag residue
    /// (`BotError::UnsatisfiableQueue`) — with speculation off the bag
    /// invariant isn't tracked so every piece is accepted.
    pub fn add_next_piece(&self, piece: Piece) -> Result<(), BotError> {
        if self.pool.shared().options.speculate {
            let root_state = self.pool.shared().tree.root().state();
            if !root_state.is_consistent_with_bag(piece) {
                return Err(BotError::UnsatisfiableQueue);
            }
        }
        self.pool.add_next_piece(piece);
        Ok(())
    }

    /// Ask the controller to publish a move once budget allows,
    /// accounting for `incoming_garbage` lines expected to land before
    /// the move executes.
    pub fn request_next_move(&self, incoming_garbage: u32) {
        self.request_next_move_delayed(incoming_garbage, 1);
    }

    /// As [`Self::request_next_move`], but with an explicit expected
    /// arrival delay (in pieces) for `incoming_garbage`, feeding the
    /// evaluator's `timed_jeopardy` weight.
    pub fn request_next_move_delayed(&self, incoming_garbage: u32, expected_delay: u32) {
        self.pool.shared().request_move(incoming_garbage, expected_delay);
    }

    /// Non-blocking; returns `Waiting` if no request is outstanding or
    /// the budget hasn't been met yet.
    pub fn poll_next_move(&self) -> BotPollResult {
        self.pool.shared().poll()
    }

    /// Blocks the calling thread until a move publishes or the bot dies.
    pub fn block_next_move(&self) -> BotPollResult {
        self.pool.shared().block()
    }

    /// Replace the game state outright (topping out, garbage
    /// resolution, or any other external authority's board state),
    /// discarding the search tree built so far and clearing `is_dead`.
    pub fn reset(&self, field: &[bool], b2b: bool, combo: u32) -> Result<(), BotError> {
        let board = Board::from_row_major(field)
            .ok_or_else(|| BotError::InvalidArgument("field must be 200 or 400 cells".into()))?;
        let mut state = GameState::new();
        state.board = board;
        state.b2b = b2b;
        state.combo = combo;
        self.pool.reset(state);
        Ok(())
    }

    /// True once every surviving branch tops out, or a worker crashed.
    pub fn is_dead(&self) -> bool {
        self.pool.shared().is_dead()
    }

    /// Stop every worker and the controller, then join them before
    /// returning.
    pub fn destroy(self) {
        self.pool.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_options() -> Options {
        Options {
            min_nodes: 1,
            max_nodes: 20,
            threads: 2,
            ..Options::default_options()
        }
    }

    #[test]
    fn test_launch_and_poll_returns_waiting_without_a_request() {
        let bot = Bot::launch(fast_options(), default_weights());
        assert_eq!(bot.poll_next_move(), BotPollResult::Waiting);
        bot.destroy();
    }

    #[test]
    fn test_add_next_piece_then_request_eventually_provides_a_move() {
        let bot = Bot::launch(fast_options(), default_weights());
        bot.add_next_piece(Piece::T).unwrap();
        bot.add_next_piece(Piece::O).unwrap();
        bot.request_next_move(0);

        let mut result = BotPollResult::Waiting;
        for _ in 0..5000 {
            result = bot.poll_next_move();
            if !matches!(result, BotPollResult::Waiting) {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(matches!(result, BotPollResult::MoveProvided(_)));
        bot.destroy();
    }

    #[test]
    fn test_reset_clears_dead_state() {
        let bot = Bot::launch(fast_options(), default_weights());
        let mut field = vec![false; 200];
        for x in 0..10 {
            field[19 * 10 + x] = true;
        }
        bot.reset(&field, false, 0).unwrap();
        assert!(!bot.is_dead());
        bot.destroy();
    }

    #[test]
    fn test_reset_rejects_wrong_length_field() {
        let bot = Bot::launch(fast_options(), default_weights());
        let err = bot.reset(&vec![false; 7], false, 0).unwrap_err();
        assert!(matches!(err, BotError::InvalidArgument(_)));
        bot.destroy();
    }

    #[test]
    fn test_speculating_bot_rejects_piece_outside_bag_residue() {
        let mut options = fast_options();
        options.speculate = true;
        let bot = Bot::launch(options, default_weights());
        let root_state = bot.pool.shared().tree.root().state();
        let outside = fusion_core::Piece::ALL
            .into_iter()
            .find(|&p| !root_state.is_consistent_with_bag(p));
        if let Some(piece) = outside {
            assert!(matches!(
                bot.add_next_piece(piece),
                Err(BotError::UnsatisfiableQueue)
            ));
        }
        bot.destroy();
    }
}
