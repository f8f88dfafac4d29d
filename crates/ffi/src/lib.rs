//! fusion-ffi - a thin `extern "C"` wrapper over `fusion-bot`, matching
//! the CC ABI's symbol names and struct layouts so any
//! existing CC ABI client can link against this crate's `cdylib`
//! output unmodified.
//!
//! This crate carries no logic of its own beyond marshalling: every
//! decision (scheduling, evaluation, search) lives in `fusion-bot`. Where
//! the header's shape can't express something `fusion-bot` needs
//! (`Options::threads`, `spawn_rule`, `pc_priority`, `jeopardy_threshold`;
//! `Movement::Rotate180`), that's called out at the conversion site rather
//! than silently dropped or silently invented.

use std::slice;

use fusion_bot::{
    Bot, BotPollResult, MovementMode, Options, Piece, PlanPlacement as BotPlanPlacement,
    SpawnRule, Weights,
};
use fusion_core::{Board, Movement};

mod types;
pub use types::{CCMove, CCMovement, CCMovementMode, CCOptions, CCPiece, CCWeights};

/// Opaque handle, matching the CC ABI's `typedef struct CCAsyncBot
/// CCAsyncBot;` — clients only ever hold a pointer to one.
pub struct CCAsyncBot(Bot);

fn piece_from_cc(piece: CCPiece) -> Piece {
    match piece {
        CCPiece::CcI => Piece::I,
        CCPiece::CcT => Piece::T,
        CCPiece::CcO => Piece::O,
        CCPiece::CcS => Piece::S,
        CCPiece::CcZ => Piece::Z,
        CCPiece::CcL => Piece::L,
        CCPiece::CcJ => Piece::J,
    }
}

fn movement_mode_from_cc(mode: CCMovementMode) -> MovementMode {
    match mode {
        CCMovementMode::Cc0G => MovementMode::ZeroG,
        CCMovementMode::Cc20G => MovementMode::TwentyG,
        CCMovementMode::CcHardDropOnly => MovementMode::HardDropOnly,
    }
}

fn movement_mode_to_cc(mode: MovementMode) -> CCMovementMode {
    match mode {
        MovementMode::ZeroG => CCMovementMode::Cc0G,
        MovementMode::TwentyG => CCMovementMode::Cc20G,
        MovementMode::HardDropOnly => CCMovementMode::CcHardDropOnly,
    }
}

/// the CC ABI's `CCMovement` has no 180-degree variant. A `Rotate180`
/// step is expressed to C callers as two consecutive `CC_CW` steps, which
/// is behaviorally equivalent for any client that just replays the path
/// (the header never promised minimal path length, only a reachable one).
fn push_cc_movement(out: &mut Vec<CCMovement>, m: Movement) {
    match m {
        Movement::Left => out.push(CCMovement::CcLeft),
        Movement::Right => out.push(CCMovement::CcRight),
        Movement::Cw => out.push(CCMovement::CcCw),
        Movement::Ccw => out.push(CCMovement::CcCcw),
        Movement::SoftDrop => out.push(CCMovement::CcDrop),
        Movement::Rotate180 => {
            out.push(CCMovement::CcCw);
            out.push(CCMovement::CcCw);
        }
    }
}

/// `Options` fields absent from `CCOptions` (`threads`, `spawn_rule`,
/// `pc_priority`, `jeopardy_threshold`) take `Options::default_options`'s
/// values; a C caller has no way to override them through this ABI.
fn options_from_cc(opts: &CCOptions) -> Options {
    Options {
        movement_mode: movement_mode_from_cc(opts.mode),
        use_hold: opts.use_hold,
        speculate: opts.speculate,
        min_nodes: opts.min_nodes as u64,
        max_nodes: opts.max_nodes as u64,
        ..Options::default_options()
    }
}

fn options_to_cc(opts: &Options) -> CCOptions {
    CCOptions {
        mode: movement_mode_to_cc(opts.movement_mode),
        use_hold: opts.use_hold,
        speculate: opts.speculate,
        min_nodes: opts.min_nodes as usize,
        max_nodes: opts.max_nodes as usize,
    }
}

/// `Weights::{use_bag,timed_jeopardy,stack_pc_damage}` have no `CCWeights`
/// counterpart; converting *into* `Weights` takes `default_weights`'
/// values for them, and converting *out* simply drops them.
fn weights_from_cc(w: &CCWeights) -> Weights {
    let d = Weights::default_weights();
    Weights {
        back_to_back: w.back_to_back,
        bumpiness: w.bumpiness,
        bumpiness_sq: w.bumpiness_sq,
        height: w.height,
        top_half: w.top_half,
        top_quarter: w.top_quarter,
        cavity_cells: w.cavity_cells,
        cavity_cells_sq: w.cavity_cells_sq,
        overhang_cells: w.overhang_cells,
        overhang_cells_sq: w.overhang_cells_sq,
        covered_cells: w.covered_cells,
        covered_cells_sq: w.covered_cells_sq,
        tslot: w.tslot,
        well_depth: w.well_depth,
        max_well_depth: w.max_well_depth,
        well_column: w.well_column,
        b2b_clear: w.b2b_clear,
        clear1: w.clear1,
        clear2: w.clear2,
        clear3: w.clear3,
        clear4: w.clear4,
        tspin1: w.tspin1,
        tspin2: w.tspin2,
        tspin3: w.tspin3,
        mini_tspin1: w.mini_tspin1,
        mini_tspin2: w.mini_tspin2,
        perfect_clear: w.perfect_clear,
        combo_garbage: w.combo_garbage,
        move_time: w.move_time,
        wasted_t: w.wasted_t,
        ..d
    }
}

fn weights_to_cc(w: &Weights) -> CCWeights {
    CCWeights {
        back_to_back: w.back_to_back,
        bumpiness: w.bumpiness,
        bumpiness_sq: w.bumpiness_sq,
        height: w.height,
        top_half: w.top_half,
        top_quarter: w.top_quarter,
        cavity_cells: w.cavity_cells,
        cavity_cells_sq: w.cavity_cells_sq,
        overhang_cells: w.overhang_cells,
        overhang_cells_sq: w.overhang_cells_sq,
        covered_cells: w.covered_cells,
        covered_cells_sq: w.covered_cells_sq,
        tslot: w.tslot,
        well_depth: w.well_depth,
        max_well_depth: w.max_well_depth,
        well_column: w.well_column,
        b2b_clear: w.b2b_clear,
        clear1: w.clear1,
        clear2: w.clear2,
        clear3: w.clear3,
        clear4: w.clear4,
        tspin1: w.tspin1,
        tspin2: w.tspin2,
        tspin3: w.tspin3,
        mini_tspin1: w.mini_tspin1,
        mini_tspin2: w.mini_tspin2,
        perfect_clear: w.perfect_clear,
        combo_garbage: w.combo_garbage,
        move_time: w.move_time,
        wasted_t: w.wasted_t,
    }
}

/// Builds the `CCMove` returned through `cc_poll_next_move`, including the
/// header's legacy `nodes`/`depth`/`original_rank` trio (from
/// `Move::statistics`) alongside the path and expected cells. The
/// `plan` field has no `CCMove` counterpart and is simply not surfaced
/// here; a client that needs it should link against `fusion-bot`
/// directly instead of through this header-compatible shim.
fn cc_move_from(mv: &fusion_bot::Move) -> CCMove {
    let mut movements = Vec::with_capacity(mv.movements.len());
    for &m in mv.movements.as_slice() {
        push_cc_movement(&mut movements, m);
        if movements.len() >= 32 {
            break;
        }
    }
    movements.truncate(32);
    let movement_count = movements.len() as u8;
    let mut fixed = [CCMovement::CcLeft; 32];
    fixed[..movements.len()].copy_from_slice(&movements);

    let mut expected_x = [0u8; 4];
    let mut expected_y = [0u8; 4];
    for (i, &(x, y)) in mv.expected_cells.iter().enumerate() {
        expected_x[i] = x.max(0) as u8;
        expected_y[i] = y.max(0) as u8;
    }

    CCMove {
        hold: mv.hold,
        expected_x,
        expected_y,
        movement_count,
        movements: fixed,
        nodes: mv.statistics.nodes_searched.min(u32::MAX as u64) as u32,
        depth: mv.statistics.search_depth,
        original_rank: mv.statistics.original_rank_among_siblings,
    }
}

/// `cc_launch_async` : launch with a blank board, empty
/// queue, all seven pieces in the bag. Returns null if either pointer is
/// null.
///
/// # Safety
/// `options` and `weights` must each point to a valid, initialized
/// `CCOptions`/`CCWeights`, or be null.
#[no_mangle]
pub unsafe extern "C" fn cc_launch_async(
    options: *const CCOptions,
    weights: *const CCWeights,
) -> *mut CCAsyncBot {
    let (Some(options), Some(weights)) = (options.as_ref(), weights.as_ref()) else {
        return std::ptr::null_mut();
    };
    let bot = Bot::launch(options_from_cc(options), weights_from_cc(weights));
    Box::into_raw(Box::new(CCAsyncBot(bot)))
}

/// `cc_destroy_async` : stop the worker pool and free the
/// handle. A null pointer is a no-op.
///
/// # Safety
/// `bot` must be a pointer previously returned by [`cc_launch_async`] and
/// not already destroyed, or null.
#[no_mangle]
pub unsafe extern "C" fn cc_destroy_async(bot: *mut CCAsyncBot) {
    if bot.is_null() {
        return;
    }
    let boxed = Box::from_raw(bot);
    boxed.0.destroy();
}

/// `cc_reset_async` : `field` must point to `400` row-major
/// booleans, `(0, 0)` bottom-left.
///
/// # Safety
/// `bot` must be a live pointer from [`cc_launch_async`]. `field` must
/// point to at least `Board::WIDTH * Board::VISIBLE_HEIGHT` valid `bool`s.
#[no_mangle]
pub unsafe extern "C" fn cc_reset_async(
    bot: *mut CCAsyncBot,
    field: *const bool,
    b2b: bool,
    combo: u32,
) {
    let Some(bot) = bot.as_ref() else {
        return;
    };
    if field.is_null() {
        return;
    }
    let field = slice::from_raw_parts(field, Board::WIDTH * Board::VISIBLE_HEIGHT);
    let _ = bot.0.reset(field, b2b, combo);
}

/// `cc_add_next_piece_async` .
///
/// # Safety
/// `bot` must be a live pointer from [`cc_launch_async`].
#[no_mangle]
pub unsafe extern "C" fn cc_add_next_piece_async(bot: *mut CCAsyncBot, piece: CCPiece) {
    if let Some(bot) = bot.as_ref() {
        let _ = bot.0.add_next_piece(piece_from_cc(piece));
    }
}

/// `cc_request_next_move` . The header's signature carries
/// no incoming-garbage parameter, so this always requests with zero
/// (`fusion-bot`'s richer `request_next_move_delayed` is reachable only
/// by linking against it directly).
///
/// # Safety
/// `bot` must be a live pointer from [`cc_launch_async`].
#[no_mangle]
pub unsafe extern "C" fn cc_request_next_move(bot: *mut CCAsyncBot) {
    if let Some(bot) = bot.as_ref() {
        bot.0.request_next_move(0);
    }
}

/// `cc_poll_next_move` : returns `true` and fills `*move`
/// if a move has been published; otherwise returns `false` and leaves
/// `*move` untouched.
///
/// # Safety
/// `bot` must be a live pointer from [`cc_launch_async`]. `out_move` must
/// point to a valid, writable `CCMove`, or be null (in which case this
/// always returns `false`).
#[no_mangle]
pub unsafe extern "C" fn cc_poll_next_move(bot: *mut CCAsyncBot, out_move: *mut CCMove) -> bool {
    let Some(bot) = bot.as_ref() else {
        return false;
    };
    if out_move.is_null() {
        return false;
    }
    match bot.0.poll_next_move() {
        BotPollResult::MoveProvided(mv) => {
            *out_move = cc_move_from(&mv);
            true
        }
        BotPollResult::Waiting | BotPollResult::Dead => false,
    }
}

/// `cc_is_dead_async` . A null pointer reports dead.
///
/// # Safety
/// `bot` must be a live pointer from [`cc_launch_async`], or null.
#[no_mangle]
pub unsafe extern "C" fn cc_is_dead_async(bot: *mut CCAsyncBot) -> bool {
    match bot.as_ref() {
        Some(bot) => bot.0.is_dead(),
        None => true,
    }
}

/// `cc_default_options` .
///
/// # Safety
/// `options` must point to a valid, writable `CCOptions`.
#[no_mangle]
pub unsafe extern "C" fn cc_default_options(options: *mut CCOptions) {
    if let Some(options) = options.as_mut() {
        *options = options_to_cc(&Options::default_options());
    }
}

/// `cc_default_weights` .
///
/// # Safety
/// `weights` must point to a valid, writable `CCWeights`.
#[no_mangle]
pub unsafe extern "C" fn cc_default_weights(weights: *mut CCWeights) {
    if let Some(weights) = weights.as_mut() {
        *weights = weights_to_cc(&Weights::default_weights());
    }
}

#[allow(dead_code)]
fn assert_bot_plan_placement_shape(_: BotPlanPlacement) {}

// `spawn_rule`/`pc_priority`/`threads`/`jeopardy_threshold` aren't in
// `CCOptions`; keep a named reference so the unused-import lint doesn't
// fire and so a reader sees exactly which `Options` fields are
// unreachable through this ABI.
#[allow(dead_code)]
fn assert_spawn_rule_shape(_: SpawnRule) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_options() -> CCOptions {
        let mut opts = CCOptions {
            mode: CCMovementMode::Cc0G,
            use_hold: true,
            speculate: true,
            min_nodes: 1,
            max_nodes: 20,
        };
        unsafe {
            cc_default_options(&mut opts);
        }
        opts
    }

    #[test]
    fn test_launch_destroy_roundtrip() {
        let options = sample_options();
        let mut weights = CCWeights {
            back_to_back: 0,
            bumpiness: 0,
            bumpiness_sq: 0,
            height: 0,
            top_half: 0,
            top_quarter: 0,
            cavity_cells: 0,
            cavity_cells_sq: 0,
            overhang_cells: 0,
            overhang_cells_sq: 0,
            covered_cells: 0,
            covered_cells_sq: 0,
            tslot: [0; 4],
            well_depth: 0,
            max_well_depth: 0,
            well_column: [0; 10],
            b2b_clear: 0,
            clear1: 0,
            clear2: 0,
            clear3: 0,
            clear4: 0,
            tspin1: 0,
            tspin2: 0,
            tspin3: 0,
            mini_tspin1: 0,
            mini_tspin2: 0,
            perfect_clear: 0,
            combo_garbage: 0,
            move_time: 0,
            wasted_t: 0,
        };
        unsafe {
            cc_default_weights(&mut weights);
            let bot = cc_launch_async(&options, &weights);
            assert!(!bot.is_null());
            assert!(!cc_is_dead_async(bot));
            cc_destroy_async(bot);
        }
    }

    #[test]
    fn test_null_bot_is_dead() {
        unsafe {
            assert!(cc_is_dead_async(std::ptr::null_mut()));
        }
    }

    #[test]
    fn test_piece_roundtrip_covers_all_variants() {
        for &cc in &[
            CCPiece::CcI,
            CCPiece::CcT,
            CCPiece::CcO,
            CCPiece::CcS,
            CCPiece::CcZ,
            CCPiece::CcL,
            CCPiece::CcJ,
        ] {
            let _ = piece_from_cc(cc);
        }
    }

    #[test]
    fn test_rotate_180_expands_to_two_cw_steps() {
        let mut out = Vec::new();
        push_cc_movement(&mut out, Movement::Rotate180);
        assert_eq!(out, vec![CCMovement::CcCw, CCMovement::CcCw]);
    }
}
