//! Placement generation across the three movement modes.
//!
//! A BFS over reachable `(rotation, x, y)` states (`VecDeque` plus a
//! visited grid, one placement emitted per dequeued state) threading a
//! canonical input [`Path`] alongside every queued state.

use std::collections::{HashSet, VecDeque};

use crate::collision::{can_place, hard_drop_y};
use crate::rotation::{rotate, rotate_180, shift, step_down, tspin_classify};
use fusion_core::{Board, Movement, Path, Piece, Placement, Rotation, SpawnRule, SpinType};

/// Gravity behavior during placement search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementMode {
    /// No automatic fall: the piece only moves via explicit shift,
    /// rotate, or single-step soft drop, and locks via an explicit drop.
    ZeroG,
    /// The piece snaps to the lowest collision-free row after every
    /// move; BFS operates directly on already-resting `(rotation, x)`
    /// pairs.
    TwentyG,
    /// No movement search at all: every `(rotation, x)` combination is
    /// tried directly and immediately hard-dropped.
    HardDropOnly,
}

const ROTATIONS: [Rotation; 4] = [
    Rotation::North,
    Rotation::East,
    Rotation::South,
    Rotation::West,
];

/// Offset added to `x` before indexing the visited grid, wide enough for
/// the negative anchors an I-piece kick can land on.
const X_OFFSET: i8 = 2;
const VISITED_WIDTH: usize = Board::WIDTH + 4;
const VISITED_HEIGHT: usize = Board::HEIGHT + 4;

pub fn generate_placements(
    board: &Board,
    piece: Piece,
    mode: MovementMode,
    spawn_rule: SpawnRule,
) -> Vec<Placement> {
    let placements = match mode {
        MovementMode::ZeroG => generate_zero_g(board, piece, spawn_rule),
        MovementMode::TwentyG => generate_twenty_g(board, piece, spawn_rule),
        MovementMode::HardDropOnly => generate_hard_drop_only(board, piece, spawn_rule),
    };
    dedup_by_cells(placements)
}

/// Collapses placements that occupy the same final cells under different
/// rotation labels (`I`/`O`/`S`/`Z` all have at least one pair of rotation
/// states whose footprints coincide once translated to their resting
/// position). The first-discovered placement for a given cell set wins,
/// matching the generator's left/rotate/right canonical tie-break.
fn dedup_by_cells(placements: Vec<Placement>) -> Vec<Placement> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(placements.len());
    for p in placements {
        let mut cells = p.cells();
        cells.sort_unstable();
        if seen.insert(cells) {
            out.push(p);
        }
    }
    out
}

struct Visited {
    cells: Box<[[[bool; VISITED_HEIGHT]; VISITED_WIDTH]; 4]>,
}

impl Visited {
    fn new() -> Self {
        Self {
            cells: Box::new([[[false; VISITED_HEIGHT]; VISITED_WIDTH]; 4]),
        }
    }

    /// Marks `(rotation, x, y)` visited, returning `true` if it was not
    /// already marked (and is in bounds).
    fn mark(&mut self, rotation: Rotation, x: i8, y: i8) -> bool {
        let xi = x + X_OFFSET;
        if xi < 0 || xi as usize >= VISITED_WIDTH || y < 0 || y as usize >= VISITED_HEIGHT {
            return false;
        }
        let cell = &mut self.cells[rotation as usize][xi as usize][y as usize];
        if *cell {
            false
        } else {
            *cell = true;
            true
        }
    }
}

#[derive(Clone, Copy)]
struct ZeroGState {
    rotation: Rotation,
    x: i8,
    y: i8,
    path: Path,
    last_move_was_rotation: bool,
    kick_index: Option<usize>,
    rotated_from: Rotation,
}

#[allow(clippy::too_many_arguments)]
fn try_enqueue_zero_g(
    visited: &mut Visited,
    queue: &mut VecDeque<ZeroGState>,
    mut path: Path,
    movement: Movement,
    rotation: Rotation,
    x: i8,
    y: i8,
    last_move_was_rotation: bool,
    kick_index: Option<usize>,
    rotated_from: Rotation,
) {
    if !visited.mark(rotation, x, y) {
        return;
    }
    if !path.push(movement) {
        return;
    }
    queue.push_back(ZeroGState {
        rotation,
        x,
        y,
        path,
        last_move_was_rotation,
        kick_index,
        rotated_from,
    });
}

fn generate_zero_g(board: &Board, piece: Piece, spawn_rule: SpawnRule) -> Vec<Placement> {
    let spawn_x = piece.spawn_x();
    let spawn_y = piece.spawn_y(spawn_rule);
    let spawn_rotation = Rotation::North;

    let mut placements = Vec::new();
    if !can_place(board, piece, spawn_rotation, spawn_x, spawn_y) {
        return placements;
    }

    let mut visited = Visited::new();
    visited.mark(spawn_rotation, spawn_x, spawn_y);

    let mut queue = VecDeque::new();
    queue.push_back(ZeroGState {
        rotation: spawn_rotation,
        x: spawn_x,
        y: spawn_y,
        path: Path::new(),
        last_move_was_rotation: false,
        kick_index: None,
        rotated_from: spawn_rotation,
    });

    let mut seen = HashSet::new();

    while let Some(state) = queue.pop_front() {
        let drop_y = hard_drop_y(board, piece, state.rotation, state.x, state.y);
        let key = (state.rotation as u8, state.x, drop_y);
        if seen.insert(key) {
            // A T-spin requires the piece to already be resting (no
            // further fall available) with the last move a rotation.
            let tspin = if drop_y == state.y && state.last_move_was_rotation {
                tspin_classify(
                    board,
                    piece,
                    state.rotation,
                    state.x,
                    drop_y,
                    true,
                    state.kick_index,
                    state.rotated_from,
                )
            } else {
                SpinType::None
            };

            let mut path = state.path;
            if drop_y != state.y {
                let _ = path.push(Movement::SoftDrop);
            }

            placements.push(
                Placement::new(piece, state.rotation, state.x, drop_y)
                    .with_tspin(tspin)
                    .with_path(path),
            );
        }

        if let Some(nx) = shift(board, piece, state.rotation, state.x, state.y, -1) {
            try_enqueue_zero_g(
                &mut visited, &mut queue, state.path, Movement::Left,
                state.rotation, nx, state.y, false, None, state.rotation,
            );
        }
        if let Some(nx) = shift(board, piece, state.rotation, state.x, state.y, 1) {
            try_enqueue_zero_g(
                &mut visited, &mut queue, state.path, Movement::Right,
                state.rotation, nx, state.y, false, None, state.rotation,
            );
        }
        if let Some(result) = rotate(board, piece, state.rotation, state.x, state.y, true) {
            try_enqueue_zero_g(
                &mut visited, &mut queue, state.path, Movement::Cw,
                result.new_rotation, result.new_x, result.new_y, true,
                result.kick_index, state.rotation,
            );
        }
        if let Some(result) = rotate(board, piece, state.rotation, state.x, state.y, false) {
            try_enqueue_zero_g(
                &mut visited, &mut queue, state.path, Movement::Ccw,
                result.new_rotation, result.new_x, result.new_y, true,
                result.kick_index, state.rotation,
            );
        }
        if let Some(result) = rotate_180(board, piece, state.rotation, state.x, state.y) {
            try_enqueue_zero_g(
                &mut visited, &mut queue, state.path, Movement::Rotate180,
                result.new_rotation, result.new_x, result.new_y, true,
                result.kick_index, state.rotation,
            );
        }
        if let Some(ny) = step_down(board, piece, state.rotation, state.x, state.y) {
            try_enqueue_zero_g(
                &mut visited, &mut queue, state.path, Movement::SoftDrop,
                state.rotation, state.x, ny, false, None, state.rotation,
            );
        }
    }

    placements
}

#[derive(Clone, Copy)]
struct TwentyGState {
    rotation: Rotation,
    x: i8,
    y: i8,
    path: Path,
    last_move_was_rotation: bool,
    kick_index: Option<usize>,
    rotated_from: Rotation,
}

fn generate_twenty_g(board: &Board, piece: Piece, spawn_rule: SpawnRule) -> Vec<Placement> {
    let spawn_x = piece.spawn_x();
    let spawn_y = piece.spawn_y(spawn_rule);
    let spawn_rotation = Rotation::North;

    let mut placements = Vec::new();
    if !can_place(board, piece, spawn_rotation, spawn_x, spawn_y) {
        return placements;
    }
    let resting_y = hard_drop_y(board, piece, spawn_rotation, spawn_x, spawn_y);

    // Visited only needs (rotation, x): y is always the resting position.
    let mut visited = [[false; VISITED_WIDTH]; 4];
    let mark = |visited: &mut [[bool; VISITED_WIDTH]; 4], rotation: Rotation, x: i8| -> bool {
        let xi = x + X_OFFSET;
        if xi < 0 || xi as usize >= VISITED_WIDTH {
            return false;
        }
        let cell = &mut visited[rotation as usize][xi as usize];
        if *cell {
            false
        } else {
            *cell = true;
            true
        }
    };
    mark(&mut visited, spawn_rotation, spawn_x);

    let mut queue = VecDeque::new();
    queue.push_back(TwentyGState {
        rotation: spawn_rotation,
        x: spawn_x,
        y: resting_y,
        path: Path::new(),
        last_move_was_rotation: false,
        kick_index: None,
        rotated_from: spawn_rotation,
    });

    while let Some(state) = queue.pop_front() {
        let tspin = if state.last_move_was_rotation {
            tspin_classify(
                board,
                piece,
                state.rotation,
                state.x,
                state.y,
                true,
                state.kick_index,
                state.rotated_from,
            )
        } else {
            SpinType::None
        };
        placements.push(
            Placement::new(piece, state.rotation, state.x, state.y)
                .with_tspin(tspin)
                .with_path(state.path),
        );

        let mut try_shift = |dx: i8, movement: Movement, queue: &mut VecDeque<TwentyGState>| {
            if let Some(nx) = shift(board, piece, state.rotation, state.x, state.y, dx) {
                let ny = hard_drop_y(board, piece, state.rotation, nx, state.y);
                if mark(&mut visited, state.rotation, nx) {
                    let mut path = state.path;
                    if path.push(movement) {
                        queue.push_back(TwentyGState {
                            rotation: state.rotation,
                            x: nx,
                            y: ny,
                            path,
                            last_move_was_rotation: false,
                            kick_index: None,
                            rotated_from: state.rotation,
                        });
                    }
                }
            }
        };
        try_shift(-1, Movement::Left, &mut queue);
        try_shift(1, Movement::Right, &mut queue);

        let mut try_rotation = |result: Option<crate::rotation::RotationResult>,
                                 movement: Movement,
                                 queue: &mut VecDeque<TwentyGState>| {
            if let Some(r) = result {
                let ny = hard_drop_y(board, piece, r.new_rotation, r.new_x, r.new_y);
                if mark(&mut visited, r.new_rotation, r.new_x) {
                    let mut path = state.path;
                    if path.push(movement) {
                        queue.push_back(TwentyGState {
                            rotation: r.new_rotation,
                            x: r.new_x,
                            y: ny,
                            path,
                            last_move_was_rotation: true,
                            kick_index: r.kick_index,
                            rotated_from: state.rotation,
                        });
                    }
                }
            }
        };
        try_rotation(
            rotate(board, piece, state.rotation, state.x, state.y, true),
            Movement::Cw,
            &mut queue,
        );
        try_rotation(
            rotate(board, piece, state.rotation, state.x, state.y, false),
            Movement::Ccw,
            &mut queue,
        );
        try_rotation(
            rotate_180(board, piece, state.rotation, state.x, state.y),
            Movement::Rotate180,
            &mut queue,
        );
    }

    placements
}

fn generate_hard_drop_only(board: &Board, piece: Piece, spawn_rule: SpawnRule) -> Vec<Placement> {
    let spawn_x = piece.spawn_x();
    let probe_y = (Board::HEIGHT - 4) as i8;
    let _ = spawn_rule; // spawn row is irrelevant once we probe at a safe height

    let mut placements = Vec::new();
    for (rot_index, &rotation) in ROTATIONS.iter().enumerate() {
        for x in -2..(Board::WIDTH as i8 + 2) {
            if !can_place(board, piece, rotation, x, probe_y) {
                continue;
            }
            let drop_y = hard_drop_y(board, piece, rotation, x, probe_y);

            let mut path = Path::new();
            for _ in 0..rot_index {
                if !path.push(Movement::Cw) {
                    break;
                }
            }
            let diff = x - spawn_x;
            let step = if diff >= 0 { Movement::Right } else { Movement::Left };
            for _ in 0..diff.unsigned_abs() {
                if !path.push(step) {
                    break;
                }
            }
            let _ = path.push(Movement::SoftDrop);

            placements.push(Placement::new(piece, rotation, x, drop_y).with_path(path));
        }
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_g_empty_board_has_placements() {
        let board = Board::new();
        let placements = generate_placements(&board, Piece::T, MovementMode::ZeroG, SpawnRule::Row19Or20);
        assert!(!placements.is_empty());
        for p in &placements {
            assert!(p.anchor_y <= 1);
        }
    }

    #[test]
    fn test_zero_g_all_rotations_present() {
        let board = Board::new();
        let placements = generate_placements(&board, Piece::T, MovementMode::ZeroG, SpawnRule::Row19Or20);
        for r in ROTATIONS {
            assert!(placements.iter().any(|p| p.rotation == r));
        }
    }

    #[test]
    fn test_zero_g_paths_are_capped() {
        let board = Board::new();
        let placements = generate_placements(&board, Piece::I, MovementMode::ZeroG, SpawnRule::Row19Or20);
        for p in &placements {
            assert!(p.path.len() <= fusion_core::MAX_PATH_LEN);
        }
    }

    #[test]
    fn test_twenty_g_matches_resting_positions() {
        let board = Board::new();
        let placements = generate_placements(&board, Piece::O, MovementMode::TwentyG, SpawnRule::Row19Or20);
        assert!(!placements.is_empty());
        for p in &placements {
            let resting = hard_drop_y(&board, Piece::O, p.rotation, p.anchor_x, Board::HEIGHT as i8 - 4);
            assert_eq!(p.anchor_y, resting);
        }
    }

    #[test]
    fn test_hard_drop_only_covers_all_columns() {
        let board = Board::new();
        let placements =
            generate_placements(&board, Piece::O, MovementMode::HardDropOnly, SpawnRule::Row19Or20);
        // O piece has one effective rotation shape and 9 valid x anchors on an empty board.
        let distinct_x: HashSet<i8> = placements.iter().map(|p| p.anchor_x).collect();
        assert_eq!(distinct_x.len(), 9);
    }

    #[test]
    fn test_hard_drop_only_i_piece_empty_board_is_17() {
        // 7 horizontal x-positions + 10 vertical x-positions, with the
        // two horizontal (and two vertical) rotation states of the
        // symmetric I-piece collapsed onto a single footprint each.
        let board = Board::new();
        let placements =
            generate_placements(&board, Piece::I, MovementMode::HardDropOnly, SpawnRule::Row19Or20);
        assert_eq!(placements.len(), 17);
    }

    #[test]
    fn test_zero_g_deduplicates_reached_positions() {
        let board = Board::new();
        let placements = generate_placements(&board, Piece::O, MovementMode::ZeroG, SpawnRule::Row19Or20);
        let mut seen = HashSet::new();
        for p in &placements {
            assert!(seen.insert((p.rotation as u8, p.anchor_x, p.anchor_y)));
        }
    }

    #[test]
    fn test_zero_g_avoids_filled_cells() {
        let mut board = Board::new();
        board.set(0, 0, true);
        board.set(9, 0, true);
        board.set(9, 1, true);
        let placements = generate_placements(&board, Piece::T, MovementMode::ZeroG, SpawnRule::Row19Or20);
        assert!(!placements.is_empty());
        for p in &placements {
            for (x, y) in p.cells() {
                assert!(!board.get(x as usize, y as usize));
            }
        }
    }
}
