use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fusion_core::{Board, Piece, SpawnRule};
use fusion_engine::{generate_placements, MovementMode};

fn bench_generate_placements(c: &mut Criterion) {
    let board = Board::new();
    let mut group = c.benchmark_group("generate_placements/empty_board");
    for piece in Piece::ALL {
        for mode in [MovementMode::ZeroG, MovementMode::TwentyG, MovementMode::HardDropOnly] {
            let label = format!("{piece:?}/{mode:?}");
            group.bench_function(label, |b| {
                b.iter(|| {
                    black_box(generate_placements(
                        black_box(&board),
                        black_box(piece),
                        black_box(mode),
                        black_box(SpawnRule::Row19Or20),
                    ))
                });
            });
        }
    }
    group.finish();
}

fn bench_generate_placements_cluttered_board(c: &mut Criterion) {
    let mut board = Board::new();
    // A jagged, mostly-filled stack stresses the BFS's visited-state
    // pruning far more than an empty board does.
    for x in 0..Board::WIDTH {
        let height = 3 + (x * 2) % 7;
        for y in 0..height {
            if (x + y) % 5 != 0 {
                board.set(x, y, true);
            }
        }
    }

    let mut group = c.benchmark_group("generate_placements/cluttered_board");
    for piece in Piece::ALL {
        let label = format!("{piece:?}/ZeroG");
        group.bench_function(label, |b| {
            b.iter(|| {
                black_box(generate_placements(
                    black_box(&board),
                    black_box(piece),
                    black_box(MovementMode::ZeroG),
                    black_box(SpawnRule::Row19Or20),
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generate_placements,
    bench_generate_placements_cluttered_board
);
criterion_main!(benches);
