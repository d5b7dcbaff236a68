//! Criterion benchmarks for colony path finding.
//!
//! Fixture: a 64x64 tile cave with rock bands every 8 rows, each band
//! pierced by one gap that alternates between the left and right edge, so
//! long routes zig-zag across the whole map.
//!
//!   - astar:        raw A* on the walk grid at three distances
//!   - find_path:    cold (cache miss) and warm (cache hit) queries
//!   - graph_build:  full rebuild of every movement-domain grid
//!
//! Run with: cargo bench -p colony_sim --bench pathfinding

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use colony_sim::config::SimConfig;
use colony_sim::grid::WeightedGrid;
use colony_sim::path::PathTarget;
use colony_sim::path_finder::{surface_weight, PathFinder};
use colony_sim::pathfinding::astar;
use colony_sim::terrain::Terrain;
use colony_sim::types::{GridCell, MoveCapabilities, MovementDomain, TileCoord, Vec2};

const SIZE: usize = 64;

fn cave_rows() -> Vec<String> {
    (0..SIZE)
        .map(|y| {
            if y % 8 != 7 {
                return ".".repeat(SIZE);
            }
            let gap_left = (y / 8) % 2 == 0;
            (0..SIZE)
                .map(|x| {
                    let in_gap = if gap_left { x < 2 } else { x >= SIZE - 2 };
                    if in_gap { '.' } else { '#' }
                })
                .collect()
        })
        .collect()
}

fn fixture() -> (SimConfig, Terrain) {
    let rows = cave_rows();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    (SimConfig::default(), Terrain::from_rows(&refs))
}

/// Walk grid built the same way the path finder builds its own.
fn walk_grid(config: &SimConfig, terrain: &Terrain) -> WeightedGrid {
    let s = config.walk_subdivision as i32;
    let mut grid = WeightedGrid::new(terrain.width() * s, terrain.height() * s);
    for surface in terrain.surfaces() {
        let weight = surface_weight(MovementDomain::Walk, surface, config.rubble_weight);
        for dy in 0..s {
            for dx in 0..s {
                let cell = GridCell::new(surface.tile.x * s + dx, surface.tile.y * s + dy);
                grid.set_weight(cell, weight);
            }
        }
    }
    grid
}

fn center(x: i32, y: i32) -> Vec2 {
    TileCoord::new(x, y).center(40.0)
}

fn bench_astar(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar");
    let (config, terrain) = fixture();
    let grid = walk_grid(&config, &terrain);
    let s = config.walk_subdivision as i32;
    let cell = |x: i32, y: i32| GridCell::new(x * s + 1, y * s + 1);

    for (label, start, goal) in [
        ("same_band", cell(0, 0), cell(40, 5)),
        ("two_bands", cell(10, 0), cell(10, 20)),
        ("cross_map", cell(0, 0), cell(63, 63)),
    ] {
        assert!(astar(&grid, start, goal).is_some(), "{label}: no route");
        group.bench_function(label, |b| {
            b.iter(|| black_box(astar(&grid, start, goal)));
        });
    }
    group.finish();
}

fn bench_find_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    let (config, terrain) = fixture();
    let pristine = PathFinder::new(&config, &terrain, 1);
    let start = center(0, 0);
    let target = PathTarget::at(center(63, 63));

    group.bench_function("cold", |b| {
        b.iter_batched(
            || pristine.clone(),
            |mut pf| black_box(pf.find_path(MoveCapabilities::WALK, start, &target)),
            BatchSize::SmallInput,
        );
    });

    let mut warm = pristine.clone();
    assert!(warm.find_path(MoveCapabilities::WALK, start, &target).is_some());
    group.bench_function("cached", |b| {
        b.iter(|| black_box(warm.find_path(MoveCapabilities::WALK, start, &target)));
    });
    group.finish();
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");
    group.sample_size(20);
    let (config, terrain) = fixture();
    let mut pf = PathFinder::new(&config, &terrain, 1);
    group.bench_function("reset_64x64", |b| {
        b.iter(|| pf.reset_graphs_and_caches(black_box(&terrain)));
    });
    group.finish();
}

criterion_group!(benches, bench_astar, bench_find_path, bench_graph_build);
criterion_main!(benches);
