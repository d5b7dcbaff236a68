// Path finder and path follower behavior across module boundaries:
// route shape on open ground, cache consistency under terrain edits,
// and step-size independence of path following.

use colony_sim::config::SimConfig;
use colony_sim::path::{PathTarget, TerrainPath};
use colony_sim::path_finder::PathFinder;
use colony_sim::terrain::{SurfaceType, Terrain};
use colony_sim::types::{MoveCapabilities, MovementDomain, TileCoord, Vec2};

const TILE: f32 = 40.0;

fn open_rows(width: usize, height: usize) -> Vec<String> {
    vec![".".repeat(width); height]
}

fn terrain(rows: &[String]) -> Terrain {
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    Terrain::from_rows(&refs)
}

fn center(x: i32, y: i32) -> Vec2 {
    TileCoord::new(x, y).center(TILE)
}

fn unjittered() -> SimConfig {
    SimConfig {
        waypoint_jitter: 0.0,
        ..SimConfig::default()
    }
}

/// Walked distance: start to each waypoint in turn.
fn hop_length(start: Vec2, path: &TerrainPath) -> f32 {
    let mut prev = start;
    let mut total = 0.0;
    for &wp in path.waypoints() {
        total += prev.distance(wp);
        prev = wp;
    }
    total
}

#[test]
fn open_ten_by_ten_diagonal() {
    let config = SimConfig::default();
    let terrain = terrain(&open_rows(10, 10));
    let mut pf = PathFinder::new(&config, &terrain, 42);

    let start = center(0, 0);
    let goal = center(9, 9);
    let path = pf
        .find_path(MoveCapabilities::WALK, start, &PathTarget::at(goal))
        .expect("open grid is connected");

    assert!(path.waypoints().len() <= 12);
    assert_eq!(path.waypoints().back(), Some(&goal));

    let straight = start.distance_sq(goal);
    let jitter = config.waypoint_jitter * TILE / config.walk_subdivision as f32;
    let tolerance = 2.0 * straight.sqrt() * jitter * path.waypoints().len() as f32 + 1e-2;
    assert!((path.length_sq() - straight).abs() <= tolerance.max(straight * 0.05));
}

#[test]
fn repeated_queries_share_cached_route() {
    let config = SimConfig::default();
    let rows = vec![
        "........".to_string(),
        ".######.".to_string(),
        "........".to_string(),
    ];
    let terrain = terrain(&rows);
    let mut pf = PathFinder::new(&config, &terrain, 5);
    let target = PathTarget::at(center(7, 2));

    let first = pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).unwrap();
    let second = pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).unwrap();
    assert_eq!(first.waypoints(), second.waypoints());
    assert_eq!(first.length_sq(), second.length_sq());
    assert_eq!(pf.cached_route_count(), 1);
}

#[test]
fn terrain_change_invalidates_cache_and_reroutes() {
    let config = SimConfig::default();
    let rows = vec!["...d...".to_string(), "###.###".to_string(), ".......".to_string()];
    let mut terrain = terrain(&rows);
    let mut pf = PathFinder::new(&config, &terrain, 9);
    let target = PathTarget::at(center(6, 0));

    // The dirt wall at (3, 0) cuts the top row. The gap at (3, 1) only
    // joins the bottom row, with no diagonal past the wall corners.
    assert!(pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).is_none());

    for tile in terrain.drill(TileCoord::new(3, 0), 0) {
        pf.update_surface(&terrain.surface(tile));
    }
    let path = pf
        .find_path(MoveCapabilities::WALK, center(0, 0), &target)
        .expect("drilled wall opens the row");
    assert_eq!(path.waypoints().len(), 1);
    assert_eq!(pf.cached_route_count(), 1);

    // Rubble makes the row heavier but not impassable for walkers, and
    // impassable for drivers.
    let mut rubble = terrain.surface(TileCoord::new(3, 0));
    rubble.rubble = 3;
    assert!(pf.update_surface(&rubble));
    assert_eq!(pf.cached_route_count(), 0);
    assert_eq!(pf.weight_at(MovementDomain::Walk, center(3, 0)), config.rubble_weight);
    assert_eq!(pf.weight_at(MovementDomain::Drive, center(3, 0)), 0.0);
    assert!(pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).is_some());
    assert!(pf.find_path(MoveCapabilities::DRIVE, center(0, 0), &target).is_none());
}

#[test]
fn detours_cost_at_most_one_tile_diagonal_per_obstacle() {
    let config = unjittered();
    let diagonal = TILE * std::f32::consts::SQRT_2;
    let cases: [(&[&str], i32, usize); 3] = [
        (&["........", "........", "........"], 7, 0),
        (&["........", "...#....", "........"], 7, 1),
        (&["..........", "...#..#...", ".........."], 9, 2),
    ];
    for (rows, goal_x, obstacles) in cases {
        let terrain = Terrain::from_rows(rows);
        let mut pf = PathFinder::new(&config, &terrain, 13);
        let (start, goal) = (center(0, 1), center(goal_x, 1));
        let path = pf
            .find_path(MoveCapabilities::WALK, start, &PathTarget::at(goal))
            .expect("row is connected");
        let walked = hop_length(start, &path);
        let straight = start.distance(goal);
        assert!(walked >= straight - 1e-3, "{walked} < {straight}");
        assert!(
            walked <= straight + diagonal * obstacles as f32 + 1e-3,
            "{obstacles} obstacles: {walked} vs {straight}"
        );
    }
}

#[test]
fn blocked_cell_is_never_routed_through_after_update() {
    let config = unjittered();
    let mut terrain = terrain(&open_rows(7, 3));
    let mut pf = PathFinder::new(&config, &terrain, 4);
    let start = center(0, 1);
    let target = PathTarget::at(center(6, 1));

    let straight = pf.find_path(MoveCapabilities::WALK, start, &target).unwrap();
    assert_eq!(straight.waypoints().len(), 1);
    assert_eq!(pf.cached_route_count(), 1);

    let blocked = TileCoord::new(3, 1);
    assert!(terrain.set_kind(blocked, SurfaceType::SolidRock));
    assert!(pf.update_surface(&terrain.surface(blocked)));
    assert_eq!(pf.cached_route_count(), 0);

    let detour = pf.find_path(MoveCapabilities::WALK, start, &target).unwrap();
    assert!(detour.waypoints().len() > 1);
    let mut prev = start;
    for &wp in detour.waypoints() {
        // Odd sample count keeps samples off cell corners.
        for i in 0..=49 {
            let p = prev.lerp(wp, i as f32 / 49.0);
            let tile = TileCoord::containing(p, TILE);
            assert_ne!(tile, blocked, "hop {prev} -> {wp} crosses {p}");
            assert!(pf.weight_at(MovementDomain::Walk, p) > 0.0);
        }
        prev = wp;
    }
}

#[test]
fn reset_rebuilds_from_terrain() {
    let config = SimConfig::default();
    let rows = vec!["..,,..".to_string()];
    let mut terrain = terrain(&rows);
    let mut pf = PathFinder::new(&config, &terrain, 1);
    let target = PathTarget::at(center(5, 0));
    assert!(pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).is_none());

    terrain.discover_from(TileCoord::new(1, 0));
    pf.reset_graphs_and_caches(&terrain);
    assert!(pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).is_some());
}

#[test]
fn small_steps_match_one_large_step() {
    let config = SimConfig::default();
    let rows = vec![
        "........".to_string(),
        "....#...".to_string(),
        "....#...".to_string(),
        "........".to_string(),
    ];
    let terrain = terrain(&rows);
    let mut pf = PathFinder::new(&config, &terrain, 77);
    let target = PathTarget::at(center(7, 1));
    let heading = Vec2::new(1.0, 0.0);

    let mut split = pf.find_path(MoveCapabilities::WALK, center(0, 1), &target).unwrap();
    let mut whole = split.clone();

    let (mut pos, mut dir) = (center(0, 1), heading);
    for _ in 0..40 {
        let step = split.step(pos, dir, 2.5);
        pos = step.position;
        dir = step.direction;
    }
    let single = whole.step(center(0, 1), heading, 100.0);

    assert!(pos.distance(single.position) < 0.05, "{pos} vs {}", single.position);
    assert_eq!(split.waypoints().len(), whole.waypoints().len());
}

#[test]
fn acceptance_radius_stop_matches_across_step_sizes() {
    let config = SimConfig::default();
    let terrain = terrain(&open_rows(8, 1));
    let mut pf = PathFinder::new(&config, &terrain, 2);
    let target = PathTarget::at(center(7, 0)).with_radius(8.0);
    let heading = Vec2::new(1.0, 0.0);

    let mut split = pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).unwrap();
    let mut whole = split.clone();

    let (mut pos, mut dir) = (center(0, 0), heading);
    for _ in 0..200 {
        let step = split.step(pos, dir, 2.5);
        pos = step.position;
        dir = step.direction;
    }
    let single = whole.step(center(0, 0), heading, 500.0);

    assert!(single.target_reached);
    assert!(pos.distance(single.position) < 0.05, "{pos} vs {}", single.position);
    assert!(target.is_reached(single.position));
}

#[test]
fn reached_target_stays_reached() {
    let config = SimConfig::default();
    let terrain = terrain(&open_rows(4, 1));
    let mut pf = PathFinder::new(&config, &terrain, 3);
    let target = PathTarget::at(center(3, 0)).with_radius(4.0);
    let mut path = pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).unwrap();

    let first = path.step(center(0, 0), Vec2::new(1.0, 0.0), 500.0);
    assert!(first.target_reached);
    for _ in 0..3 {
        let again = path.step(first.position, first.direction, 10.0);
        assert!(again.target_reached);
        assert_eq!(again.position, first.position);
    }
}
