// Multi-domain path finder with route caching.
//
// The `PathFinder` owns one `WeightedGrid` per movement domain (walk, drive,
// fly, swim) and keeps them in sync with the terrain. A worker's capability
// flags pick exactly one grid; the rest of a query runs against it:
//
// 1. Snap start and target location to cells at the domain's resolution.
//    Walkers use a grid `walk_subdivision` times finer than the tile grid;
//    the other domains use one cell per tile.
// 2. Same cell: return a one-hop path straight to the target.
// 3. Look up `(start_cell, end_cell)` in the domain's route cache. On a
//    miss, run A*, drop the start cell, drop interior cells that continue
//    in the same grid direction, place the rest at their cell centers plus
//    a small random offset, strip the final cell and cache the result.
// 4. Wrap the cached waypoints and the exact target into a `TerrainPath`.
//
// The random offset spreads out workers that follow the same route. It is
// drawn once per cache miss, so every worker reusing a cached route follows
// the same offset waypoints.
//
// Terrain edits call `update_surface` for each changed tile, which rewrites
// the affected cells and drops every route cache if any weight actually
// changed. Bulk edits call `reset_graphs_and_caches`.
//
// See also: `grid.rs` for the weight grid, `pathfinding.rs` for A*,
// `path.rs` for the returned `TerrainPath`.
//
// **Critical constraint: determinism.** The jitter RNG is seeded from the
// colony seed and only advanced on cache misses. The route cache is an
// `FxHashMap` because it is only ever looked up by key, never iterated.

use crate::config::SimConfig;
use crate::grid::WeightedGrid;
use crate::path::{PathTarget, TerrainPath};
use crate::pathfinding;
use crate::prng::ColonyRng;
use crate::terrain::{Surface, Terrain};
use crate::types::{GridCell, MoveCapabilities, MovementDomain, Vec2};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// Traversal weight of `surface` in `domain`. 0 means impassable.
pub fn surface_weight(domain: MovementDomain, surface: &Surface, rubble_weight: f32) -> f32 {
    if !surface.discovered {
        return 0.0;
    }
    let passable = match domain {
        MovementDomain::Walk => {
            if surface.is_walkable() && surface.has_rubble() {
                return rubble_weight;
            }
            surface.is_walkable()
        }
        MovementDomain::Drive => surface.is_walkable() && !surface.has_rubble(),
        MovementDomain::Fly => surface.kind.is_floor(),
        MovementDomain::Swim => surface.kind.is_water(),
    };
    if passable { 1.0 } else { 0.0 }
}

/// One domain's grid and route cache.
#[derive(Clone, Debug)]
struct DomainGraph {
    domain: MovementDomain,
    grid: WeightedGrid,
    /// Grid cells per tile edge.
    subdivision: i32,
    cell_size: f32,
    routes: FxHashMap<(GridCell, GridCell), Vec<Vec2>>,
}

impl DomainGraph {
    fn new(domain: MovementDomain, subdivision: i32, tile_size: f32) -> Self {
        Self {
            domain,
            grid: WeightedGrid::default(),
            subdivision,
            cell_size: tile_size / subdivision as f32,
            routes: FxHashMap::default(),
        }
    }

    fn rebuild(&mut self, terrain: &Terrain, rubble_weight: f32) {
        let s = self.subdivision;
        self.grid = WeightedGrid::new(terrain.width() * s, terrain.height() * s);
        for surface in terrain.surfaces() {
            self.write_surface(surface, rubble_weight);
        }
        self.routes.clear();
    }

    /// Write every cell covered by `surface`. Returns true on any change.
    fn write_surface(&mut self, surface: &Surface, rubble_weight: f32) -> bool {
        let weight = surface_weight(self.domain, surface, rubble_weight);
        let s = self.subdivision;
        let mut changed = false;
        for dy in 0..s {
            for dx in 0..s {
                let cell = GridCell::new(surface.tile.x * s + dx, surface.tile.y * s + dy);
                changed |= self.grid.set_weight(cell, weight);
            }
        }
        changed
    }

    fn cell_for(&self, point: Vec2) -> GridCell {
        GridCell::new(
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    fn cell_center(&self, cell: GridCell) -> Vec2 {
        Vec2::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
        )
    }
}

#[derive(Clone, Debug)]
pub struct PathFinder {
    graphs: [DomainGraph; 4],
    rubble_weight: f32,
    jitter: f32,
    rng: ColonyRng,
}

impl PathFinder {
    pub fn new(config: &SimConfig, terrain: &Terrain, seed: u64) -> Self {
        let walk = config.walk_subdivision.max(1) as i32;
        let graphs = MovementDomain::ALL.map(|domain| {
            let subdivision = if domain == MovementDomain::Walk { walk } else { 1 };
            DomainGraph::new(domain, subdivision, config.tile_size)
        });
        let mut finder = Self {
            graphs,
            rubble_weight: config.rubble_weight,
            jitter: config.waypoint_jitter,
            rng: ColonyRng::new(seed),
        };
        finder.reset_graphs_and_caches(terrain);
        finder
    }

    /// Rebuild every grid from scratch and drop all cached routes.
    pub fn reset_graphs_and_caches(&mut self, terrain: &Terrain) {
        for graph in &mut self.graphs {
            graph.rebuild(terrain, self.rubble_weight);
        }
        debug!("path finder rebuilt for {}x{} terrain", terrain.width(), terrain.height());
    }

    /// Re-derive the cells covered by one surface in every grid. Returns
    /// true if any weight changed, in which case all cached routes are gone.
    pub fn update_surface(&mut self, surface: &Surface) -> bool {
        let mut any = false;
        for graph in &mut self.graphs {
            any |= graph.write_surface(surface, self.rubble_weight);
        }
        if any {
            for graph in &mut self.graphs {
                graph.routes.clear();
            }
            debug!("surface {} changed weights; route caches dropped", surface.tile);
        }
        any
    }

    /// Weight of the grid cell containing `point` in `domain`.
    pub fn weight_at(&self, domain: MovementDomain, point: Vec2) -> f32 {
        let graph = &self.graphs[domain.index()];
        graph.grid.weight(graph.cell_for(point))
    }

    /// Number of cached routes across all domains.
    pub fn cached_route_count(&self) -> usize {
        self.graphs.iter().map(|g| g.routes.len()).sum()
    }

    /// Route from `start` to `target` for a worker with `capabilities`.
    pub fn find_path(
        &mut self,
        capabilities: MoveCapabilities,
        start: Vec2,
        target: &PathTarget,
    ) -> Option<TerrainPath> {
        let Some(domain) = capabilities.domain() else {
            warn!(
                "unsupported movement capabilities {:?}; using a direct path to {}",
                capabilities, target.location
            );
            return Some(TerrainPath::direct(start, target.clone()));
        };

        let Self { graphs, jitter, rng, .. } = self;
        let graph = &mut graphs[domain.index()];
        let from = graph.cell_for(start);
        let to = graph.cell_for(target.location);
        if !graph.grid.in_bounds(from) || !graph.grid.in_bounds(to) {
            return None;
        }
        if from == to {
            return Some(TerrainPath::direct(start, target.clone()));
        }

        let waypoints = match graph.routes.get(&(from, to)) {
            Some(cached) => cached.clone(),
            None => {
                let route = pathfinding::astar(&graph.grid, from, to)?;
                let amplitude = *jitter * graph.cell_size;
                let mut waypoints: Vec<Vec2> = simplify(&route.cells)
                    .into_iter()
                    .map(|cell| {
                        let center = graph.cell_center(cell);
                        Vec2::new(
                            center.x + rng.symmetric_f32(amplitude),
                            center.y + rng.symmetric_f32(amplitude),
                        )
                    })
                    .collect();
                waypoints.pop();
                graph.routes.insert((from, to), waypoints.clone());
                waypoints
            }
        };

        Some(TerrainPath::new(start, target.clone(), waypoints))
    }

    /// Route to whichever of `targets` yields the smallest `length_sq`.
    /// The earliest target wins ties.
    pub fn find_shortest_path(
        &mut self,
        capabilities: MoveCapabilities,
        start: Vec2,
        targets: &[PathTarget],
    ) -> Option<TerrainPath> {
        let mut best: Option<TerrainPath> = None;
        for target in targets {
            let Some(path) = self.find_path(capabilities, start, target) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| path.length_sq() < b.length_sq()) {
                best = Some(path);
            }
        }
        best
    }
}

/// Cells after the start, keeping only those where the path turns and the
/// final cell.
fn simplify(cells: &[GridCell]) -> Vec<GridCell> {
    let mut out = Vec::new();
    for i in 1..cells.len() {
        if let Some(next) = cells.get(i + 1) {
            let incoming = (cells[i].x - cells[i - 1].x, cells[i].y - cells[i - 1].y);
            let outgoing = (next.x - cells[i].x, next.y - cells[i].y);
            if incoming == outgoing {
                continue;
            }
        }
        out.push(cells[i]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::SurfaceType;
    use crate::types::TileCoord;

    fn finder(rows: &[&str]) -> (PathFinder, Terrain, SimConfig) {
        let config = SimConfig::default();
        let terrain = Terrain::from_rows(rows);
        (PathFinder::new(&config, &terrain, 7), terrain, config)
    }

    fn center(x: i32, y: i32) -> Vec2 {
        TileCoord::new(x, y).center(40.0)
    }

    #[test]
    fn weights_follow_domain_rules() {
        let ground = Surface {
            discovered: true,
            ..Surface::new(TileCoord::new(0, 0), SurfaceType::Ground)
        };
        let rubble = Surface { rubble: 2, ..ground };
        let water = Surface {
            kind: SurfaceType::Water,
            ..ground
        };
        let hidden = Surface {
            discovered: false,
            ..ground
        };
        assert_eq!(surface_weight(MovementDomain::Walk, &ground, 4.0), 1.0);
        assert_eq!(surface_weight(MovementDomain::Walk, &rubble, 4.0), 4.0);
        assert_eq!(surface_weight(MovementDomain::Drive, &rubble, 4.0), 0.0);
        assert_eq!(surface_weight(MovementDomain::Fly, &water, 4.0), 1.0);
        assert_eq!(surface_weight(MovementDomain::Swim, &water, 4.0), 1.0);
        assert_eq!(surface_weight(MovementDomain::Swim, &ground, 4.0), 0.0);
        assert_eq!(surface_weight(MovementDomain::Walk, &hidden, 4.0), 0.0);
    }

    #[test]
    fn same_cell_is_a_direct_hop() {
        let (mut pf, _, _) = finder(&["..."]);
        let start = center(1, 0);
        let goal = start + Vec2::new(1.0, 1.0);
        let path = pf
            .find_path(MoveCapabilities::WALK, start, &PathTarget::at(goal))
            .unwrap();
        assert_eq!(path.waypoints().len(), 1);
        assert_eq!(path.waypoints()[0], goal);
        assert_eq!(pf.cached_route_count(), 0);
    }

    #[test]
    fn routes_are_cached_per_cell_pair() {
        let (mut pf, _, _) = finder(&["....", "....", "...."]);
        let target = PathTarget::at(center(3, 2));
        let a = pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).unwrap();
        assert_eq!(pf.cached_route_count(), 1);
        let b = pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).unwrap();
        assert_eq!(pf.cached_route_count(), 1);
        assert_eq!(a.waypoints(), b.waypoints());
    }

    #[test]
    fn blocked_target_has_no_path() {
        let (mut pf, _, _) = finder(&["..#.."]);
        let target = PathTarget::at(center(4, 0));
        assert!(pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).is_none());
        let wall = PathTarget::at(center(2, 0));
        assert!(pf.find_path(MoveCapabilities::WALK, center(0, 0), &wall).is_none());
        let off_map = PathTarget::at(Vec2::new(-50.0, 10.0));
        assert!(pf.find_path(MoveCapabilities::WALK, center(0, 0), &off_map).is_none());
    }

    #[test]
    fn update_surface_opens_route_and_drops_cache() {
        let (mut pf, mut terrain, _) = finder(&[".d.", "...", "..."]);
        let target = PathTarget::at(center(2, 0));
        pf.find_path(MoveCapabilities::WALK, center(0, 0), &target).unwrap();
        assert_eq!(pf.cached_route_count(), 1);

        terrain.drill(TileCoord::new(1, 0), 0);
        assert!(pf.update_surface(&terrain.surface(TileCoord::new(1, 0))));
        assert_eq!(pf.cached_route_count(), 0);
        assert!(!pf.update_surface(&terrain.surface(TileCoord::new(1, 0))));
    }

    #[test]
    fn unsupported_capabilities_fall_back_to_direct_path() {
        let (mut pf, _, _) = finder(&["..#.."]);
        let both = MoveCapabilities {
            walk: true,
            fly: true,
            ..MoveCapabilities::NONE
        };
        let target = PathTarget::at(center(4, 0));
        let path = pf.find_path(both, center(0, 0), &target).unwrap();
        assert_eq!(path.waypoints().len(), 1);
        let none = pf.find_path(MoveCapabilities::NONE, center(0, 0), &target).unwrap();
        assert_eq!(none.waypoints().len(), 1);
    }

    #[test]
    fn shortest_path_prefers_nearer_target() {
        let (mut pf, _, _) = finder(&["......."]);
        let far = PathTarget::at(center(6, 0));
        let near = PathTarget::at(center(2, 0));
        let path = pf
            .find_shortest_path(MoveCapabilities::WALK, center(0, 0), &[far, near.clone()])
            .unwrap();
        assert_eq!(path.target(), &near);
    }

    #[test]
    fn boats_stay_on_water() {
        let (mut pf, _, _) = finder(&["~~~", ".~.", "~~~"]);
        let target = PathTarget::at(center(2, 2));
        assert!(pf.find_path(MoveCapabilities::SWIM, center(0, 0), &target).is_some());
        let land = PathTarget::at(center(0, 1));
        assert!(pf.find_path(MoveCapabilities::SWIM, center(0, 0), &land).is_none());
    }

    #[test]
    fn simplify_keeps_turns_and_goal() {
        let cells = [
            GridCell::new(0, 0),
            GridCell::new(1, 0),
            GridCell::new(2, 0),
            GridCell::new(3, 1),
            GridCell::new(4, 2),
        ];
        assert_eq!(
            simplify(&cells),
            vec![GridCell::new(2, 0), GridCell::new(4, 2)]
        );
    }
}
