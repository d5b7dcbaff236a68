// colony_sim: worker pathing and job scheduling for a mining colony.
//
// This crate simulates a colony of raiders and vehicles on a tile map:
// where they can go (one weighted grid per movement domain, A* search,
// cached routes, curved path following) and what they do (jobs with tool
// and training requirements, a priority-driven supervisor that inserts
// prerequisite errands, and a per-tick work loop). It has no rendering,
// audio or input code and runs headless.
//
// Module overview:
// - `colony.rs`:      Colony host: owns everything, `update(elapsed_ms)` tick, player commands.
// - `supervisor.rs`:  Job queue, priority ordering, greedy assignment, rubble scan.
// - `work.rs`:        Per-tick work loop driving one worker through its job.
// - `job.rs`:         JobKind / Job state machine / JobBoard / PriorityIdentifier.
// - `fulfiller.rs`:   Fulfiller trait, Raider, Vehicle, Workforce registry.
// - `path_finder.rs`: Per-domain grids, route cache, jitter, terrain sync.
// - `path.rs`:        PathTarget, TargetCondition, TerrainPath stepping.
// - `segment.rs`:     Cubic Bézier path segment with arclength table.
// - `pathfinding.rs`: A* over a weighted grid.
// - `grid.rs`:        WeightedGrid, 8-connected steps without corner cutting.
// - `terrain.rs`:     Surface types, tile map, drilling and cave discovery.
// - `world.rs`:       Terrain plus buildings and construction sites.
// - `event.rs`:       JobEvent (board -> supervisor) and ColonyEvent (tick output).
// - `config.rs`:      SimConfig + PriorityList, JSON loading.
// - `error.rs`:       JobError and ConfigError.
// - `prng`:           Re-exported from `colony_prng`; xoshiro256++ PRNG with SplitMix64 seeding.
// - `types.rs`:       Vec2, TileCoord, GridCell, entity IDs, tools, trainings, capabilities.
//
// **Critical constraint: determinism.** A colony is a pure function of its
// seed, config, initial terrain and the commands and ticks applied to it.
// All randomness comes from the seeded PRNG. Anything iterated lives in a
// `BTreeMap` or `Vec`; the only hash map is the path cache, which is
// looked up by key and never iterated.

pub mod colony;
pub mod config;
pub mod error;
pub mod event;
pub mod fulfiller;
pub mod grid;
pub mod job;
pub mod path;
pub mod path_finder;
pub mod pathfinding;
pub use colony_prng as prng;
pub mod segment;
pub mod supervisor;
pub mod terrain;
pub mod types;
pub mod work;
pub mod world;
