// Data-driven colony configuration.
//
// Every tunable number the simulation reads lives in `SimConfig`, loaded
// from JSON at startup (`SimConfig::from_json`) or taken from `Default`.
// Scheduler cadence, grid resolution, traversal weights, movement speeds and
// work durations are all config, not constants, so balance can change
// without recompiling.
//
// `PriorityList` is the player-facing job priority ordering. It is a plain
// value with a version counter that every edit bumps. The supervisor keeps
// an owned copy, replaces it when handed a list that differs, and looks
// ranks up in that copy on each scheduling pass (see `supervisor.rs`).
//
// See also: `job.rs` for `PriorityIdentifier`, `supervisor.rs` for the
// consumer of the schedule intervals and priorities, `path_finder.rs` for
// the grid parameters.
//
// **Critical constraint: determinism.** Config feeds straight into sim
// logic; two colonies with equal config and seed evolve identically.

use crate::error::ConfigError;
use crate::job::PriorityIdentifier;
use crate::types::{BuildingType, Training, VehicleKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How long each kind of work takes once the worker is at the workplace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkDurations {
    /// Drilling dirt, loose rock and seams.
    pub drill_soft_ms: u32,
    /// Drilling hard rock.
    pub drill_hard_ms: u32,
    pub blast_ms: u32,
    /// Clearing one rubble level; a surface with level 3 takes three times this.
    pub clear_rubble_per_level_ms: u32,
    pub reinforce_ms: u32,
    pub get_tool_ms: u32,
    pub train_ms: u32,
    pub upgrade_ms: u32,
}

/// One entry of the priority list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub key: PriorityIdentifier,
    pub enabled: bool,
}

/// Ordered, versioned list of job priorities. Earlier entries are served
/// first; disabled entries are never scheduled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityList {
    entries: Vec<PriorityEntry>,
    #[serde(default)]
    version: u64,
}

impl PriorityList {
    /// Build a list from keys in rank order, all enabled.
    pub fn from_order(keys: &[PriorityIdentifier]) -> Self {
        Self {
            entries: keys
                .iter()
                .map(|&key| PriorityEntry { key, enabled: true })
                .collect(),
            version: 0,
        }
    }

    pub fn entries(&self) -> &[PriorityEntry] {
        &self.entries
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Rank of an enabled key (0 = served first). `None` when the key is
    /// disabled or absent.
    pub fn rank(&self, key: PriorityIdentifier) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.key == key)
            .filter(|&i| self.entries[i].enabled)
    }

    pub fn is_enabled(&self, key: PriorityIdentifier) -> bool {
        self.rank(key).is_some()
    }

    /// Enable or disable a key. Bumps the version if anything changed.
    pub fn set_enabled(&mut self, key: PriorityIdentifier, enabled: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            if entry.enabled != enabled {
                entry.enabled = enabled;
                self.version += 1;
            }
        }
    }

    /// Move a key one place toward the front. No-op at the front.
    pub fn raise(&mut self, key: PriorityIdentifier) {
        if let Some(i) = self.entries.iter().position(|e| e.key == key) {
            if i > 0 {
                self.entries.swap(i, i - 1);
                self.version += 1;
            }
        }
    }
}

impl Default for PriorityList {
    fn default() -> Self {
        Self::from_order(&[
            PriorityIdentifier::Train,
            PriorityIdentifier::Upgrade,
            PriorityIdentifier::Destruction,
            PriorityIdentifier::Reinforce,
            PriorityIdentifier::Clearing,
        ])
    }
}

/// Top-level configuration. Loaded once; the priority list is the only
/// part meant to change while running, and it changes through
/// `Colony::set_priorities`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// World units per terrain tile edge.
    pub tile_size: f32,

    /// Walking grid cells per tile edge. Walkers path on a finer grid so
    /// groups spread out instead of queueing on tile centers.
    pub walk_subdivision: u32,

    /// Walk-grid weight of a walkable surface carrying rubble. Clear
    /// walkable surfaces weigh 1.
    pub rubble_weight: f32,

    /// Maximum waypoint jitter, as a fraction of the domain's cell size.
    pub waypoint_jitter: f32,

    /// Acceptance radius (world units) for plain move targets.
    pub arrival_radius: f32,

    /// Milliseconds between job-assignment passes of the supervisor.
    pub job_schedule_interval_ms: u32,

    /// Milliseconds between opportunistic rubble scans.
    pub rubble_scan_interval_ms: u32,

    /// Largest ring radius (in tiles) searched by the rubble scan.
    pub rubble_scan_radius: i32,

    /// Largest ring radius (in tiles) searched for a free tile when an idle
    /// worker has to step off a construction site.
    #[serde(default = "default_off_site_search_radius")]
    pub off_site_search_radius: i32,

    /// Rubble level left behind by drilling or blasting a wall.
    pub drilled_rubble_level: u8,

    /// When one terrain edit changes more surfaces than this, the path
    /// graphs are rebuilt instead of patched surface by surface.
    pub full_rebuild_threshold: usize,

    /// Raider walking speed in world units per second.
    pub raider_speed: f32,

    /// Vehicle speeds in world units per second.
    pub vehicle_speeds: BTreeMap<VehicleKind, f32>,

    pub work: WorkDurations,

    /// Which building trains which skill.
    pub training_sites: BTreeMap<Training, BuildingType>,

    pub priorities: PriorityList,
}

impl SimConfig {
    /// Parse and validate a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the grid math cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size.partial_cmp(&0.0) != Some(Ordering::Greater) {
            return Err(ConfigError::Invalid {
                field: "tile_size",
                reason: "must be positive",
            });
        }
        if self.walk_subdivision == 0 {
            return Err(ConfigError::Invalid {
                field: "walk_subdivision",
                reason: "must be at least 1",
            });
        }
        if self.rubble_weight.partial_cmp(&1.0).is_none_or(|o| o == Ordering::Less) {
            return Err(ConfigError::Invalid {
                field: "rubble_weight",
                reason: "must be at least 1",
            });
        }
        if self.rubble_scan_radius < 0 {
            return Err(ConfigError::Invalid {
                field: "rubble_scan_radius",
                reason: "must not be negative",
            });
        }
        if self.off_site_search_radius < 0 {
            return Err(ConfigError::Invalid {
                field: "off_site_search_radius",
                reason: "must not be negative",
            });
        }
        Ok(())
    }

    /// Movement speed for a vehicle kind; falls back to the raider speed.
    pub fn vehicle_speed(&self, kind: VehicleKind) -> f32 {
        self.vehicle_speeds
            .get(&kind)
            .copied()
            .unwrap_or(self.raider_speed)
    }
}

fn default_off_site_search_radius() -> i32 {
    3
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut vehicle_speeds = BTreeMap::new();
        vehicle_speeds.insert(VehicleKind::SmallDigger, 60.0);
        vehicle_speeds.insert(VehicleKind::LoaderDozer, 45.0);
        vehicle_speeds.insert(VehicleKind::RapidRider, 80.0);
        vehicle_speeds.insert(VehicleKind::TunnelScout, 120.0);

        let mut training_sites = BTreeMap::new();
        training_sites.insert(Training::Driver, BuildingType::Toolstation);
        training_sites.insert(Training::Engineer, BuildingType::UpgradeStation);
        training_sites.insert(Training::Geologist, BuildingType::Geodome);
        training_sites.insert(Training::Pilot, BuildingType::TeleportPad);
        training_sites.insert(Training::Sailor, BuildingType::Docks);
        training_sites.insert(Training::Demolition, BuildingType::SupportStation);

        Self {
            tile_size: 40.0,
            walk_subdivision: 3,
            rubble_weight: 4.0,
            waypoint_jitter: 0.2,
            arrival_radius: 2.0,
            job_schedule_interval_ms: 1000,
            rubble_scan_interval_ms: 5000,
            rubble_scan_radius: 9,
            off_site_search_radius: default_off_site_search_radius(),
            drilled_rubble_level: 2,
            full_rebuild_threshold: 64,
            raider_speed: 50.0,
            vehicle_speeds,
            work: WorkDurations {
                drill_soft_ms: 3000,
                drill_hard_ms: 8000,
                blast_ms: 2000,
                clear_rubble_per_level_ms: 1500,
                reinforce_ms: 2500,
                get_tool_ms: 500,
                train_ms: 4000,
                upgrade_ms: 5000,
            },
            training_sites,
            priorities: PriorityList::default(),
        }
    }
}
