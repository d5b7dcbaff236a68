// The world view handed to jobs and the supervisor.
//
// `World` bundles the terrain with the two entity kinds jobs need to look
// up when resolving workplaces: buildings (tool pickup, training, vehicle
// upgrades; most require power) and construction sites (workers idling on
// an active site are moved off it). Buildings and sites themselves are
// external collaborators; this module only keeps the handful of fields the
// scheduling core reads.
//
// Jobs receive `&World` on every workplace query and must not cache what
// they read: power and terrain can change between ticks.
//
// See also: `job.rs` for workplace resolution, `supervisor.rs` for the
// construction-site sweep, `terrain.rs` for the surface map.

use crate::terrain::Terrain;
use crate::types::{BuildingId, BuildingType, SiteId, TileCoord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A placed building.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub kind: BuildingType,
    /// The walkable tile workers step onto to use the building.
    pub entrance: TileCoord,
    pub powered: bool,
}

/// A construction site occupying one or more tiles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSite {
    pub id: SiteId,
    pub tiles: Vec<TileCoord>,
    pub complete: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct World {
    pub terrain: Terrain,
    buildings: BTreeMap<BuildingId, Building>,
    sites: BTreeMap<SiteId, BuildSite>,
    next_building: u32,
    next_site: u32,
}

impl World {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            ..Self::default()
        }
    }

    pub fn add_building(
        &mut self,
        kind: BuildingType,
        entrance: TileCoord,
        powered: bool,
    ) -> BuildingId {
        let id = BuildingId(self.next_building);
        self.next_building += 1;
        self.buildings.insert(
            id,
            Building {
                id,
                kind,
                entrance,
                powered,
            },
        );
        id
    }

    pub fn remove_building(&mut self, id: BuildingId) -> Option<Building> {
        self.buildings.remove(&id)
    }

    pub fn set_powered(&mut self, id: BuildingId, powered: bool) {
        if let Some(b) = self.buildings.get_mut(&id) {
            b.powered = powered;
        }
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Buildings of one type, in id order.
    pub fn buildings_of(&self, kind: BuildingType) -> impl Iterator<Item = &Building> {
        self.buildings.values().filter(move |b| b.kind == kind)
    }

    pub fn is_powered(&self, id: BuildingId) -> bool {
        self.buildings.get(&id).is_some_and(|b| b.powered)
    }

    pub fn add_site(&mut self, tiles: Vec<TileCoord>) -> SiteId {
        let id = SiteId(self.next_site);
        self.next_site += 1;
        self.sites.insert(
            id,
            BuildSite {
                id,
                tiles,
                complete: false,
            },
        );
        id
    }

    pub fn complete_site(&mut self, id: SiteId) {
        if let Some(site) = self.sites.get_mut(&id) {
            site.complete = true;
        }
    }

    pub fn site(&self, id: SiteId) -> Option<&BuildSite> {
        self.sites.get(&id)
    }

    /// True when `tile` belongs to a site still under construction.
    pub fn is_on_active_site(&self, tile: TileCoord) -> bool {
        self.sites
            .values()
            .any(|s| !s.complete && s.tiles.contains(&tile))
    }
}
