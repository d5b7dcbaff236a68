// Core types shared across the colony simulation.
//
// Spatial types come in three flavors: `Vec2` is a continuous world-space
// point (the units workers move in), `TileCoord` addresses one terrain
// surface, and `GridCell` addresses one node of a movement-domain grid
// (which may be finer than the tile grid, see `grid.rs`).
//
// Entity IDs are plain sequential integers handed out by their owning
// registry (`JobBoard`, `Workforce`, `World`). Sequential IDs double as
// insertion order, which the supervisor relies on for stable tie-breaks.
//
// **Critical constraint: determinism.** Everything here is `Copy` and
// totally ordered where it is used as a map key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A point or direction in world space. One tile spans `tile_size` units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance_sq(self, other: Self) -> f32 {
        (self - other).length_sq()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `fallback` for (near) zero input.
    pub fn normalize_or(self, fallback: Self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            fallback
        } else {
            self * (1.0 / len)
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Address of one terrain surface. `x` grows east, `y` grows south.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    /// Orthogonal neighbor offsets in a fixed order: N, E, S, W.
    pub const CARDINALS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbors, in `CARDINALS` order.
    pub fn cardinal_neighbors(self) -> [TileCoord; 4] {
        Self::CARDINALS.map(|(dx, dy)| self.offset(dx, dy))
    }

    /// World-space center of this tile.
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * tile_size,
            (self.y as f32 + 0.5) * tile_size,
        )
    }

    /// Tile containing a world-space point.
    pub fn containing(point: Vec2, tile_size: f32) -> Self {
        Self::new(
            (point.x / tile_size).floor() as i32,
            (point.y / tile_size).floor() as i32,
        )
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Address of one node in a movement-domain grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Entity IDs
// ---------------------------------------------------------------------------

macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident($inner:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

sequential_id!(
    /// A raider or vehicle registered with the `Workforce`.
    WorkerId(u32),
    "worker"
);
sequential_id!(
    /// A job registered with the `JobBoard`.
    JobId(u64),
    "job"
);
sequential_id!(
    /// A building registered with the `World`.
    BuildingId(u32),
    "building"
);
sequential_id!(
    /// A construction site registered with the `World`.
    SiteId(u32),
    "site"
);

// ---------------------------------------------------------------------------
// Qualifications
// ---------------------------------------------------------------------------

/// Hand tools a raider can carry. Vehicles get theirs from their kind and
/// installed upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tool {
    Drill,
    Shovel,
    Hammer,
    Wrench,
}

/// Skills a raider acquires at a training building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Training {
    Driver,
    Engineer,
    Geologist,
    Pilot,
    Sailor,
    Demolition,
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// One of the four traversal-weight grids owned by the `PathFinder`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MovementDomain {
    Walk,
    Drive,
    Fly,
    Swim,
}

impl MovementDomain {
    pub const ALL: [MovementDomain; 4] = [
        MovementDomain::Walk,
        MovementDomain::Drive,
        MovementDomain::Fly,
        MovementDomain::Swim,
    ];

    /// Dense index, used to address per-domain arrays.
    pub const fn index(self) -> usize {
        match self {
            MovementDomain::Walk => 0,
            MovementDomain::Drive => 1,
            MovementDomain::Fly => 2,
            MovementDomain::Swim => 3,
        }
    }
}

/// Movement capability flags reported by a fulfiller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCapabilities {
    pub walk: bool,
    pub drive: bool,
    pub fly: bool,
    pub swim: bool,
}

impl MoveCapabilities {
    pub const NONE: Self = Self {
        walk: false,
        drive: false,
        fly: false,
        swim: false,
    };
    pub const WALK: Self = Self { walk: true, ..Self::NONE };
    pub const DRIVE: Self = Self { drive: true, ..Self::NONE };
    pub const FLY: Self = Self { fly: true, ..Self::NONE };
    pub const SWIM: Self = Self { swim: true, ..Self::NONE };

    /// The single domain these flags select, or `None` when zero or several
    /// flags are set.
    pub fn domain(self) -> Option<MovementDomain> {
        let flagged = [
            (self.walk, MovementDomain::Walk),
            (self.drive, MovementDomain::Drive),
            (self.fly, MovementDomain::Fly),
            (self.swim, MovementDomain::Swim),
        ];
        let mut selected = None;
        for (set, domain) in flagged {
            if set {
                if selected.is_some() {
                    return None;
                }
                selected = Some(domain);
            }
        }
        selected
    }
}

// ---------------------------------------------------------------------------
// Buildings and vehicles
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingType {
    Toolstation,
    TeleportPad,
    Docks,
    PowerStation,
    UpgradeStation,
    Geodome,
    SupportStation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleKind {
    /// Ground vehicle with a built-in drill.
    SmallDigger,
    /// Ground vehicle with a built-in scoop (acts as a shovel).
    LoaderDozer,
    /// Boat; travels on water only.
    RapidRider,
    /// Aircraft; travels over any open floor.
    TunnelScout,
}

impl VehicleKind {
    pub fn capabilities(self) -> MoveCapabilities {
        match self {
            VehicleKind::SmallDigger | VehicleKind::LoaderDozer => MoveCapabilities::DRIVE,
            VehicleKind::RapidRider => MoveCapabilities::SWIM,
            VehicleKind::TunnelScout => MoveCapabilities::FLY,
        }
    }

    /// Tools fitted at the factory.
    pub fn built_in_tools(self) -> &'static [Tool] {
        match self {
            VehicleKind::SmallDigger => &[Tool::Drill],
            VehicleKind::LoaderDozer => &[Tool::Shovel],
            VehicleKind::RapidRider | VehicleKind::TunnelScout => &[],
        }
    }
}

/// Add-ons installed at an upgrade station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleUpgrade {
    Drill,
    Scoop,
}

impl VehicleUpgrade {
    pub fn granted_tool(self) -> Tool {
        match self {
            VehicleUpgrade::Drill => Tool::Drill,
            VehicleUpgrade::Scoop => Tool::Shovel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_center_and_containing_agree() {
        let tile = TileCoord::new(3, 7);
        let center = tile.center(40.0);
        assert_eq!(center, Vec2::new(140.0, 300.0));
        assert_eq!(TileCoord::containing(center, 40.0), tile);
        assert_eq!(TileCoord::containing(Vec2::new(-1.0, 0.0), 40.0), TileCoord::new(-1, 0));
    }

    #[test]
    fn capabilities_select_single_domain() {
        assert_eq!(MoveCapabilities::WALK.domain(), Some(MovementDomain::Walk));
        assert_eq!(MoveCapabilities::SWIM.domain(), Some(MovementDomain::Swim));
        assert_eq!(MoveCapabilities::NONE.domain(), None);
        let amphibious = MoveCapabilities {
            drive: true,
            swim: true,
            ..MoveCapabilities::NONE
        };
        assert_eq!(amphibious.domain(), None);
    }

    #[test]
    fn normalize_falls_back_on_zero() {
        let fallback = Vec2::new(0.0, 1.0);
        assert_eq!(Vec2::ZERO.normalize_or(fallback), fallback);
        let n = Vec2::new(3.0, 4.0).normalize_or(fallback);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ids_display_with_prefix() {
        assert_eq!(JobId(12).to_string(), "job#12");
        assert_eq!(WorkerId(3).to_string(), "worker#3");
    }
}
