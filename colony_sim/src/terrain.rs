// Tile terrain: the surface provider consulted by the path finder and jobs.
//
// The terrain is a dense `width x height` array of `Surface`s indexed by
// `x + y * width`. Reads outside the map return an undiscovered solid-rock
// surface (`Terrain::surface`) or `None` (`Terrain::surface_or_none`), so
// callers scanning around the edge of the map never need bounds checks.
//
// Mutations are the ones colony jobs cause: drilling a wall into floor
// (leaving rubble and revealing any cave it opens into), clearing rubble
// and reinforcing walls. Each mutator returns the tiles whose
// path-relevant state changed so the host can forward them to
// `PathFinder::update_surface`.
//
// Generation is out of scope; maps come from `Terrain::new` or, in tests,
// from the character map accepted by `Terrain::from_rows`.
//
// See also: `path_finder.rs` for how surface state becomes grid weights,
// `colony.rs` for the host that applies job outcomes here.

use crate::types::TileCoord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What a terrain tile is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    Ground,
    PowerPath,
    Dirt,
    LooseRock,
    HardRock,
    SolidRock,
    OreSeam,
    CrystalSeam,
    RechargeSeam,
    Water,
    Lava,
}

impl SurfaceType {
    /// Raiders and ground vehicles can stand here.
    pub fn is_walkable(self) -> bool {
        matches!(self, SurfaceType::Ground | SurfaceType::PowerPath)
    }

    /// Not a wall. Aircraft can pass over any floor.
    pub fn is_floor(self) -> bool {
        matches!(
            self,
            SurfaceType::Ground | SurfaceType::PowerPath | SurfaceType::Water | SurfaceType::Lava
        )
    }

    pub fn is_water(self) -> bool {
        self == SurfaceType::Water
    }

    /// Walls a drill (or dynamite) can remove.
    pub fn is_drillable(self) -> bool {
        matches!(
            self,
            SurfaceType::Dirt
                | SurfaceType::LooseRock
                | SurfaceType::HardRock
                | SurfaceType::OreSeam
                | SurfaceType::CrystalSeam
        )
    }

    pub fn is_hard(self) -> bool {
        self == SurfaceType::HardRock
    }
}

/// One terrain cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub tile: TileCoord,
    pub kind: SurfaceType,
    /// Rubble level; 0 means clear. Only meaningful on walkable surfaces.
    pub rubble: u8,
    pub discovered: bool,
    /// Reinforced walls can no longer collapse; purely informational here.
    pub reinforced: bool,
}

impl Surface {
    pub fn new(tile: TileCoord, kind: SurfaceType) -> Self {
        Self {
            tile,
            kind,
            rubble: 0,
            discovered: false,
            reinforced: false,
        }
    }

    pub fn is_walkable(&self) -> bool {
        self.kind.is_walkable()
    }

    pub fn has_rubble(&self) -> bool {
        self.rubble > 0 && self.kind.is_walkable()
    }

    /// A discovered wall that can be drilled right now.
    pub fn is_drillable(&self) -> bool {
        self.discovered && self.kind.is_drillable()
    }

    /// A discovered, drillable wall that has not been reinforced yet.
    pub fn is_reinforceable(&self) -> bool {
        self.is_drillable() && !self.reinforced
    }
}

/// Dense tile map.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Terrain {
    width: i32,
    height: i32,
    surfaces: Vec<Surface>,
}

impl Terrain {
    /// A map filled with one undiscovered surface type.
    pub fn new(width: i32, height: i32, kind: SurfaceType) -> Self {
        let mut surfaces = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
        for y in 0..height {
            for x in 0..width {
                surfaces.push(Surface::new(TileCoord::new(x, y), kind));
            }
        }
        Self {
            width,
            height,
            surfaces,
        }
    }

    /// Build a fully discovered map from rows of characters:
    ///
    /// `.` ground, `=` power path, `r` ground with rubble level 2, `,`
    /// undiscovered ground, `d` dirt, `l` loose rock, `h` hard rock, `#` solid
    /// rock, `o` ore seam, `c` crystal seam, `e` recharge seam, `~` water,
    /// `!` lava. Unknown characters read as solid rock.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut terrain = Self::new(width, height, SurfaceType::SolidRock);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let tile = TileCoord::new(x as i32, y as i32);
                let (kind, rubble, discovered) = match ch {
                    '.' => (SurfaceType::Ground, 0, true),
                    '=' => (SurfaceType::PowerPath, 0, true),
                    'r' => (SurfaceType::Ground, 2, true),
                    ',' => (SurfaceType::Ground, 0, false),
                    'd' => (SurfaceType::Dirt, 0, true),
                    'l' => (SurfaceType::LooseRock, 0, true),
                    'h' => (SurfaceType::HardRock, 0, true),
                    'o' => (SurfaceType::OreSeam, 0, true),
                    'c' => (SurfaceType::CrystalSeam, 0, true),
                    'e' => (SurfaceType::RechargeSeam, 0, true),
                    '~' => (SurfaceType::Water, 0, true),
                    '!' => (SurfaceType::Lava, 0, true),
                    _ => (SurfaceType::SolidRock, 0, true),
                };
                if let Some(s) = terrain.surface_mut(tile) {
                    s.kind = kind;
                    s.rubble = rubble;
                    s.discovered = discovered;
                }
            }
        }
        terrain
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        self.in_bounds(tile)
            .then(|| (tile.x + tile.y * self.width) as usize)
    }

    /// Surface at `tile`. Off-map reads yield undiscovered solid rock.
    pub fn surface(&self, tile: TileCoord) -> Surface {
        self.surface_or_none(tile)
            .copied()
            .unwrap_or_else(|| Surface::new(tile, SurfaceType::SolidRock))
    }

    pub fn surface_or_none(&self, tile: TileCoord) -> Option<&Surface> {
        self.index(tile).map(|i| &self.surfaces[i])
    }

    fn surface_mut(&mut self, tile: TileCoord) -> Option<&mut Surface> {
        self.index(tile).map(move |i| &mut self.surfaces[i])
    }

    /// All surfaces in row-major order.
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    /// Replace a surface's type. Returns `true` if it changed.
    pub fn set_kind(&mut self, tile: TileCoord, kind: SurfaceType) -> bool {
        match self.surface_mut(tile) {
            Some(s) if s.kind != kind => {
                s.kind = kind;
                true
            }
            _ => false,
        }
    }

    /// Turn a drillable wall into ground covered with `rubble_level` rubble
    /// and reveal whatever it opens into. Returns every tile whose state
    /// changed (empty if the wall was not drillable).
    pub fn drill(&mut self, tile: TileCoord, rubble_level: u8) -> Vec<TileCoord> {
        let Some(surface) = self.surface_mut(tile) else {
            return Vec::new();
        };
        if !surface.kind.is_drillable() {
            return Vec::new();
        }
        surface.kind = SurfaceType::Ground;
        surface.rubble = rubble_level;
        surface.reinforced = false;
        surface.discovered = true;

        let mut changed = vec![tile];
        changed.extend(self.discover_from(tile));
        changed
    }

    /// Remove all rubble from a surface. Returns `true` if there was any.
    pub fn clear_rubble(&mut self, tile: TileCoord) -> bool {
        match self.surface_mut(tile) {
            Some(s) if s.rubble > 0 => {
                s.rubble = 0;
                true
            }
            _ => false,
        }
    }

    /// Mark a wall reinforced. Returns `true` if it was reinforceable.
    pub fn reinforce(&mut self, tile: TileCoord) -> bool {
        match self.surface_mut(tile) {
            Some(s) if s.is_reinforceable() => {
                s.reinforced = true;
                true
            }
            _ => false,
        }
    }

    /// Flood-fill discovery from a floor tile: every undiscovered floor
    /// tile connected to `origin` becomes discovered, as do the walls that
    /// border the revealed area. Returns the newly discovered tiles.
    pub fn discover_from(&mut self, origin: TileCoord) -> Vec<TileCoord> {
        let mut revealed = Vec::new();
        if !self.surface(origin).kind.is_floor() {
            return revealed;
        }
        let mut visited = vec![false; self.surfaces.len()];
        let mut queue = VecDeque::new();
        if let Some(i) = self.index(origin) {
            visited[i] = true;
            queue.push_back(origin);
        }
        while let Some(tile) = queue.pop_front() {
            for next in tile.cardinal_neighbors() {
                let Some(i) = self.index(next) else { continue };
                if visited[i] {
                    continue;
                }
                visited[i] = true;
                let surface = &mut self.surfaces[i];
                let was_hidden = !surface.discovered;
                if surface.kind.is_floor() {
                    if was_hidden {
                        surface.discovered = true;
                        revealed.push(next);
                        queue.push_back(next);
                    }
                } else if was_hidden {
                    surface.discovered = true;
                    revealed.push(next);
                }
            }
        }
        revealed
    }
}
