// Path targets and incremental path following.
//
// A `PathTarget` says where a worker should end up: a location, an
// acceptance radius (stored squared), an optional focus point the worker
// should face on arrival, and a `TargetCondition` that decides whether the
// target is still meaningful (the building is powered, the wall is still
// there, the rubble has not been cleared by someone else).
//
// A `TerrainPath` is what the path finder hands back: the target plus the
// ordered waypoints still to visit. The last waypoint is always the exact
// target location. `step` moves a worker along the path by a distance,
// popping waypoints as they are reached and building one `PathSegment`
// curve at a time. Distance left over after a segment finishes flows into
// the next one within the same call.
//
// The acceptance radius is checked where a new segment starts and, on the
// last segment, by arclength: the worker stops where the curve still has
// `radius` to go. Once reached the remaining waypoints are dropped, so a
// path is exhausted exactly when its target is reached.
//
// See also: `segment.rs` for the curve math, `path_finder.rs` for how paths
// are built, `work.rs` for the per-tick caller.

use crate::segment::PathSegment;
use crate::types::{BuildingId, TileCoord, Vec2};
use crate::world::World;
use std::collections::VecDeque;

/// When a target is still worth travelling to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetCondition {
    Always,
    BuildingPowered(BuildingId),
    Drillable(TileCoord),
    HasRubble(TileCoord),
    Reinforceable(TileCoord),
}

impl TargetCondition {
    pub fn holds(self, world: &World) -> bool {
        match self {
            TargetCondition::Always => true,
            TargetCondition::BuildingPowered(id) => world.is_powered(id),
            TargetCondition::Drillable(tile) => world.terrain.surface(tile).is_drillable(),
            TargetCondition::HasRubble(tile) => {
                let s = world.terrain.surface(tile);
                s.discovered && s.has_rubble()
            }
            TargetCondition::Reinforceable(tile) => world.terrain.surface(tile).is_reinforceable(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathTarget {
    pub location: Vec2,
    /// Squared acceptance radius around `location`.
    pub radius_sq: f32,
    /// Point to face once the target is reached.
    pub focus: Option<Vec2>,
    pub condition: TargetCondition,
}

impl PathTarget {
    /// An exact point that is always valid.
    pub fn at(location: Vec2) -> Self {
        Self {
            location,
            radius_sq: 0.0,
            focus: None,
            condition: TargetCondition::Always,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius_sq = radius * radius;
        self
    }

    pub fn with_focus(mut self, focus: Vec2) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn with_condition(mut self, condition: TargetCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn is_reached(&self, position: Vec2) -> bool {
        position.distance_sq(self.location) <= self.radius_sq
    }

    pub fn is_valid(&self, world: &World) -> bool {
        self.condition.holds(world)
    }
}

/// Outcome of one `TerrainPath::step`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStep {
    pub position: Vec2,
    pub direction: Vec2,
    /// Step distance not used because the target was reached first.
    pub remaining: f32,
    pub target_reached: bool,
}

#[derive(Clone, Debug)]
pub struct TerrainPath {
    target: PathTarget,
    waypoints: VecDeque<Vec2>,
    length_sq: f32,
    segment: Option<PathSegment>,
}

impl TerrainPath {
    /// Path from `start` through `intermediate` to the target location.
    pub fn new(start: Vec2, target: PathTarget, intermediate: Vec<Vec2>) -> Self {
        let mut waypoints: VecDeque<Vec2> = intermediate.into();
        waypoints.push_back(target.location);

        let mut length_sq = 0.0;
        let mut prev = start;
        for &wp in &waypoints {
            length_sq += prev.distance_sq(wp);
            prev = wp;
        }

        Self {
            target,
            waypoints,
            length_sq,
            segment: None,
        }
    }

    /// A single straight hop to the target.
    pub fn direct(start: Vec2, target: PathTarget) -> Self {
        Self::new(start, target, Vec::new())
    }

    pub fn target(&self) -> &PathTarget {
        &self.target
    }

    pub fn waypoints(&self) -> &VecDeque<Vec2> {
        &self.waypoints
    }

    /// Sum of squared hop lengths, fixed at construction. Used to compare
    /// candidate paths, not as a true distance.
    pub fn length_sq(&self) -> f32 {
        self.length_sq
    }

    pub fn is_exhausted(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Advance from `position` (facing `direction`) by up to `step_length`.
    ///
    /// The acceptance radius is tested at segment boundaries against the
    /// position, and on the final segment against the arclength still to
    /// go, so splitting one step into several never changes where the
    /// worker stops.
    pub fn step(&mut self, position: Vec2, direction: Vec2, step_length: f32) -> PathStep {
        let mut position = position;
        let mut direction = direction;
        let mut remaining = step_length.max(0.0);
        let radius = self.target.radius_sq.max(0.0).sqrt();
        let mut arrived = false;

        loop {
            let reached = arrived
                || self.waypoints.is_empty()
                || match &self.segment {
                    Some(segment) => self.waypoints.len() == 1 && segment.remaining() <= radius,
                    None => self.target.is_reached(position),
                };
            if reached {
                self.waypoints.clear();
                self.segment = None;
                return PathStep {
                    position,
                    direction,
                    remaining,
                    target_reached: true,
                };
            }
            if remaining <= 0.0 {
                return PathStep {
                    position,
                    direction,
                    remaining: 0.0,
                    target_reached: false,
                };
            }

            let last = self.waypoints.len() == 1;
            let segment = self.segment.get_or_insert_with(|| {
                Self::build_segment(&self.waypoints, &self.target, position, direction)
            });
            let budget = if last {
                let to_edge = (segment.remaining() - radius).max(0.0);
                arrived = remaining >= to_edge;
                remaining.min(to_edge)
            } else {
                remaining
            };
            let advanced = segment.advance(budget);
            position = advanced.position;
            direction = advanced.direction;
            remaining = remaining - budget + advanced.leftover;

            if segment.is_finished() {
                self.segment = None;
                self.waypoints.pop_front();
            }
        }
    }

    fn build_segment(
        waypoints: &VecDeque<Vec2>,
        target: &PathTarget,
        position: Vec2,
        direction: Vec2,
    ) -> PathSegment {
        let next = waypoints[0];
        let end_hint = match waypoints.get(1) {
            Some(&after) => after - next,
            None => target.focus.map_or(Vec2::ZERO, |focus| focus - next),
        };
        PathSegment::new(position, direction, next, end_hint)
    }
}
