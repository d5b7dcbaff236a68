// Jobs and the job board.
//
// A `Job` is a unit of work a single worker (or, for shareable kinds,
// several workers) travels to and performs. What the job is lives in
// `JobKind`, a tagged enum; everything kind-specific (priority, required
// tool and training, where the work happens, how long it takes, what
// completing it does) is a `match` on the kind.
//
// Lifecycle:
//
//   Incomplete --on_job_complete--> Complete
//        |
//        +--cancel / unposted job released with empty roster--> Canceled
//
// An `Incomplete` job with an empty roster is open for assignment; with a
// non-empty roster it is in progress. `Complete` and `Canceled` are
// terminal. Dropping a worker never closes a posted job: the supervisor
// offers it again. An unposted job (a prerequisite errand or a direct
// command) has no queue to return to, so once its last worker lets go it
// is canceled and purged with the other finished jobs.
//
// Workplaces are recomputed from the current `World` on every call and
// filtered by their `TargetCondition`, so a job notices at once when its
// wall has been drilled by someone else or its building lost power.
//
// `JobBoard` owns every job, hands out sequential ids, and is the single
// place where a job's roster and a worker's job pointers change together
// (`assign`, `release`, `cancel`, `complete`). Jobs that should be
// scheduled are `post`ed, which emits `JobEvent::Created` for the
// supervisor; prerequisite and command jobs are `insert`ed silently. A
// posted job that completes or is canceled emits `JobEvent::Closed`, and
// `JobEvent::Deleted` once it is purged.
//
// See also: `fulfiller.rs` for the worker side of assignment,
// `supervisor.rs` for scheduling, `work.rs` for the per-tick work loop.
//
// **Critical constraint: determinism.** Jobs live in a `BTreeMap` keyed by
// sequential `JobId`, so every iteration is in creation order.

use crate::config::SimConfig;
use crate::error::JobError;
use crate::event::JobEvent;
use crate::fulfiller::{Fulfiller, FulfillerKind, FulfillerRegistry};
use crate::path::{PathTarget, TargetCondition};
use crate::types::{BuildingType, JobId, TileCoord, Tool, Training, Vec2, VehicleUpgrade, WorkerId};
use crate::world::World;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Distance from a wall's center to its workplaces, in tiles. Slightly
/// more than half a tile, so the point lands just inside the neighbor.
const WALL_WORKPLACE_OFFSET: f32 = 0.6;

/// Player-orderable job categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriorityIdentifier {
    Train,
    Upgrade,
    Destruction,
    Reinforce,
    Clearing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Incomplete,
    Complete,
    Canceled,
}

#[derive(Clone, Debug, PartialEq)]
pub enum JobKind {
    /// Walk or drive to a point. Player command; never scheduled.
    Move { target: PathTarget },
    /// Step off a construction site onto a free tile.
    MoveOffSite { tile: TileCoord },
    Drill { tile: TileCoord },
    /// Blow up a wall with dynamite. Needs demolition training, no tool.
    Blast { tile: TileCoord },
    ClearRubble { tile: TileCoord },
    Reinforce { tile: TileCoord },
    /// Fetch a tool from a toolstation.
    GetTool { tool: Tool },
    /// Learn a skill at the matching training building.
    Train { training: Training },
    /// Fit an upgrade to one specific vehicle.
    UpgradeVehicle {
        vehicle: WorkerId,
        upgrade: VehicleUpgrade,
    },
}

impl JobKind {
    /// Scheduling category, or `None` for jobs the supervisor never queues.
    pub fn priority(&self) -> Option<PriorityIdentifier> {
        match self {
            JobKind::Drill { .. } | JobKind::Blast { .. } => Some(PriorityIdentifier::Destruction),
            JobKind::ClearRubble { .. } => Some(PriorityIdentifier::Clearing),
            JobKind::Reinforce { .. } => Some(PriorityIdentifier::Reinforce),
            JobKind::Train { .. } => Some(PriorityIdentifier::Train),
            JobKind::UpgradeVehicle { .. } => Some(PriorityIdentifier::Upgrade),
            JobKind::Move { .. } | JobKind::MoveOffSite { .. } | JobKind::GetTool { .. } => None,
        }
    }

    pub fn required_tool(&self) -> Option<Tool> {
        match self {
            JobKind::Drill { .. } => Some(Tool::Drill),
            JobKind::ClearRubble { .. } => Some(Tool::Shovel),
            JobKind::Reinforce { .. } => Some(Tool::Hammer),
            _ => None,
        }
    }

    pub fn required_training(&self) -> Option<Training> {
        match self {
            JobKind::Blast { .. } => Some(Training::Demolition),
            _ => None,
        }
    }

    /// The only worker allowed on this job, if it is exclusive.
    pub fn exclusive_owner(&self) -> Option<WorkerId> {
        match self {
            JobKind::UpgradeVehicle { vehicle, .. } => Some(*vehicle),
            _ => None,
        }
    }

    /// Whether `worker` may ever hold this job, qualifications aside.
    pub fn accepts(&self, worker: &dyn Fulfiller) -> bool {
        match self {
            JobKind::GetTool { tool } => worker.can_take_prerequisites() && !worker.has_tool(*tool),
            JobKind::Train { training } => {
                worker.can_take_prerequisites() && !worker.has_training(*training)
            }
            JobKind::UpgradeVehicle { vehicle, .. } => {
                worker.id() == *vehicle && matches!(worker.kind(), FulfillerKind::Vehicle(_))
            }
            _ => true,
        }
    }

    /// Current valid workplaces.
    pub fn workplaces(&self, world: &World, config: &SimConfig) -> Vec<PathTarget> {
        let tile_size = config.tile_size;
        let targets = match self {
            JobKind::Move { target } => vec![target.clone()],
            JobKind::MoveOffSite { tile } => {
                vec![PathTarget::at(tile.center(tile_size)).with_radius(tile_size * 0.3)]
            }
            JobKind::Drill { tile } | JobKind::Blast { tile } => {
                wall_workplaces(world, *tile, tile_size, TargetCondition::Drillable(*tile))
            }
            JobKind::Reinforce { tile } => {
                wall_workplaces(world, *tile, tile_size, TargetCondition::Reinforceable(*tile))
            }
            JobKind::ClearRubble { tile } => vec![
                PathTarget::at(tile.center(tile_size))
                    .with_radius(tile_size * 0.3)
                    .with_condition(TargetCondition::HasRubble(*tile)),
            ],
            JobKind::GetTool { .. } => {
                building_workplaces(world, BuildingType::Toolstation, tile_size)
            }
            JobKind::Train { training } => match config.training_sites.get(training) {
                Some(&kind) => building_workplaces(world, kind, tile_size),
                None => Vec::new(),
            },
            JobKind::UpgradeVehicle { .. } => {
                building_workplaces(world, BuildingType::UpgradeStation, tile_size)
            }
        };
        targets.into_iter().filter(|t| t.is_valid(world)).collect()
    }

    /// Time spent at the workplace before the job completes.
    pub fn work_duration_ms(&self, world: &World, config: &SimConfig) -> u32 {
        let work = &config.work;
        match self {
            JobKind::Move { .. } | JobKind::MoveOffSite { .. } => 0,
            JobKind::Drill { tile } => {
                if world.terrain.surface(*tile).kind.is_hard() {
                    work.drill_hard_ms
                } else {
                    work.drill_soft_ms
                }
            }
            JobKind::Blast { .. } => work.blast_ms,
            JobKind::ClearRubble { tile } => {
                let level = world.terrain.surface(*tile).rubble.max(1) as u32;
                work.clear_rubble_per_level_ms * level
            }
            JobKind::Reinforce { .. } => work.reinforce_ms,
            JobKind::GetTool { .. } => work.get_tool_ms,
            JobKind::Train { .. } => work.train_ms,
            JobKind::UpgradeVehicle { .. } => work.upgrade_ms,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Move { target } => write!(f, "move to {}", target.location),
            JobKind::MoveOffSite { tile } => write!(f, "move off site to {tile}"),
            JobKind::Drill { tile } => write!(f, "drill {tile}"),
            JobKind::Blast { tile } => write!(f, "blast {tile}"),
            JobKind::ClearRubble { tile } => write!(f, "clear rubble at {tile}"),
            JobKind::Reinforce { tile } => write!(f, "reinforce {tile}"),
            JobKind::GetTool { tool } => write!(f, "get {tool:?}"),
            JobKind::Train { training } => write!(f, "train as {training:?}"),
            JobKind::UpgradeVehicle { vehicle, upgrade } => {
                write!(f, "fit {upgrade:?} to {vehicle}")
            }
        }
    }
}

/// Workplaces on the walkable discovered neighbors of a wall, facing it.
fn wall_workplaces(
    world: &World,
    wall: TileCoord,
    tile_size: f32,
    condition: TargetCondition,
) -> Vec<PathTarget> {
    let wall_center = wall.center(tile_size);
    wall.cardinal_neighbors()
        .into_iter()
        .filter(|&n| {
            let s = world.terrain.surface(n);
            s.discovered && s.is_walkable()
        })
        .map(|n| {
            PathTarget::at(wall_workplace_point(wall, n, tile_size))
                .with_radius(tile_size * 0.1)
                .with_focus(wall_center)
                .with_condition(condition)
        })
        .collect()
}

/// One workplace per building of `kind`, at its entrance, valid while the
/// building has power.
fn building_workplaces(world: &World, kind: BuildingType, tile_size: f32) -> Vec<PathTarget> {
    world
        .buildings_of(kind)
        .map(|b| {
            PathTarget::at(b.entrance.center(tile_size))
                .with_radius(tile_size * 0.3)
                .with_condition(TargetCondition::BuildingPowered(b.id))
        })
        .collect()
}

/// What a finished job changed. Fulfiller-side rewards have already been
/// applied when this is returned; terrain-side effects are applied by the
/// host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Arrived,
    ToolGranted(Tool),
    TrainingGranted(Training),
    UpgradeInstalled(VehicleUpgrade),
    SurfaceDrilled(TileCoord),
    RubbleCleared(TileCoord),
    Reinforced(TileCoord),
}

#[derive(Clone, Debug)]
pub struct Job {
    id: JobId,
    kind: JobKind,
    state: JobState,
    fulfillers: SmallVec<[WorkerId; 4]>,
    follow_up: Option<JobId>,
    /// Announced to the supervisor, which re-offers it when dropped.
    posted: bool,
}

impl Job {
    pub fn new(id: JobId, kind: JobKind) -> Self {
        Self {
            id,
            kind,
            state: JobState::Incomplete,
            fulfillers: SmallVec::new(),
            follow_up: None,
            posted: false,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> &JobKind {
        &self.kind
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == JobState::Incomplete
    }

    pub fn is_posted(&self) -> bool {
        self.posted
    }

    pub fn fulfillers(&self) -> &[WorkerId] {
        &self.fulfillers
    }

    pub fn has_fulfiller(&self, worker: WorkerId) -> bool {
        self.fulfillers.contains(&worker)
    }

    /// The job this one is a prerequisite for.
    pub fn follow_up(&self) -> Option<JobId> {
        self.follow_up
    }

    pub fn priority(&self) -> Option<PriorityIdentifier> {
        self.kind.priority()
    }

    pub fn required_tool(&self) -> Option<Tool> {
        self.kind.required_tool()
    }

    pub fn required_training(&self) -> Option<Training> {
        self.kind.required_training()
    }

    pub fn workplaces(&self, world: &World, config: &SimConfig) -> Vec<PathTarget> {
        self.kind.workplaces(world, config)
    }

    /// Check `assign` would succeed without changing anything.
    pub fn check_assignable(&self, worker: WorkerId) -> Result<(), JobError> {
        if !self.is_open() {
            return Err(JobError::JobClosed { job: self.id });
        }
        match self.kind.exclusive_owner() {
            Some(owner) if owner != worker => Err(JobError::ExclusiveJobTaken {
                job: self.id,
                owner,
                requested: worker,
            }),
            _ => Ok(()),
        }
    }

    /// Add `worker` to the roster. Assigning a worker already listed is a
    /// no-op.
    pub fn assign(&mut self, worker: WorkerId) -> Result<(), JobError> {
        self.check_assignable(worker)?;
        if !self.fulfillers.contains(&worker) {
            self.fulfillers.push(worker);
        }
        Ok(())
    }

    /// Remove `worker` from the roster. The state is untouched: an
    /// exclusive job waits for its owner to come back.
    pub fn unassign(&mut self, worker: WorkerId) {
        self.fulfillers.retain(|w| *w != worker);
    }

    /// Cancel the job and make every assigned worker drop it. Returns the
    /// workers that were assigned.
    pub fn cancel(&mut self, registry: &mut dyn FulfillerRegistry) -> SmallVec<[WorkerId; 4]> {
        if !self.is_open() {
            return SmallVec::new();
        }
        let roster = std::mem::take(&mut self.fulfillers);
        self.state = JobState::Canceled;
        for &id in &roster {
            if let Some(worker) = registry.fulfiller_mut(id) {
                worker.drop_job(self);
            }
        }
        roster
    }

    /// Finish the job on behalf of `worker`, granting whatever the job
    /// gives the worker itself.
    pub fn on_job_complete(&mut self, worker: &mut dyn Fulfiller) -> JobOutcome {
        self.state = JobState::Complete;
        self.fulfillers.retain(|w| *w != worker.id());
        match self.kind {
            JobKind::Move { .. } | JobKind::MoveOffSite { .. } => JobOutcome::Arrived,
            JobKind::Drill { tile } | JobKind::Blast { tile } => JobOutcome::SurfaceDrilled(tile),
            JobKind::ClearRubble { tile } => JobOutcome::RubbleCleared(tile),
            JobKind::Reinforce { tile } => JobOutcome::Reinforced(tile),
            JobKind::GetTool { tool } => {
                worker.grant_tool(tool);
                JobOutcome::ToolGranted(tool)
            }
            JobKind::Train { training } => {
                worker.grant_training(training);
                JobOutcome::TrainingGranted(training)
            }
            JobKind::UpgradeVehicle { upgrade, .. } => {
                worker.install_upgrade(upgrade);
                JobOutcome::UpgradeInstalled(upgrade)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JobBoard
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct JobBoard {
    jobs: BTreeMap<JobId, Job>,
    next_id: u64,
    events: Vec<JobEvent>,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job for scheduling.
    pub fn post(&mut self, kind: JobKind) -> JobId {
        let id = self.insert(kind);
        if let Some(job) = self.jobs.get_mut(&id) {
            job.posted = true;
        }
        self.events.push(JobEvent::Created(id));
        id
    }

    /// Register a job the supervisor should not queue (prerequisites and
    /// direct commands).
    pub fn insert(&mut self, kind: JobKind) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs.insert(id, Job::new(id, kind));
        id
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// First open job (in creation order) whose kind matches.
    pub fn find_open(&self, mut pred: impl FnMut(&JobKind) -> bool) -> Option<JobId> {
        self.jobs
            .values()
            .find(|j| j.is_open() && pred(j.kind()))
            .map(|j| j.id())
    }

    /// Give `worker` the job, optionally with a follow-up queued behind it.
    /// The worker leaves any job it held before.
    pub fn assign(
        &mut self,
        job_id: JobId,
        worker: &mut dyn Fulfiller,
        follow_up: Option<JobId>,
    ) -> Result<(), JobError> {
        let worker_id = worker.id();
        let job = self.jobs.get(&job_id).ok_or(JobError::UnknownJob { job: job_id })?;
        job.check_assignable(worker_id)?;
        if let Some(next) = follow_up {
            let next_job = self.jobs.get(&next).ok_or(JobError::UnknownJob { job: next })?;
            next_job.check_assignable(worker_id)?;
        }

        let holds_other = [worker.current_job(), worker.follow_up_job()]
            .into_iter()
            .flatten()
            .any(|held| held != job_id && Some(held) != follow_up);
        if holds_other {
            self.release_keeping(worker, [Some(job_id), follow_up]);
        }

        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.assign(worker_id)?;
            job.follow_up = follow_up;
        }
        if let Some(next) = follow_up.and_then(|id| self.jobs.get_mut(&id)) {
            next.assign(worker_id)?;
        }
        worker.set_job(job_id, follow_up);
        Ok(())
    }

    /// Take `worker` off its current and follow-up jobs. Posted jobs become
    /// available to the supervisor again; unposted ones left without
    /// workers are canceled.
    pub fn release(&mut self, worker: &mut dyn Fulfiller) {
        self.release_keeping(worker, [None, None]);
    }

    /// `release`, except that jobs in `keep` (about to be reassigned to the
    /// same worker) stay open whatever their roster.
    fn release_keeping(&mut self, worker: &mut dyn Fulfiller, keep: [Option<JobId>; 2]) {
        let held = [worker.current_job(), worker.follow_up_job()];
        for id in held.into_iter().flatten() {
            let Some(job) = self.jobs.get_mut(&id) else {
                continue;
            };
            job.unassign(worker.id());
            let kept = keep.contains(&Some(id));
            if !job.posted && job.is_open() && job.fulfillers.is_empty() && !kept {
                debug!("{} left {} with nobody on it; canceling", worker.id(), id);
                job.state = JobState::Canceled;
            }
        }
        worker.body_mut().clear_job();
    }

    /// Cancel every open exclusive job reserved for `worker`. Used when the
    /// worker leaves the colony for good.
    pub fn cancel_owned_by(
        &mut self,
        worker: WorkerId,
        registry: &mut dyn FulfillerRegistry,
    ) -> Vec<JobId> {
        let owned: Vec<JobId> = self
            .jobs
            .values()
            .filter(|j| j.is_open() && j.kind.exclusive_owner() == Some(worker))
            .map(|j| j.id)
            .collect();
        for &id in &owned {
            self.cancel(id, registry);
        }
        owned
    }

    /// Cancel a job. Every assigned worker drops it, and workers for which
    /// it was a prerequisite are also taken off the job it led to.
    pub fn cancel(&mut self, job_id: JobId, registry: &mut dyn FulfillerRegistry) -> bool {
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return false;
        };
        if !job.is_open() {
            return false;
        }
        let follow_up = job.follow_up;
        let posted = job.posted;
        let roster = job.cancel(registry);
        if posted {
            self.events.push(JobEvent::Closed(job_id));
        }
        if let Some(next) = follow_up.and_then(|id| self.jobs.get_mut(&id)) {
            for worker in roster {
                next.unassign(worker);
            }
        }
        true
    }

    /// Complete a job for `worker`. Other workers on it drop it.
    pub fn complete(
        &mut self,
        job_id: JobId,
        worker: &mut dyn Fulfiller,
        others: &mut dyn FulfillerRegistry,
    ) -> Option<JobOutcome> {
        let job = self.jobs.get_mut(&job_id).filter(|j| j.is_open())?;
        let outcome = job.on_job_complete(worker);
        let remaining = std::mem::take(&mut job.fulfillers);
        for id in remaining {
            if let Some(other) = others.fulfiller_mut(id) {
                other.drop_job(job);
            }
        }
        if job.posted {
            self.events.push(JobEvent::Closed(job_id));
        }
        Some(outcome)
    }

    /// Remove terminal jobs nobody references any more.
    pub fn remove_finished(&mut self) -> Vec<JobId> {
        let finished: Vec<JobId> = self
            .jobs
            .values()
            .filter(|j| !j.is_open() && j.fulfillers.is_empty())
            .map(|j| j.id)
            .collect();
        for id in &finished {
            self.jobs.remove(id);
            self.events.push(JobEvent::Deleted(*id));
        }
        finished
    }

    /// Take the lifecycle notifications produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<JobEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Where a worker stands on the `neighbor` side of `wall`.
pub fn wall_workplace_point(wall: TileCoord, neighbor: TileCoord, tile_size: f32) -> Vec2 {
    let wall_center = wall.center(tile_size);
    wall_center + (neighbor.center(tile_size) - wall_center) * WALL_WORKPLACE_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfiller::{Raider, Vehicle, Workforce};
    use crate::terrain::Terrain;
    use crate::types::VehicleKind;

    fn world(rows: &[&str]) -> World {
        World::new(Terrain::from_rows(rows))
    }

    #[test]
    fn drill_workplaces_face_the_wall() {
        let config = SimConfig::default();
        let world = world(&["#.#", ".d.", "###"]);
        let kind = JobKind::Drill {
            tile: TileCoord::new(1, 1),
        };
        let places = kind.workplaces(&world, &config);
        // North, east and west neighbors are ground; south is rock.
        assert_eq!(places.len(), 3);
        let wall = TileCoord::new(1, 1).center(40.0);
        for p in &places {
            assert_eq!(p.focus, Some(wall));
            assert!((p.location.distance(wall) - 24.0).abs() < 1e-3);
        }
        assert_eq!(
            places[0].location,
            wall_workplace_point(TileCoord::new(1, 1), TileCoord::new(1, 0), 40.0)
        );
    }

    #[test]
    fn drilled_wall_has_no_workplaces() {
        let config = SimConfig::default();
        let mut world = world(&[".d."]);
        let kind = JobKind::Drill {
            tile: TileCoord::new(1, 0),
        };
        assert_eq!(kind.workplaces(&world, &config).len(), 2);
        world.terrain.drill(TileCoord::new(1, 0), 2);
        assert!(kind.workplaces(&world, &config).is_empty());
    }

    #[test]
    fn unpowered_toolstation_is_not_a_workplace() {
        let config = SimConfig::default();
        let mut world = world(&["..."]);
        let station = world.add_building(BuildingType::Toolstation, TileCoord::new(2, 0), false);
        let kind = JobKind::GetTool { tool: Tool::Shovel };
        assert!(kind.workplaces(&world, &config).is_empty());
        world.set_powered(station, true);
        assert_eq!(kind.workplaces(&world, &config).len(), 1);
    }

    #[test]
    fn hard_rock_takes_longer() {
        let config = SimConfig::default();
        let world = world(&[".dh"]);
        let soft = JobKind::Drill { tile: TileCoord::new(1, 0) };
        let hard = JobKind::Drill { tile: TileCoord::new(2, 0) };
        assert_eq!(soft.work_duration_ms(&world, &config), config.work.drill_soft_ms);
        assert_eq!(hard.work_duration_ms(&world, &config), config.work.drill_hard_ms);
    }

    #[test]
    fn assign_is_idempotent() {
        let mut job = Job::new(JobId(0), JobKind::Drill { tile: TileCoord::new(0, 0) });
        job.assign(WorkerId(3)).unwrap();
        job.assign(WorkerId(3)).unwrap();
        assert_eq!(job.fulfillers(), &[WorkerId(3)]);
    }

    #[test]
    fn exclusive_job_rejects_other_owner() {
        let mut job = Job::new(
            JobId(4),
            JobKind::UpgradeVehicle {
                vehicle: WorkerId(1),
                upgrade: VehicleUpgrade::Drill,
            },
        );
        job.assign(WorkerId(1)).unwrap();
        assert_eq!(
            job.assign(WorkerId(2)),
            Err(JobError::ExclusiveJobTaken {
                job: JobId(4),
                owner: WorkerId(1),
                requested: WorkerId(2),
            })
        );
        job.unassign(WorkerId(1));
        assert_eq!(job.state(), JobState::Incomplete);
        assert!(job.fulfillers().is_empty());
        job.assign(WorkerId(1)).unwrap();
        assert_eq!(job.fulfillers(), &[WorkerId(1)]);
    }

    #[test]
    fn released_exclusive_job_waits_for_its_owner() {
        let mut board = JobBoard::new();
        let mut workforce = Workforce::new();
        let digger = workforce.add_vehicle(VehicleKind::SmallDigger, Vec2::ZERO, 60.0);
        let upgrade = board.post(JobKind::UpgradeVehicle {
            vehicle: digger,
            upgrade: VehicleUpgrade::Drill,
        });
        board.assign(upgrade, workforce.get_mut(digger).unwrap(), None).unwrap();

        board.release(workforce.get_mut(digger).unwrap());
        assert!(board.get(upgrade).unwrap().is_open());
        assert!(board.remove_finished().is_empty());

        assert_eq!(board.cancel_owned_by(digger, &mut workforce), vec![upgrade]);
        assert_eq!(board.get(upgrade).unwrap().state(), JobState::Canceled);
    }

    #[test]
    fn released_errand_is_purged_but_posted_job_stays() {
        let mut board = JobBoard::new();
        let drill = board.post(JobKind::Drill { tile: TileCoord::new(1, 0) });
        let fetch = board.insert(JobKind::GetTool { tool: Tool::Drill });
        let mut raider = Raider::new(WorkerId(0), Vec2::ZERO, 50.0);
        board.assign(fetch, &mut raider, Some(drill)).unwrap();

        board.release(&mut raider);
        assert_eq!(board.get(fetch).unwrap().state(), JobState::Canceled);
        assert!(board.get(drill).unwrap().is_open());
        assert_eq!(board.remove_finished(), vec![fetch]);
        assert!(board.get(drill).is_some());
    }

    #[test]
    fn reassigning_keeps_the_new_job_open() {
        let mut board = JobBoard::new();
        let first = board.insert(JobKind::Move {
            target: PathTarget::at(Vec2::ZERO),
        });
        let second = board.insert(JobKind::Move {
            target: PathTarget::at(Vec2::new(80.0, 0.0)),
        });
        let mut raider = Raider::new(WorkerId(0), Vec2::ZERO, 50.0);
        board.assign(first, &mut raider, None).unwrap();
        board.assign(second, &mut raider, None).unwrap();

        assert_eq!(board.get(first).unwrap().state(), JobState::Canceled);
        assert!(board.get(second).unwrap().has_fulfiller(WorkerId(0)));
        assert_eq!(board.remove_finished(), vec![first]);
    }

    #[test]
    fn closing_a_posted_job_is_announced() {
        let mut board = JobBoard::new();
        let mut workforce = Workforce::new();
        let drill = board.post(JobKind::Drill { tile: TileCoord::new(1, 0) });
        let errand = board.insert(JobKind::Train { training: Training::Driver });
        board.drain_events();

        assert!(board.cancel(errand, &mut workforce));
        assert!(board.drain_events().is_empty());
        assert!(board.cancel(drill, &mut workforce));
        assert_eq!(board.drain_events(), vec![JobEvent::Closed(drill)]);
        board.remove_finished();
        assert_eq!(
            board.drain_events(),
            vec![JobEvent::Deleted(drill), JobEvent::Deleted(errand)]
        );
    }

    #[test]
    fn closed_job_rejects_assignment() {
        let mut job = Job::new(JobId(0), JobKind::GetTool { tool: Tool::Drill });
        let mut raider = Raider::new(WorkerId(0), Vec2::ZERO, 50.0);
        job.on_job_complete(&mut raider);
        assert_eq!(job.assign(WorkerId(0)), Err(JobError::JobClosed { job: JobId(0) }));
        assert!(raider.has_tool(Tool::Drill));
    }

    #[test]
    fn board_assign_links_follow_up() {
        let mut board = JobBoard::new();
        let drill = board.post(JobKind::Drill { tile: TileCoord::new(1, 0) });
        let fetch = board.insert(JobKind::GetTool { tool: Tool::Drill });
        let mut raider = Raider::new(WorkerId(0), Vec2::ZERO, 50.0);

        board.assign(fetch, &mut raider, Some(drill)).unwrap();
        assert_eq!(raider.current_job(), Some(fetch));
        assert_eq!(raider.follow_up_job(), Some(drill));
        assert!(board.get(drill).unwrap().has_fulfiller(WorkerId(0)));
        assert_eq!(board.get(fetch).unwrap().follow_up(), Some(drill));
        assert_eq!(board.drain_events(), vec![JobEvent::Created(drill)]);
    }

    #[test]
    fn cancel_prerequisite_releases_follow_up() {
        let mut board = JobBoard::new();
        let mut workforce = Workforce::new();
        let drill = board.post(JobKind::Drill { tile: TileCoord::new(1, 0) });
        let fetch = board.insert(JobKind::GetTool { tool: Tool::Drill });
        let id = workforce.add_raider(Vec2::ZERO, 50.0);
        {
            let raider = workforce.get_mut(id).unwrap();
            board.assign(fetch, raider, Some(drill)).unwrap();
        }

        assert!(board.cancel(fetch, &mut workforce));
        let raider = workforce.get(id).unwrap();
        assert!(raider.is_idle());
        assert_eq!(raider.follow_up_job(), None);
        assert!(board.get(drill).unwrap().fulfillers().is_empty());
        assert!(board.get(drill).unwrap().is_open());
        assert!(!board.cancel(fetch, &mut workforce));
    }

    #[test]
    fn complete_drops_other_workers() {
        let mut board = JobBoard::new();
        let mut workforce = Workforce::new();
        let clear = board.post(JobKind::ClearRubble { tile: TileCoord::new(0, 0) });
        let a = workforce.add_raider(Vec2::ZERO, 50.0);
        let b = workforce.add_raider(Vec2::ZERO, 50.0);
        for id in [a, b] {
            let worker = workforce.get_mut(id).unwrap();
            board.assign(clear, worker, None).unwrap();
        }

        let mut first = workforce.take(a).unwrap();
        let outcome = board.complete(clear, first.as_mut(), &mut workforce);
        workforce.put_back(first);

        assert_eq!(outcome, Some(JobOutcome::RubbleCleared(TileCoord::new(0, 0))));
        assert!(workforce.get(b).unwrap().is_idle());
        assert_eq!(board.remove_finished(), vec![clear]);
        assert!(board.get(clear).is_none());
    }

    #[test]
    fn upgrade_only_accepts_its_vehicle() {
        let kind = JobKind::UpgradeVehicle {
            vehicle: WorkerId(1),
            upgrade: VehicleUpgrade::Scoop,
        };
        let digger = Vehicle::new(WorkerId(1), VehicleKind::SmallDigger, Vec2::ZERO, 60.0);
        let other = Vehicle::new(WorkerId(2), VehicleKind::SmallDigger, Vec2::ZERO, 60.0);
        let raider = Raider::new(WorkerId(1), Vec2::ZERO, 50.0);
        assert!(kind.accepts(&digger));
        assert!(!kind.accepts(&other));
        assert!(!kind.accepts(&raider));
    }
}
