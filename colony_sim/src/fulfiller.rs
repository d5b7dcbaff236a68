// Workers: the `Fulfiller` trait and its two implementations.
//
// Anything that can take a job implements `Fulfiller`. The trait splits
// into a small required surface (identity, capabilities, qualifications,
// access to the shared `WorkerBody`) and default methods for the job
// pointer bookkeeping every worker shares. Raiders walk, carry hand tools,
// learn skills, and can be sent on prerequisite errands. Vehicles drive,
// sail or fly, get their tools from their kind and installed upgrades, and
// never take prerequisites.
//
// A worker's job pointers (`job`, `follow_up` in `WorkerBody`) are only
// written through `JobBoard::assign` / `JobBoard::release` and the
// `drop_job` callback, so the job roster and the worker always agree.
//
// `Workforce` owns every worker as `Box<dyn Fulfiller>` in id order and
// implements `FulfillerRegistry`, the lookup `Job::cancel` uses to notify
// workers. During a worker's own tick it is taken out of the workforce
// (`take` / `put_back`) so the rest of the workforce can be passed along
// as the registry.
//
// See also: `job.rs` for the job side of assignment, `work.rs` for the
// work loop that drives a worker's body.

use crate::job::Job;
use crate::path::{PathTarget, TerrainPath};
use crate::path_finder::PathFinder;
use crate::types::{
    JobId, MoveCapabilities, Tool, Training, Vec2, VehicleKind, VehicleUpgrade, WorkerId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FulfillerKind {
    Raider,
    Vehicle(VehicleKind),
}

/// Movement and job state common to every worker.
#[derive(Clone, Debug)]
pub struct WorkerBody {
    pub position: Vec2,
    /// Unit facing direction.
    pub heading: Vec2,
    pub job: Option<JobId>,
    pub follow_up: Option<JobId>,
    pub path: Option<TerrainPath>,
    /// Time spent working at the current workplace.
    pub work_elapsed_ms: u32,
    pub at_workplace: bool,
    /// Being beamed out; never idle again.
    pub removing: bool,
}

impl WorkerBody {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            heading: Vec2::new(0.0, 1.0),
            job: None,
            follow_up: None,
            path: None,
            work_elapsed_ms: 0,
            at_workplace: false,
            removing: false,
        }
    }

    /// Forget the current path and any work progress.
    pub fn reset_progress(&mut self) {
        self.path = None;
        self.work_elapsed_ms = 0;
        self.at_workplace = false;
    }

    pub fn clear_job(&mut self) {
        self.job = None;
        self.follow_up = None;
        self.reset_progress();
    }
}

pub trait Fulfiller: fmt::Debug {
    fn id(&self) -> WorkerId;
    fn kind(&self) -> FulfillerKind;
    fn body(&self) -> &WorkerBody;
    fn body_mut(&mut self) -> &mut WorkerBody;
    fn capabilities(&self) -> MoveCapabilities;
    /// World units per second.
    fn speed(&self) -> f32;
    fn has_tool(&self, tool: Tool) -> bool;
    fn has_training(&self, training: Training) -> bool;

    /// Whether the supervisor may send this worker to fetch a tool or train
    /// before a job.
    fn can_take_prerequisites(&self) -> bool {
        false
    }

    fn grant_tool(&mut self, _tool: Tool) -> bool {
        false
    }

    fn grant_training(&mut self, _training: Training) -> bool {
        false
    }

    fn install_upgrade(&mut self, _upgrade: VehicleUpgrade) -> bool {
        false
    }

    fn position(&self) -> Vec2 {
        self.body().position
    }

    fn current_job(&self) -> Option<JobId> {
        self.body().job
    }

    fn follow_up_job(&self) -> Option<JobId> {
        self.body().follow_up
    }

    fn is_removing(&self) -> bool {
        self.body().removing
    }

    fn is_idle(&self) -> bool {
        self.body().job.is_none() && !self.body().removing
    }

    fn is_qualified_for(&self, tool: Option<Tool>, training: Option<Training>) -> bool {
        tool.is_none_or(|t| self.has_tool(t)) && training.is_none_or(|t| self.has_training(t))
    }

    /// Point the worker at a new job. Called by `JobBoard::assign` after the
    /// roster has been updated.
    fn set_job(&mut self, job: JobId, follow_up: Option<JobId>) {
        let body = self.body_mut();
        body.job = Some(job);
        body.follow_up = follow_up;
        body.reset_progress();
    }

    /// Make the follow-up the current job. Returns it, if there was one.
    fn advance_to_follow_up(&mut self) -> Option<JobId> {
        let body = self.body_mut();
        body.job = body.follow_up.take();
        body.reset_progress();
        body.job
    }

    /// Called when `job` no longer wants this worker (canceled, or completed
    /// by someone else). `job` is already in its final state.
    fn drop_job(&mut self, job: &Job) {
        let body = self.body_mut();
        if body.job == Some(job.id()) {
            body.clear_job();
        } else if body.follow_up == Some(job.id()) {
            body.follow_up = None;
        }
    }

    fn find_shortest_path(
        &self,
        path_finder: &mut PathFinder,
        targets: &[PathTarget],
    ) -> Option<TerrainPath> {
        path_finder.find_shortest_path(self.capabilities(), self.position(), targets)
    }
}

// ---------------------------------------------------------------------------
// Raider
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Raider {
    id: WorkerId,
    body: WorkerBody,
    speed: f32,
    tools: BTreeSet<Tool>,
    trainings: BTreeSet<Training>,
}

impl Raider {
    pub fn new(id: WorkerId, position: Vec2, speed: f32) -> Self {
        Self {
            id,
            body: WorkerBody::new(position),
            speed,
            tools: BTreeSet::new(),
            trainings: BTreeSet::new(),
        }
    }

    pub fn tools(&self) -> impl Iterator<Item = Tool> + '_ {
        self.tools.iter().copied()
    }
}

impl Fulfiller for Raider {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> FulfillerKind {
        FulfillerKind::Raider
    }

    fn body(&self) -> &WorkerBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut WorkerBody {
        &mut self.body
    }

    fn capabilities(&self) -> MoveCapabilities {
        MoveCapabilities::WALK
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn has_tool(&self, tool: Tool) -> bool {
        self.tools.contains(&tool)
    }

    fn has_training(&self, training: Training) -> bool {
        self.trainings.contains(&training)
    }

    fn can_take_prerequisites(&self) -> bool {
        true
    }

    fn grant_tool(&mut self, tool: Tool) -> bool {
        self.tools.insert(tool)
    }

    fn grant_training(&mut self, training: Training) -> bool {
        self.trainings.insert(training)
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Vehicle {
    id: WorkerId,
    kind: VehicleKind,
    body: WorkerBody,
    speed: f32,
    upgrades: BTreeSet<VehicleUpgrade>,
}

impl Vehicle {
    pub fn new(id: WorkerId, kind: VehicleKind, position: Vec2, speed: f32) -> Self {
        Self {
            id,
            kind,
            body: WorkerBody::new(position),
            speed,
            upgrades: BTreeSet::new(),
        }
    }

    pub fn vehicle_kind(&self) -> VehicleKind {
        self.kind
    }
}

impl Fulfiller for Vehicle {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn kind(&self) -> FulfillerKind {
        FulfillerKind::Vehicle(self.kind)
    }

    fn body(&self) -> &WorkerBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut WorkerBody {
        &mut self.body
    }

    fn capabilities(&self) -> MoveCapabilities {
        self.kind.capabilities()
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn has_tool(&self, tool: Tool) -> bool {
        self.kind.built_in_tools().contains(&tool)
            || self.upgrades.iter().any(|u| u.granted_tool() == tool)
    }

    /// Vehicles are driven by trained crew outside this model.
    fn has_training(&self, _training: Training) -> bool {
        false
    }

    fn install_upgrade(&mut self, upgrade: VehicleUpgrade) -> bool {
        self.upgrades.insert(upgrade)
    }
}

// ---------------------------------------------------------------------------
// Workforce
// ---------------------------------------------------------------------------

/// Worker lookup for code that must notify workers it does not own.
pub trait FulfillerRegistry {
    fn fulfiller_mut(&mut self, id: WorkerId) -> Option<&mut dyn Fulfiller>;
}

#[derive(Debug, Default)]
pub struct Workforce {
    workers: BTreeMap<WorkerId, Box<dyn Fulfiller>>,
    next_id: u32,
}

impl Workforce {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> WorkerId {
        let id = WorkerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_raider(&mut self, position: Vec2, speed: f32) -> WorkerId {
        let id = self.next_id();
        self.workers.insert(id, Box::new(Raider::new(id, position, speed)));
        id
    }

    pub fn add_vehicle(&mut self, kind: VehicleKind, position: Vec2, speed: f32) -> WorkerId {
        let id = self.next_id();
        self.workers.insert(id, Box::new(Vehicle::new(id, kind, position, speed)));
        id
    }

    /// Register a worker built elsewhere. The closure receives the id the
    /// worker must report.
    pub fn add_with(&mut self, build: impl FnOnce(WorkerId) -> Box<dyn Fulfiller>) -> WorkerId {
        let id = self.next_id();
        self.workers.insert(id, build(id));
        id
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, id: WorkerId) -> Option<&dyn Fulfiller> {
        self.workers.get(&id).map(|w| w.as_ref())
    }

    pub fn get_mut(&mut self, id: WorkerId) -> Option<&mut dyn Fulfiller> {
        self.workers.get_mut(&id).map(|w| w.as_mut() as &mut dyn Fulfiller)
    }

    /// All worker ids in ascending order.
    pub fn ids(&self) -> Vec<WorkerId> {
        self.workers.keys().copied().collect()
    }

    pub fn idle_ids(&self) -> Vec<WorkerId> {
        self.workers
            .values()
            .filter(|w| w.is_idle())
            .map(|w| w.id())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Fulfiller> {
        self.workers.values().map(|w| w.as_ref())
    }

    /// Remove a worker for the duration of its own tick.
    pub fn take(&mut self, id: WorkerId) -> Option<Box<dyn Fulfiller>> {
        self.workers.remove(&id)
    }

    pub fn put_back(&mut self, worker: Box<dyn Fulfiller>) {
        self.workers.insert(worker.id(), worker);
    }

    pub fn remove(&mut self, id: WorkerId) -> Option<Box<dyn Fulfiller>> {
        self.workers.remove(&id)
    }
}

impl FulfillerRegistry for Workforce {
    fn fulfiller_mut(&mut self, id: WorkerId) -> Option<&mut dyn Fulfiller> {
        self.get_mut(id)
    }
}
