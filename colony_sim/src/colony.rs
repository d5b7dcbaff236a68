// The colony: top-level owner of all simulation state.
//
// `Colony` wires the pieces together and is the only entry point a host
// needs. It owns the world (terrain, buildings, sites), the path finder,
// the job board, the workforce and the supervisor, and advances them with
// `update(elapsed_ms)`:
//
// 1. Forward pending job events to the supervisor.
// 2. Run the supervisor tick (which may assign jobs).
// 3. Run every worker's work tick in id order. Each worker is taken out of
//    the workforce for its own tick so the rest can be notified.
// 4. Apply terrain effects of completed jobs and re-weight the path
//    finder: per surface for small edits, a full rebuild for large ones.
// 5. Purge finished jobs and forward the resulting events.
//
// Player-facing commands (`request_drill`, `command_move`, `cancel_job`,
// `set_priorities`, ...) are methods here too. Every terrain change goes
// through the colony so the path finder never falls out of sync.
//
// See also: `supervisor.rs`, `work.rs`, `job.rs`, `path_finder.rs`.
//
// **Critical constraint: determinism.** Given the same seed, config,
// initial terrain and sequence of commands and `update` calls, a colony
// always produces the same events.

use crate::config::{PriorityList, SimConfig};
use crate::error::JobError;
use crate::event::ColonyEvent;
use crate::fulfiller::{Fulfiller, Workforce};
use crate::job::{JobBoard, JobKind, JobOutcome};
use crate::path::PathTarget;
use crate::path_finder::PathFinder;
use crate::supervisor::{Supervisor, SupervisorContext};
use crate::terrain::{SurfaceType, Terrain};
use crate::types::{
    BuildingId, BuildingType, JobId, SiteId, TileCoord, Tool, Training, Vec2, VehicleKind,
    VehicleUpgrade, WorkerId,
};
use crate::work::{WorkContext, WorkReport, work_tick};
use crate::world::World;
use tracing::debug;

pub struct Colony {
    config: SimConfig,
    world: World,
    path_finder: PathFinder,
    jobs: JobBoard,
    workforce: Workforce,
    supervisor: Supervisor,
    elapsed_ms: u64,
}

impl Colony {
    pub fn new(seed: u64, config: SimConfig, terrain: Terrain) -> Self {
        let path_finder = PathFinder::new(&config, &terrain, seed);
        let supervisor = Supervisor::new(&config);
        Self {
            world: World::new(terrain),
            path_finder,
            jobs: JobBoard::new(),
            workforce: Workforce::new(),
            supervisor,
            config,
            elapsed_ms: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn jobs(&self) -> &JobBoard {
        &self.jobs
    }

    pub fn workforce(&self) -> &Workforce {
        &self.workforce
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn path_finder(&self) -> &PathFinder {
        &self.path_finder
    }

    pub fn worker(&self, id: WorkerId) -> Option<&dyn Fulfiller> {
        self.workforce.get(id)
    }

    /// Simulated time since creation.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    // -- Workers -------------------------------------------------------------

    pub fn spawn_raider(&mut self, position: Vec2) -> WorkerId {
        self.workforce.add_raider(position, self.config.raider_speed)
    }

    pub fn spawn_vehicle(&mut self, kind: VehicleKind, position: Vec2) -> WorkerId {
        let speed = self.config.vehicle_speed(kind);
        self.workforce.add_vehicle(kind, position, speed)
    }

    /// Hand a tool to a worker directly. False if it cannot carry one or
    /// already has it.
    pub fn give_tool(&mut self, worker: WorkerId, tool: Tool) -> bool {
        self.workforce.get_mut(worker).is_some_and(|w| w.grant_tool(tool))
    }

    pub fn give_training(&mut self, worker: WorkerId, training: Training) -> bool {
        self.workforce
            .get_mut(worker)
            .is_some_and(|w| w.grant_training(training))
    }

    /// Start beaming a worker out: it drops its jobs and never idles again.
    /// Jobs reserved for it alone are canceled.
    pub fn begin_removal(&mut self, worker: WorkerId) {
        let Some(w) = self.workforce.get_mut(worker) else {
            return;
        };
        self.jobs.release(w);
        w.body_mut().removing = true;
        self.jobs.cancel_owned_by(worker, &mut self.workforce);
        self.forward_job_events();
    }

    /// Remove a worker, releasing whatever it was doing.
    pub fn remove_worker(&mut self, worker: WorkerId) -> bool {
        let Some(mut w) = self.workforce.remove(worker) else {
            return false;
        };
        self.jobs.release(w.as_mut());
        self.jobs.cancel_owned_by(worker, &mut self.workforce);
        self.forward_job_events();
        true
    }

    // -- World ---------------------------------------------------------------

    pub fn add_building(
        &mut self,
        kind: BuildingType,
        entrance: TileCoord,
        powered: bool,
    ) -> BuildingId {
        self.world.add_building(kind, entrance, powered)
    }

    pub fn set_powered(&mut self, building: BuildingId, powered: bool) {
        self.world.set_powered(building, powered);
    }

    pub fn add_site(&mut self, tiles: Vec<TileCoord>) -> SiteId {
        self.world.add_site(tiles)
    }

    pub fn complete_site(&mut self, site: SiteId) {
        self.world.complete_site(site);
    }

    /// Change a surface's type and re-weight the path finder.
    pub fn set_surface_kind(&mut self, tile: TileCoord, kind: SurfaceType) -> bool {
        if !self.world.terrain.set_kind(tile, kind) {
            return false;
        }
        self.refresh_surfaces(&[tile]);
        true
    }

    /// Reveal the cave connected to `origin`.
    pub fn discover_from(&mut self, origin: TileCoord) -> Vec<TileCoord> {
        let revealed = self.world.terrain.discover_from(origin);
        self.refresh_surfaces(&revealed);
        revealed
    }

    // -- Jobs ----------------------------------------------------------------

    /// Post a job for the supervisor to schedule.
    pub fn post_job(&mut self, kind: JobKind) -> JobId {
        self.jobs.post(kind)
    }

    /// Queue drilling a wall, reusing an open request for the same wall.
    pub fn request_drill(&mut self, tile: TileCoord) -> Option<JobId> {
        self.request_wall_job(tile, JobKind::Drill { tile })
    }

    pub fn request_blast(&mut self, tile: TileCoord) -> Option<JobId> {
        self.request_wall_job(tile, JobKind::Blast { tile })
    }

    pub fn request_reinforce(&mut self, tile: TileCoord) -> Option<JobId> {
        if !self.world.terrain.surface(tile).is_reinforceable() {
            return None;
        }
        Some(self.post_unique(JobKind::Reinforce { tile }))
    }

    pub fn request_clear_rubble(&mut self, tile: TileCoord) -> Option<JobId> {
        let surface = self.world.terrain.surface(tile);
        if !(surface.discovered && surface.has_rubble()) {
            return None;
        }
        Some(self.post_unique(JobKind::ClearRubble { tile }))
    }

    pub fn request_training(&mut self, training: Training) -> JobId {
        self.jobs.post(JobKind::Train { training })
    }

    pub fn request_upgrade(&mut self, vehicle: WorkerId, upgrade: VehicleUpgrade) -> Option<JobId> {
        let worker = self.workforce.get(vehicle)?;
        let kind = JobKind::UpgradeVehicle { vehicle, upgrade };
        if !kind.accepts(worker) {
            return None;
        }
        Some(self.post_unique(kind))
    }

    fn request_wall_job(&mut self, tile: TileCoord, kind: JobKind) -> Option<JobId> {
        if !self.world.terrain.surface(tile).is_drillable() {
            return None;
        }
        Some(self.post_unique(kind))
    }

    fn post_unique(&mut self, kind: JobKind) -> JobId {
        match self.jobs.find_open(|k| *k == kind) {
            Some(id) => id,
            None => self.jobs.post(kind),
        }
    }

    /// Send a worker to a point, dropping whatever it was doing.
    pub fn command_move(&mut self, worker: WorkerId, location: Vec2) -> Result<JobId, JobError> {
        let Some(w) = self.workforce.get_mut(worker) else {
            return Err(JobError::UnknownWorker { worker });
        };
        let target = PathTarget::at(location).with_radius(self.config.arrival_radius);
        let job = self.jobs.insert(JobKind::Move { target });
        self.jobs.assign(job, w, None)?;
        Ok(job)
    }

    /// Give a specific job to a specific worker.
    pub fn command_job(&mut self, job: JobId, worker: WorkerId) -> Result<(), JobError> {
        let Some(w) = self.workforce.get_mut(worker) else {
            return Err(JobError::UnknownWorker { worker });
        };
        self.jobs.assign(job, w, None)
    }

    pub fn cancel_job(&mut self, job: JobId) -> bool {
        let canceled = self.jobs.cancel(job, &mut self.workforce);
        self.forward_job_events();
        canceled
    }

    pub fn set_priorities(&mut self, priorities: PriorityList) {
        self.supervisor.set_priorities(priorities);
    }

    // -- Tick ----------------------------------------------------------------

    pub fn update(&mut self, elapsed_ms: u32) -> Vec<ColonyEvent> {
        self.elapsed_ms += u64::from(elapsed_ms);
        let mut events = Vec::new();
        self.forward_job_events();

        let assignments = {
            let mut ctx = SupervisorContext {
                jobs: &mut self.jobs,
                workforce: &mut self.workforce,
                path_finder: &mut self.path_finder,
                world: &self.world,
                config: &self.config,
            };
            self.supervisor.tick(elapsed_ms, &mut ctx)
        };
        events.extend(assignments.into_iter().map(|a| ColonyEvent::JobAssigned {
            job: a.job,
            worker: a.worker,
            follow_up: a.follow_up,
        }));

        let mut outcomes = Vec::new();
        for id in self.workforce.ids() {
            let Some(mut worker) = self.workforce.take(id) else {
                continue;
            };
            let report = {
                let mut ctx = WorkContext {
                    jobs: &mut self.jobs,
                    path_finder: &mut self.path_finder,
                    world: &self.world,
                    config: &self.config,
                    others: &mut self.workforce,
                };
                work_tick(worker.as_mut(), &mut ctx, elapsed_ms)
            };
            self.workforce.put_back(worker);
            match report {
                WorkReport::Completed { job, outcome } => {
                    events.push(ColonyEvent::JobCompleted {
                        job,
                        worker: id,
                        outcome,
                    });
                    outcomes.push(outcome);
                }
                WorkReport::Abandoned(job) => {
                    events.push(ColonyEvent::JobAbandoned { job, worker: id });
                }
                WorkReport::Idle | WorkReport::Moving(_) | WorkReport::Working(_) => {}
            }
        }

        for outcome in outcomes {
            let changed = self.apply_outcome(outcome);
            if !changed.is_empty() {
                events.push(ColonyEvent::TerrainChanged { tiles: changed });
            }
        }

        self.jobs.remove_finished();
        self.forward_job_events();
        events
    }

    /// Apply a completed job's effect on the terrain. Returns changed tiles.
    fn apply_outcome(&mut self, outcome: JobOutcome) -> Vec<TileCoord> {
        let changed = match outcome {
            JobOutcome::SurfaceDrilled(tile) => self
                .world
                .terrain
                .drill(tile, self.config.drilled_rubble_level),
            JobOutcome::RubbleCleared(tile) => {
                if self.world.terrain.clear_rubble(tile) {
                    vec![tile]
                } else {
                    Vec::new()
                }
            }
            JobOutcome::Reinforced(tile) => {
                self.world.terrain.reinforce(tile);
                Vec::new()
            }
            JobOutcome::Arrived
            | JobOutcome::ToolGranted(_)
            | JobOutcome::TrainingGranted(_)
            | JobOutcome::UpgradeInstalled(_) => Vec::new(),
        };
        self.refresh_surfaces(&changed);
        changed
    }

    fn refresh_surfaces(&mut self, tiles: &[TileCoord]) {
        if tiles.len() > self.config.full_rebuild_threshold {
            debug!("{} surfaces changed; rebuilding path graphs", tiles.len());
            self.path_finder.reset_graphs_and_caches(&self.world.terrain);
            return;
        }
        for &tile in tiles {
            let surface = self.world.terrain.surface(tile);
            self.path_finder.update_surface(&surface);
        }
    }

    fn forward_job_events(&mut self) {
        for event in self.jobs.drain_events() {
            self.supervisor.on_job_event(event);
        }
    }
}
