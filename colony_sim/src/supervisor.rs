// Job supervisor: matches idle workers to open jobs.
//
// The supervisor keeps the queue of schedulable jobs (fed only through
// `on_job_event`) and an owned, versioned copy of the player's priority
// list. It does nothing on its own; the host calls `tick` with the elapsed
// time, which drives two independent timers:
//
// - Every `job_schedule_interval_ms`: `assign_jobs`.
// - Every `rubble_scan_interval_ms`: `check_uncleared_rubble`.
//
// `assign_jobs` is a greedy pass:
//
// 1. Drop closed jobs from the queue. Candidates are open jobs nobody is
//    working on whose priority category is enabled.
// 2. Stable-sort candidates by priority rank; equal ranks keep queue order.
// 3. Collect idle workers.
// 4. For each candidate, pick the idle worker with the shortest path to
//    any workplace among those fully qualified for it.
// 5. Failing that, pick the nearest worker that has the training but not
//    the tool and send it to fetch the tool first, or failing that the
//    nearest worker missing the training and send it to train first. The
//    real job is queued as the worker's follow-up. Only workers that take
//    prerequisites (raiders) are considered, and only when the
//    prerequisite itself has a reachable workplace.
// 6. Assigned workers leave the idle pool.
// 7. Idle workers still standing on an active construction site are sent
//    to the nearest free tile.
//
// `check_uncleared_rubble` lets idle raiders clean up near where they stand:
// it searches square rings of growing radius around each idle raider for
// discovered rubble nobody is clearing and assigns the first reachable hit.
//
// See also: `job.rs` for `JobBoard` and job kinds, `config.rs` for
// `PriorityList`, `colony.rs` for the host that calls `tick`.
//
// **Critical constraint: determinism.** Queue order is event order, ties
// keep queue order, and idle workers are visited in id order.

use crate::config::{PriorityList, SimConfig};
use crate::event::JobEvent;
use crate::fulfiller::{Fulfiller, Workforce};
use crate::job::{JobBoard, JobKind, PriorityIdentifier};
use crate::path_finder::PathFinder;
use crate::types::{JobId, TileCoord, Tool, WorkerId};
use crate::world::World;
use tracing::{debug, warn};

/// Borrowed colony state a supervisor pass works on.
pub struct SupervisorContext<'a> {
    pub jobs: &'a mut JobBoard,
    pub workforce: &'a mut Workforce,
    pub path_finder: &'a mut PathFinder,
    pub world: &'a World,
    pub config: &'a SimConfig,
}

/// A job handed to a worker during a supervisor pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub job: JobId,
    pub worker: WorkerId,
    pub follow_up: Option<JobId>,
}

/// Nearest candidate seen so far in one qualification bucket.
#[derive(Default)]
struct Nearest(Option<(f32, WorkerId)>);

impl Nearest {
    fn offer(&mut self, distance_sq: f32, worker: WorkerId) {
        if self.0.is_none_or(|(best, _)| distance_sq < best) {
            self.0 = Some((distance_sq, worker));
        }
    }

    fn worker(&self) -> Option<WorkerId> {
        self.0.map(|(_, w)| w)
    }
}

#[derive(Clone, Debug)]
pub struct Supervisor {
    queue: Vec<JobId>,
    priorities: PriorityList,
    job_schedule_interval_ms: u32,
    rubble_scan_interval_ms: u32,
    rubble_scan_radius: i32,
    off_site_search_radius: i32,
    since_schedule_ms: u32,
    since_rubble_scan_ms: u32,
}

impl Supervisor {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            queue: Vec::new(),
            priorities: config.priorities.clone(),
            job_schedule_interval_ms: config.job_schedule_interval_ms,
            rubble_scan_interval_ms: config.rubble_scan_interval_ms,
            rubble_scan_radius: config.rubble_scan_radius,
            off_site_search_radius: config.off_site_search_radius,
            since_schedule_ms: 0,
            since_rubble_scan_ms: 0,
        }
    }

    pub fn queue(&self) -> &[JobId] {
        &self.queue
    }

    pub fn priorities(&self) -> &PriorityList {
        &self.priorities
    }

    pub fn on_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Created(id) => {
                if !self.queue.contains(&id) {
                    self.queue.push(id);
                }
            }
            JobEvent::Closed(id) | JobEvent::Deleted(id) => self.queue.retain(|q| *q != id),
        }
    }

    /// Adopt a new priority list. Ignored when nothing changed.
    pub fn set_priorities(&mut self, priorities: PriorityList) {
        if priorities == self.priorities {
            return;
        }
        debug!(
            "priorities updated to version {} (was {})",
            priorities.version(),
            self.priorities.version()
        );
        self.priorities = priorities;
    }

    pub fn tick(&mut self, elapsed_ms: u32, ctx: &mut SupervisorContext<'_>) -> Vec<Assignment> {
        let mut assigned = Vec::new();
        if fire(&mut self.since_schedule_ms, elapsed_ms, self.job_schedule_interval_ms) {
            assigned.extend(self.assign_jobs(ctx));
        }
        if fire(&mut self.since_rubble_scan_ms, elapsed_ms, self.rubble_scan_interval_ms) {
            assigned.extend(self.check_uncleared_rubble(ctx));
        }
        assigned
    }

    pub fn assign_jobs(&mut self, ctx: &mut SupervisorContext<'_>) -> Vec<Assignment> {
        let jobs = &*ctx.jobs;
        self.queue.retain(|id| jobs.get(*id).is_some_and(|j| j.is_open()));

        let mut candidates: Vec<(usize, JobId)> = self
            .queue
            .iter()
            .filter_map(|&id| {
                let job = jobs.get(id)?;
                if !job.fulfillers().is_empty() {
                    return None;
                }
                let rank = self.priorities.rank(job.priority()?)?;
                Some((rank, id))
            })
            .collect();
        candidates.sort_by_key(|&(rank, _)| rank);

        let mut idle = ctx.workforce.idle_ids();
        let mut assigned = Vec::new();

        for (_, job_id) in candidates {
            if idle.is_empty() {
                break;
            }
            if let Some(a) = self.match_job(job_id, &idle, ctx) {
                idle.retain(|w| *w != a.worker);
                assigned.push(a);
            }
        }

        for worker in idle {
            if let Some(a) = self.move_off_site(worker, ctx) {
                assigned.push(a);
            }
        }
        assigned
    }

    /// Pick a worker for one job, inserting a prerequisite if needed.
    fn match_job(
        &self,
        job_id: JobId,
        idle: &[WorkerId],
        ctx: &mut SupervisorContext<'_>,
    ) -> Option<Assignment> {
        let job = ctx.jobs.get(job_id)?;
        let kind = job.kind().clone();
        let workplaces = job.workplaces(ctx.world, ctx.config);
        if workplaces.is_empty() {
            return None;
        }
        let tool = kind.required_tool();
        let training = kind.required_training();

        let mut qualified = Nearest::default();
        let mut needs_tool = Nearest::default();
        let mut needs_training = Nearest::default();
        for &id in idle {
            let Some(worker) = ctx.workforce.get(id) else {
                continue;
            };
            if !kind.accepts(worker) {
                continue;
            }
            let has_tool = tool.is_none_or(|t| worker.has_tool(t));
            let has_training = training.is_none_or(|t| worker.has_training(t));
            let bucket = match (has_training, has_tool) {
                (true, true) => &mut qualified,
                (true, false) if worker.can_take_prerequisites() => &mut needs_tool,
                (false, _) if worker.can_take_prerequisites() => &mut needs_training,
                _ => continue,
            };
            if let Some(path) = worker.find_shortest_path(ctx.path_finder, &workplaces) {
                bucket.offer(path.length_sq(), id);
            }
        }

        if let Some(worker) = qualified.worker() {
            return assign(ctx, job_id, worker, None);
        }
        let (worker, prerequisite) = match (needs_tool.worker(), tool) {
            (Some(worker), Some(tool)) => (worker, JobKind::GetTool { tool }),
            _ => match (needs_training.worker(), training) {
                (Some(worker), Some(training)) => (worker, JobKind::Train { training }),
                _ => return None,
            },
        };
        if !prerequisite_reachable(ctx, worker, &prerequisite) {
            debug!("{} cannot reach a workplace to {} before {}", worker, prerequisite, job_id);
            return None;
        }
        let pre_id = ctx.jobs.insert(prerequisite);
        assign(ctx, pre_id, worker, Some(job_id))
    }

    /// Send an idle worker standing on an active construction site to the
    /// nearest free tile.
    fn move_off_site(
        &self,
        worker_id: WorkerId,
        ctx: &mut SupervisorContext<'_>,
    ) -> Option<Assignment> {
        let worker = ctx.workforce.get(worker_id)?;
        let here = TileCoord::containing(worker.position(), ctx.config.tile_size);
        if !ctx.world.is_on_active_site(here) {
            return None;
        }
        let tile = ring_tiles(here, self.off_site_search_radius).find(|&t| {
            let s = ctx.world.terrain.surface(t);
            s.discovered && s.is_walkable() && !ctx.world.is_on_active_site(t)
        })?;
        let job_id = ctx.jobs.insert(JobKind::MoveOffSite { tile });
        assign(ctx, job_id, worker_id, None)
    }

    /// Send idle raiders to clear the nearest uncleared rubble. Only runs
    /// while the clearing category is enabled.
    pub fn check_uncleared_rubble(&mut self, ctx: &mut SupervisorContext<'_>) -> Vec<Assignment> {
        if !self.priorities.is_enabled(PriorityIdentifier::Clearing) {
            return Vec::new();
        }
        let mut assigned = Vec::new();
        for worker_id in ctx.workforce.idle_ids() {
            let Some(worker) = ctx.workforce.get(worker_id) else {
                continue;
            };
            if !worker.can_take_prerequisites() {
                continue;
            }
            let here = TileCoord::containing(worker.position(), ctx.config.tile_size);
            let has_shovel = worker.has_tool(Tool::Shovel);
            for tile in ring_tiles(here, self.rubble_scan_radius) {
                if let Some(a) = self.try_clear_rubble(ctx, worker_id, tile, has_shovel) {
                    assigned.push(a);
                    break;
                }
            }
        }
        assigned
    }

    fn try_clear_rubble(
        &self,
        ctx: &mut SupervisorContext<'_>,
        worker_id: WorkerId,
        tile: TileCoord,
        has_shovel: bool,
    ) -> Option<Assignment> {
        let surface = ctx.world.terrain.surface_or_none(tile)?;
        if !(surface.discovered && surface.has_rubble()) {
            return None;
        }
        let existing = ctx
            .jobs
            .find_open(|k| matches!(k, JobKind::ClearRubble { tile: t } if *t == tile));
        if existing.is_some_and(|id| ctx.jobs.get(id).is_some_and(|j| !j.fulfillers().is_empty())) {
            return None;
        }

        let kind = JobKind::ClearRubble { tile };
        let workplaces = kind.workplaces(ctx.world, ctx.config);
        let worker = ctx.workforce.get(worker_id)?;
        worker.find_shortest_path(ctx.path_finder, &workplaces)?;

        let fetch_shovel = JobKind::GetTool { tool: Tool::Shovel };
        if !has_shovel && !prerequisite_reachable(ctx, worker_id, &fetch_shovel) {
            return None;
        }
        let clear_id = existing.unwrap_or_else(|| ctx.jobs.post(kind));
        if has_shovel {
            assign(ctx, clear_id, worker_id, None)
        } else {
            let fetch = ctx.jobs.insert(JobKind::GetTool { tool: Tool::Shovel });
            assign(ctx, fetch, worker_id, Some(clear_id))
        }
    }
}

/// Advance a timer; true when its interval elapsed.
fn fire(since_ms: &mut u32, elapsed_ms: u32, interval_ms: u32) -> bool {
    *since_ms = since_ms.saturating_add(elapsed_ms);
    if *since_ms < interval_ms {
        return false;
    }
    *since_ms = if interval_ms == 0 { 0 } else { *since_ms % interval_ms };
    true
}

fn prerequisite_reachable(
    ctx: &mut SupervisorContext<'_>,
    worker_id: WorkerId,
    kind: &JobKind,
) -> bool {
    let workplaces = kind.workplaces(ctx.world, ctx.config);
    let Some(worker) = ctx.workforce.get(worker_id) else {
        return false;
    };
    !workplaces.is_empty() && worker.find_shortest_path(ctx.path_finder, &workplaces).is_some()
}

fn assign(
    ctx: &mut SupervisorContext<'_>,
    job: JobId,
    worker_id: WorkerId,
    follow_up: Option<JobId>,
) -> Option<Assignment> {
    let worker = ctx.workforce.get_mut(worker_id)?;
    match ctx.jobs.assign(job, worker, follow_up) {
        Ok(()) => {
            debug!("assigned {} to {} (follow-up {:?})", job, worker_id, follow_up);
            Some(Assignment {
                job,
                worker: worker_id,
                follow_up,
            })
        }
        Err(e) => {
            warn!("supervisor assignment failed: {}", e);
            if ctx.jobs.get(job).is_some_and(|j| !j.is_posted()) {
                ctx.jobs.cancel(job, ctx.workforce);
            }
            None
        }
    }
}

/// Tiles in square rings of radius `0..=radius` around `center`. Within a
/// ring, x is the outer loop and y the inner one.
pub fn ring_tiles(center: TileCoord, radius: i32) -> impl Iterator<Item = TileCoord> {
    (0..=radius.max(0)).flat_map(move |r| {
        (-r..=r).flat_map(move |x| {
            (-r..=r)
                .filter(move |y| x.abs() == r || y.abs() == r)
                .map(move |y| center.offset(x, y))
        })
    })
}
