// Per-tick work loop for a single worker.
//
// `work_tick` drives one worker through its current job for one step of
// simulated time:
//
// 1. Idle workers do nothing.
// 2. A job that is gone, closed, or that the worker is no longer qualified
//    for is released (the job returns to the supervisor's pool).
// 3. The job's workplaces are re-evaluated. If none remain, the worker
//    abandons the job. If the current path leads somewhere that is no
//    longer a workplace (or there is no path yet) a new one is planned;
//    if no workplace is reachable the job is abandoned.
// 4. Until the path's target is reached the worker moves
//    `speed * elapsed` along it.
// 5. At the workplace the worker faces the focus point and accumulates
//    work time. When it reaches the job's duration the job completes, the
//    worker collects its reward and moves on to its follow-up job.
//
// Terrain effects of completed jobs are not applied here; the outcome is
// returned for the host to apply (see `colony.rs`).
//
// See also: `fulfiller.rs` for `WorkerBody`, `job.rs` for workplaces and
// completion, `path.rs` for `TerrainPath::step`.

use crate::config::SimConfig;
use crate::fulfiller::{Fulfiller, FulfillerRegistry};
use crate::job::{JobBoard, JobOutcome};
use crate::path_finder::PathFinder;
use crate::types::JobId;
use crate::world::World;
use tracing::debug;

/// Everything a work tick reads or writes besides the worker itself.
pub struct WorkContext<'a> {
    pub jobs: &'a mut JobBoard,
    pub path_finder: &'a mut PathFinder,
    pub world: &'a World,
    pub config: &'a SimConfig,
    /// The rest of the workforce, for notifying co-workers on completion.
    pub others: &'a mut dyn FulfillerRegistry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkReport {
    Idle,
    Moving(JobId),
    Working(JobId),
    Abandoned(JobId),
    Completed { job: JobId, outcome: JobOutcome },
}

pub fn work_tick(
    worker: &mut dyn Fulfiller,
    ctx: &mut WorkContext<'_>,
    elapsed_ms: u32,
) -> WorkReport {
    let Some(job_id) = worker.current_job() else {
        return WorkReport::Idle;
    };

    let (workplaces, duration_ms, tool, training) = match ctx.jobs.get(job_id) {
        Some(job) if job.is_open() => (
            job.workplaces(ctx.world, ctx.config),
            job.kind().work_duration_ms(ctx.world, ctx.config),
            job.required_tool(),
            job.required_training(),
        ),
        _ => {
            debug!("{} drops {} which is no longer open", worker.id(), job_id);
            ctx.jobs.release(worker);
            return WorkReport::Abandoned(job_id);
        }
    };

    if !worker.is_qualified_for(tool, training) {
        debug!("{} is not qualified for {}; returning it to the queue", worker.id(), job_id);
        ctx.jobs.release(worker);
        return WorkReport::Abandoned(job_id);
    }
    if workplaces.is_empty() {
        debug!("{} has no workplaces left; {} abandons it", job_id, worker.id());
        ctx.jobs.release(worker);
        return WorkReport::Abandoned(job_id);
    }

    let path_current = worker
        .body()
        .path
        .as_ref()
        .is_some_and(|p| workplaces.contains(p.target()));
    if !path_current {
        match worker.find_shortest_path(ctx.path_finder, &workplaces) {
            Some(path) => {
                let body = worker.body_mut();
                body.reset_progress();
                body.path = Some(path);
            }
            None => {
                debug!("{} cannot reach any workplace of {}", worker.id(), job_id);
                ctx.jobs.release(worker);
                return WorkReport::Abandoned(job_id);
            }
        }
    }

    let step_length = worker.speed() * elapsed_ms as f32 / 1000.0;
    let body = worker.body_mut();
    if body.at_workplace {
        body.work_elapsed_ms = body.work_elapsed_ms.saturating_add(elapsed_ms);
    } else {
        let Some(path) = body.path.as_mut() else {
            return WorkReport::Moving(job_id);
        };
        let step = path.step(body.position, body.heading, step_length);
        body.position = step.position;
        body.heading = step.direction;
        if !step.target_reached {
            return WorkReport::Moving(job_id);
        }
        if let Some(focus) = path.target().focus {
            body.heading = (focus - body.position).normalize_or(body.heading);
        }
        body.at_workplace = true;
    }

    if body.work_elapsed_ms < duration_ms {
        return WorkReport::Working(job_id);
    }

    let Some(outcome) = ctx.jobs.complete(job_id, worker, ctx.others) else {
        ctx.jobs.release(worker);
        return WorkReport::Abandoned(job_id);
    };
    debug!("{} completed {}: {:?}", worker.id(), job_id, outcome);

    if let Some(next) = worker.advance_to_follow_up() {
        debug!("{} moves on to follow-up {}", worker.id(), next);
    }
    WorkReport::Completed { job: job_id, outcome }
}
