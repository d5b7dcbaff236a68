// Events produced by the job board and the colony step.
//
// `JobEvent`s are how the supervisor learns about jobs: the job board
// emits `Created` when a schedulable job is posted, `Closed` when a posted
// job completes or is canceled, and `Deleted` when a finished job is
// purged. The colony forwards them to `Supervisor::on_job_event`.
// `ColonyEvent`s are the narrative output of `Colony::update`, for whatever
// host drives the colony (UI, logs, tests).

use crate::job::JobOutcome;
use crate::types::{JobId, TileCoord, WorkerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobEvent {
    Created(JobId),
    Closed(JobId),
    Deleted(JobId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ColonyEvent {
    JobAssigned {
        job: JobId,
        worker: WorkerId,
        /// The job this assignment is a prerequisite for.
        follow_up: Option<JobId>,
    },
    JobCompleted {
        job: JobId,
        worker: WorkerId,
        outcome: JobOutcome,
    },
    /// The worker gave up: no workplace left, unreachable, or unqualified.
    JobAbandoned { job: JobId, worker: WorkerId },
    /// Terrain around these tiles changed and was re-pathed.
    TerrainChanged { tiles: Vec<TileCoord> },
}
