// Error types.
//
// Only contract violations and bad configuration are errors. Spatial and
// scheduling setbacks (no route, unqualified worker, expired workplace) are
// expected runtime conditions and travel as `Option`s or simply leave the
// job waiting for the next supervisor tick.

use crate::types::{JobId, WorkerId};
use thiserror::Error;

/// Violations of the job assignment contract. Seeing one of these means the
/// caller has a bug; the supervisor logs them loudly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("{job} is exclusive to {owner}, refused assignment of {requested}")]
    ExclusiveJobTaken {
        job: JobId,
        owner: WorkerId,
        requested: WorkerId,
    },
    #[error("{job} is already complete or canceled")]
    JobClosed { job: JobId },
    #[error("{job} is not registered")]
    UnknownJob { job: JobId },
    #[error("{worker} is not registered")]
    UnknownWorker { worker: WorkerId },
}

/// Problems loading a `SimConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config field `{field}` {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
