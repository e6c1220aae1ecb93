use nav_milestone::MilestoneError;
use nav_progress::ProgressError;
use nav_route::MatchError;
use thiserror::Error;

/// Why a single tick was dropped.  Never fatal to the worker.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProcessError {
    #[error("route matching failed: {0}")]
    Match(#[from] MatchError),

    #[error("progress could not be built: {0}")]
    Progress(#[from] ProgressError),

    #[error("matcher reported a non-finite remaining distance or duration at leg {leg} step {step}")]
    NonFiniteStatus { leg: usize, step: usize },

    /// The matcher reported an earlier (leg, step) than the current snapshot
    /// on the same route.
    #[error("matched position regressed from {from:?} to {to:?}")]
    IndexRegression {
        from: (usize, usize),
        to:   (usize, usize),
    },
}

pub type ProcessResult<T> = Result<T, ProcessError>;

/// Setup and lifecycle errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("milestone registration failed: {0}")]
    Milestone(#[from] MilestoneError),

    #[error("failed to spawn processing worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("processing worker has stopped")]
    WorkerStopped,
}

pub type EngineResult<T> = Result<T, EngineError>;
