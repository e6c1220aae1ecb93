use nav_core::MilestoneId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MilestoneError {
    #[error("milestone {0} is already registered")]
    DuplicateId(MilestoneId),
}

pub type MilestoneResult<T> = Result<T, MilestoneError>;
