use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgressError {
    #[error("leg {leg} step {step} does not exist on the active route")]
    IndexOutOfRange { leg: usize, step: usize },
}

pub type ProgressResult<T> = Result<T, ProgressError>;
