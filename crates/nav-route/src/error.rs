//! Route-subsystem error types.

use thiserror::Error;

use nav_core::CoreError;

/// Errors raised while validating a route.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("route has no legs")]
    NoLegs,

    #[error("leg {0} has no steps")]
    EmptyLeg(usize),

    #[error("leg {leg} step {step}: {reason}")]
    InvalidStep {
        leg:    usize,
        step:   usize,
        reason: &'static str,
    },
}

pub type RouteResult<T> = Result<T, RouteError>;

/// Errors a [`RouteMatcher`][crate::RouteMatcher] may return for one fix.
///
/// Every variant is recoverable: the caller drops the tick and continues.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("no active route")]
    NoActiveRoute,

    #[error(transparent)]
    InvalidFix(#[from] CoreError),

    #[error("matched indices leg {leg} step {step} are outside the route")]
    IndexOutOfRange { leg: usize, step: usize },

    #[error("fix could not be matched: {0}")]
    Unmatched(String),
}

pub type MatchResult<T> = Result<T, MatchError>;
