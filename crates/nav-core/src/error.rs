//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]` where a core validation can fail inside them.

use thiserror::Error;

/// Errors produced by `nav-core` value validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid fix: {0}")]
    InvalidFix(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `nav-core`.
pub type CoreResult<T> = Result<T, CoreError>;
