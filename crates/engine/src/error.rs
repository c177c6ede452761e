//! The module contains the errors the engine can return.
//!
//! Every variant except [`Database`] is an expected, recoverable outcome that
//! callers report back to the user:
//!
//! - [`ValidationFailed`] carries every violated booking rule at once.
//! - [`ConflictDetected`] is returned when a staff member's slot is taken.
//! - [`IllegalTransition`] guards the appointment lifecycle.
//! - [`ReferenceNotFound`] is returned for unknown ids.
//! - [`OutOfRange`] is returned for amounts, dates or percentages outside their bounds.
//!
//!  [`Database`]: EngineError::Database
//!  [`ValidationFailed`]: EngineError::ValidationFailed
//!  [`ConflictDetected`]: EngineError::ConflictDetected
//!  [`IllegalTransition`]: EngineError::IllegalTransition
//!  [`ReferenceNotFound`]: EngineError::ReferenceNotFound
//!  [`OutOfRange`]: EngineError::OutOfRange
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
    #[error("Conflict: {0}")]
    ConflictDetected(String),
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),
    #[error("\"{0}\" not found!")]
    ReferenceNotFound(String),
    #[error("Out of range: {0}")]
    OutOfRange(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Reasons attached to the error, one per violated rule.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            Self::ValidationFailed(reasons) => reasons.clone(),
            Self::ConflictDetected(reason)
            | Self::IllegalTransition(reason)
            | Self::ReferenceNotFound(reason)
            | Self::OutOfRange(reason)
            | Self::InvalidAmount(reason)
            | Self::InvalidId(reason) => vec![reason.clone()],
            Self::Database(_) => Vec::new(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ValidationFailed(a), Self::ValidationFailed(b)) => a == b,
            (Self::ConflictDetected(a), Self::ConflictDetected(b)) => a == b,
            (Self::IllegalTransition(a), Self::IllegalTransition(b)) => a == b,
            (Self::ReferenceNotFound(a), Self::ReferenceNotFound(b)) => a == b,
            (Self::OutOfRange(a), Self::OutOfRange(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
