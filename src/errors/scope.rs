//! Error taxonomy for edge scoping and topic-claim arbitration.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors raised by the scoping engine
#[derive(Error, Debug)]
pub enum ScopeError {
    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Structural violation in the request payload
    #[error("invalid {field}: {message}")]
    BadRequest {
        /// Offending field
        field: String,
        /// Human-readable reason
        message: String,
    },

    /// State precondition not met, e.g. a topic already claimed by another owner
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Invariant violation or unexpected internal state
    #[error("internal error: {0}")]
    Internal(String),

    /// Storage failure that did not map to any of the above
    #[error("database error: {0}")]
    Database(DbErr),
}

impl ScopeError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ScopeError::NotFound(what.into())
    }

    pub fn bad_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        ScopeError::BadRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        ScopeError::PreconditionFailed(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ScopeError::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScopeError::NotFound(_))
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, ScopeError::BadRequest { .. })
    }

    /// True for errors a caller should treat as a 409/412-style conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, ScopeError::PreconditionFailed(_))
    }

    /// Stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ScopeError::NotFound(_) => "NOT_FOUND",
            ScopeError::BadRequest { .. } => "BAD_REQUEST",
            ScopeError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            ScopeError::Internal(_) | ScopeError::Database(_) => "INTERNAL",
        }
    }
}

/// The shared storage-error translator. A unique-constraint violation means a
/// concurrent transaction won a check-then-insert race, which surfaces as the
/// same conflict the in-transaction check would have produced.
impl From<DbErr> for ScopeError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                ScopeError::PreconditionFailed(format!("already claimed or duplicated: {msg}"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                ScopeError::BadRequest {
                    field: "reference".to_string(),
                    message: format!("referenced record does not exist: {msg}"),
                }
            }
            _ => ScopeError::Database(err),
        }
    }
}
