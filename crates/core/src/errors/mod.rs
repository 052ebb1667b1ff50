//! Error types and Result alias for the rewards ledger

use crate::ActivityType;
use thiserror::Error;

/// Main error type for the rewards ledger
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Already completed {activity} today (limit {max_daily} per day)")]
    AlreadyCompletedToday {
        activity: ActivityType,
        max_daily: u32,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient CARE points: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Cannot send CARE points to yourself")]
    SelfTransferNotAllowed,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Notarization failed: {0}")]
    NotarizationError(String),
}

impl Error {
    /// Expected business outcomes, returned to callers as typed failures.
    /// Everything else is an infrastructure fault.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Error::ValidationError(_)
                | Error::AlreadyCompletedToday { .. }
                | Error::NotFound(_)
                | Error::InsufficientBalance { .. }
                | Error::SelfTransferNotAllowed
        )
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
