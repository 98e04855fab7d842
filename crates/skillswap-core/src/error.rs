//! Error types for SkillSwap
//!
//! One taxonomy for the whole core; the API layer maps each variant onto an
//! HTTP status and a structured JSON body.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::session::SessionStatus;

/// Result type alias using SkillSwap's Error
pub type Result<T> = std::result::Result<T, Error>;

/// SkillSwap error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or semantically invalid input
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced user or session does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Authenticated caller lacks permission for the action
    #[error("Not authorized to {action}")]
    Forbidden { action: String },

    /// Proposed booking overlaps an existing pending/confirmed session
    #[error("Teacher already has a session from {start} to {end}")]
    BookingConflict {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Caller already submitted their review for this session
    #[error("You have already reviewed this session")]
    AlreadyReviewed,

    /// Operation not valid for the session's current status
    #[error("Cannot {operation} while the session is {status}")]
    InvalidState {
        operation: String,
        status: SessionStatus,
    },

    /// Requested status change not reachable from the current status
    #[error("Cannot move a {from} session to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
        allowed: Vec<SessionStatus>,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data failed to parse back into domain types
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    /// HTTP status code the API surface reports for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Forbidden { .. } => 403,
            Self::BookingConflict { .. } => 409,
            Self::AlreadyReviewed => 409,
            Self::InvalidState { .. } => 400,
            Self::InvalidTransition { .. } => 400,
            Self::Database(_) | Self::Parse(_) => 500,
        }
    }
}
