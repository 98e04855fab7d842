//! Booking validation
//!
//! Validates a raw booking request before the store is consulted. Checks run
//! in a fixed order and stop at the first failure; the scheduling checks that
//! need the directory or the calendar live in the booking service.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Raw booking request as received from a client.
///
/// Timestamps arrive as strings so that malformed input surfaces as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    /// Subject to be taught
    pub skill: String,
    /// Scheduled start, RFC 3339
    pub start_time: String,
    /// Scheduled end, RFC 3339
    pub end_time: String,
    /// The teaching user
    pub teacher_id: Uuid,
    /// Optional free-text notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// A booking request that passed the pure checks
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    /// Trimmed skill name
    pub skill: String,
    /// Parsed start
    pub start_time: DateTime<Utc>,
    /// Parsed end
    pub end_time: DateTime<Utc>,
    /// The teaching user
    pub teacher_id: Uuid,
    /// Optional free-text notes
    pub notes: Option<String>,
}

/// Validator for booking requests
pub struct BookingValidator;

impl BookingValidator {
    /// Validate a booking request from the given student.
    ///
    /// Rules, in order:
    /// - Skill must be non-empty after trimming
    /// - Both timestamps must parse as RFC 3339
    /// - Start must be in the future
    /// - End must be after the start
    /// - Duration may not exceed `max_duration`
    /// - Teacher and student must be different users
    pub fn validate(
        request: &BookingRequest,
        student_id: Uuid,
        now: DateTime<Utc>,
        max_duration: Duration,
    ) -> Result<ValidatedBooking> {
        let skill = request.skill.trim();
        if skill.is_empty() {
            return Err(Error::validation("skill", "Skill cannot be empty"));
        }

        let start_time = parse_timestamp("start_time", &request.start_time)?;
        let end_time = parse_timestamp("end_time", &request.end_time)?;

        if start_time <= now {
            return Err(Error::validation(
                "start_time",
                "Start time must be in the future",
            ));
        }

        if end_time <= start_time {
            return Err(Error::validation(
                "end_time",
                "End time must be after the start time",
            ));
        }

        if end_time - start_time > max_duration {
            return Err(Error::validation(
                "end_time",
                format!(
                    "Sessions may not run longer than {} hours",
                    max_duration.num_hours()
                ),
            ));
        }

        if request.teacher_id == student_id {
            return Err(Error::validation(
                "teacher_id",
                "Cannot book a session with yourself",
            ));
        }

        Ok(ValidatedBooking {
            skill: skill.to_string(),
            start_time,
            end_time,
            teacher_id: request.teacher_id,
            notes: request.notes.clone(),
        })
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| Error::validation(field, "Must be a valid RFC 3339 timestamp"))
}
