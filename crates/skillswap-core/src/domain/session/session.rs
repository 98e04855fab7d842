//! Session entity and related types
//!
//! Defines the core Session type, its status enum, and the embedded review
//! slots written by the review settlement component.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Session status indicating the current lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Booked by the student, awaiting teacher confirmation
    Pending,
    /// Accepted by the teacher
    Confirmed,
    /// Held and finished; eligible for review
    Completed,
    /// Called off by a participant
    Cancelled,
}

impl SessionStatus {
    /// Create from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Check if the session still occupies the teacher's calendar slot
    pub fn blocks_bookings(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Check if the session reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A participant's review of a completed session. Write-once per slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Rating from 1 to 5
    pub rating: i64,
    /// Free-text comment, non-empty after trimming
    pub comment: String,
    /// When the review was submitted
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Create a new review
    pub fn new(rating: i64, comment: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            rating,
            comment: comment.into(),
            created_at: now,
        }
    }
}

/// A booked teaching session between one student and one teacher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: Uuid,

    /// Subject taught, non-empty
    pub skill: String,

    /// Scheduled start
    pub start_time: DateTime<Utc>,

    /// Scheduled end; always after the start, at most the policy maximum later
    pub end_time: DateTime<Utc>,

    /// The booking student
    pub student_id: Uuid,

    /// The teaching user; never equal to the student
    pub teacher_id: Uuid,

    /// Current lifecycle status
    pub status: SessionStatus,

    /// Call link, contributed by the student once the session is confirmed
    pub meeting_link: Option<String>,

    /// Shared free-text notes
    pub notes: Option<String>,

    /// Student's review of the teacher, written after completion
    pub student_review: Option<Review>,

    /// Teacher's review of the student, written after completion
    pub teacher_review: Option<Review>,

    /// When the session was booked
    pub created_at: DateTime<Utc>,

    /// When the session was last mutated
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new pending session
    pub fn new(
        skill: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        student_id: Uuid,
        teacher_id: Uuid,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            skill: skill.into(),
            start_time,
            end_time,
            student_id,
            teacher_id,
            status: SessionStatus::Pending,
            meeting_link: None,
            notes,
            student_review: None,
            teacher_review: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scheduled duration
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Whether the user is the session's student
    pub fn is_student(&self, user_id: Uuid) -> bool {
        self.student_id == user_id
    }

    /// Whether the user is the session's teacher
    pub fn is_teacher(&self, user_id: Uuid) -> bool {
        self.teacher_id == user_id
    }

    /// Whether the user participates in the session at all
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.is_student(user_id) || self.is_teacher(user_id)
    }

    /// Half-open interval overlap test against another window.
    ///
    /// Back-to-back sessions (one ending exactly when the next starts) do
    /// not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }

    /// The review written by the given participant, if any
    pub fn review_by(&self, user_id: Uuid) -> Option<&Review> {
        if self.is_student(user_id) {
            self.student_review.as_ref()
        } else if self.is_teacher(user_id) {
            self.teacher_review.as_ref()
        } else {
            None
        }
    }

    /// Whether both participants have reviewed (settlement trigger)
    pub fn is_fully_reviewed(&self) -> bool {
        self.student_review.is_some() && self.teacher_review.is_some()
    }

    /// Refresh the updated-at timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
