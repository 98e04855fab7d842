//! Session operations
//!
//! One method per route of the session surface. All methods take the
//! authenticated caller's ID; authentication itself happens in the host.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::validators::BookingRequest;
use crate::domain::session::{Review, Session, SessionStatus, StatusChange};
use crate::domain::user::Role;
use crate::error::{Error, Result};

use super::Api;

/// Review as exposed to hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub rating: i64,
    pub comment: String,
    pub created_at: String,
}

impl From<&Review> for ReviewSummary {
    fn from(r: &Review) -> Self {
        Self {
            rating: r.rating,
            comment: r.comment.clone(),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Session as exposed to hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub skill: String,
    pub start_time: String,
    pub end_time: String,
    pub student_id: String,
    pub teacher_id: String,
    pub status: String,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
    pub student_review: Option<ReviewSummary>,
    pub teacher_review: Option<ReviewSummary>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Session> for SessionSummary {
    fn from(s: Session) -> Self {
        Self {
            id: s.id.to_string(),
            skill: s.skill,
            start_time: s.start_time.to_rfc3339(),
            end_time: s.end_time.to_rfc3339(),
            student_id: s.student_id.to_string(),
            teacher_id: s.teacher_id.to_string(),
            status: s.status.as_str().to_string(),
            meeting_link: s.meeting_link,
            notes: s.notes,
            student_review: s.student_review.as_ref().map(ReviewSummary::from),
            teacher_review: s.teacher_review.as_ref().map(ReviewSummary::from),
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// History entry as exposed to hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeSummary {
    pub status: String,
    pub changed_by: String,
    pub changed_at: String,
}

impl From<StatusChange> for StatusChangeSummary {
    fn from(c: StatusChange) -> Self {
        Self {
            status: c.status.as_str().to_string(),
            changed_by: c.changed_by.to_string(),
            changed_at: c.changed_at.to_rfc3339(),
        }
    }
}

fn parse_session_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::validation("session_id", format!("Invalid session ID: {}", id)))
}

impl Api {
    /// Book a session for the caller (POST /sessions)
    pub async fn create_session(
        &self,
        caller_id: Uuid,
        request: &BookingRequest,
    ) -> Result<SessionSummary> {
        let session = self.booking_service().create(caller_id, request).await?;
        Ok(SessionSummary::from(session))
    }

    /// List the caller's sessions on either side (GET /sessions)
    pub async fn my_sessions(&self, caller_id: Uuid) -> Result<Vec<SessionSummary>> {
        let sessions = self.session_service().list_for_participant(caller_id).await?;
        Ok(sessions.into_iter().map(SessionSummary::from).collect())
    }

    /// List the caller's teaching sessions (GET /sessions/teaching).
    ///
    /// Requires the teacher role; students get a forbidden error even when
    /// the listing would be empty.
    pub async fn teacher_sessions(&self, caller_id: Uuid) -> Result<Vec<SessionSummary>> {
        let caller = self
            .directory()
            .get(caller_id)
            .await?
            .ok_or_else(|| Error::not_found("User", caller_id))?;

        if caller.role != Role::Teacher {
            return Err(Error::forbidden("list teaching sessions"));
        }

        let sessions = self.session_service().list_for_teacher(caller_id).await?;
        Ok(sessions.into_iter().map(SessionSummary::from).collect())
    }

    /// Get one session (GET /sessions/:id)
    pub async fn get_session(&self, caller_id: Uuid, session_id: &str) -> Result<SessionSummary> {
        let id = parse_session_id(session_id)?;
        let session = self.session_service().get(id, caller_id).await?;
        Ok(SessionSummary::from(session))
    }

    /// Get a session's status history (GET /sessions/:id/history)
    pub async fn session_history(
        &self,
        caller_id: Uuid,
        session_id: &str,
    ) -> Result<Vec<StatusChangeSummary>> {
        let id = parse_session_id(session_id)?;
        let history = self.session_service().history(id, caller_id).await?;
        Ok(history.into_iter().map(StatusChangeSummary::from).collect())
    }

    /// Move a session to a new status (PATCH /sessions/:id/status)
    pub async fn update_session_status(
        &self,
        caller_id: Uuid,
        session_id: &str,
        status: &str,
    ) -> Result<SessionSummary> {
        let id = parse_session_id(session_id)?;
        let target = SessionStatus::parse(status)
            .ok_or_else(|| Error::validation("status", format!("Invalid status: {}", status)))?;

        let session = self.session_service().transition(id, caller_id, target).await?;
        Ok(SessionSummary::from(session))
    }

    /// Replace a session's notes (PATCH /sessions/:id/notes)
    pub async fn update_session_notes(
        &self,
        caller_id: Uuid,
        session_id: &str,
        notes: Option<String>,
    ) -> Result<SessionSummary> {
        let id = parse_session_id(session_id)?;
        let session = self.session_service().update_notes(id, caller_id, notes).await?;
        Ok(SessionSummary::from(session))
    }

    /// Set a session's meeting link (PATCH /sessions/:id/meeting-link)
    pub async fn update_meeting_link(
        &self,
        caller_id: Uuid,
        session_id: &str,
        meeting_link: String,
    ) -> Result<SessionSummary> {
        let id = parse_session_id(session_id)?;
        let session = self
            .session_service()
            .update_meeting_link(id, caller_id, meeting_link)
            .await?;
        Ok(SessionSummary::from(session))
    }

    /// Submit the caller's review of a session (POST /sessions/:id/reviews)
    pub async fn submit_review(
        &self,
        caller_id: Uuid,
        session_id: &str,
        rating: i64,
        comment: &str,
    ) -> Result<SessionSummary> {
        let id = parse_session_id(session_id)?;
        let session = self
            .review_service()
            .submit(id, caller_id, rating, comment)
            .await?;
        Ok(SessionSummary::from(session))
    }
}
