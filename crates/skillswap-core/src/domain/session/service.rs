//! Session service for lifecycle operations
//!
//! Wraps the repository with the permission and state rules: participant
//! gating on reads, the transition table plus role/time rules on status
//! changes, and the ownership rules on notes and meeting-link updates.

use chrono::Duration;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::error::{Error, Result};

use super::history::StatusChange;
use super::lifecycle::{allowed_targets, permitted_transitions};
use super::repository::SessionRepository;
use super::session::{Session, SessionStatus};

/// Service for session lifecycle operations
#[derive(Clone)]
pub struct SessionService {
    repository: SessionRepository,
    clock: Arc<dyn Clock>,
    cancel_cutoff: Duration,
}

impl SessionService {
    /// Create a new session service
    pub fn new(repository: SessionRepository, clock: Arc<dyn Clock>, cancel_cutoff: Duration) -> Self {
        Self {
            repository,
            clock,
            cancel_cutoff,
        }
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &SessionRepository {
        &self.repository
    }

    /// Load a session and require the caller to be a participant
    async fn load_for(&self, session_id: Uuid, caller_id: Uuid, action: &str) -> Result<Session> {
        let session = self
            .repository
            .get(session_id)
            .await?
            .ok_or_else(|| Error::not_found("Session", session_id))?;

        if !session.is_participant(caller_id) {
            return Err(Error::forbidden(action));
        }

        Ok(session)
    }

    // ========== Reads ==========

    /// Get a session; participants only
    pub async fn get(&self, session_id: Uuid, caller_id: Uuid) -> Result<Session> {
        self.load_for(session_id, caller_id, "view this session").await
    }

    /// List the caller's sessions (as student or teacher), newest start first
    pub async fn list_for_participant(&self, caller_id: Uuid) -> Result<Vec<Session>> {
        self.repository.list_for_participant(caller_id).await
    }

    /// List the caller's teaching sessions, newest start first
    pub async fn list_for_teacher(&self, caller_id: Uuid) -> Result<Vec<Session>> {
        self.repository.list_for_teacher(caller_id).await
    }

    /// Status history of a session, oldest first; participants only
    pub async fn history(&self, session_id: Uuid, caller_id: Uuid) -> Result<Vec<StatusChange>> {
        self.load_for(session_id, caller_id, "view this session").await?;
        self.repository.history(session_id).await
    }

    // ========== Status Transitions ==========

    /// Move a session to a new status on behalf of the caller.
    ///
    /// The transition-table check runs before the permission check, so a
    /// participant asking for an unreachable status learns the allowed set
    /// rather than getting a permission error.
    pub async fn transition(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
        to: SessionStatus,
    ) -> Result<Session> {
        let session = self.load_for(session_id, caller_id, "update this session").await?;
        let from = session.status;

        let reachable = allowed_targets(from);
        if !reachable.contains(&to) {
            return Err(Error::InvalidTransition {
                from,
                to,
                allowed: reachable.to_vec(),
            });
        }

        let now = self.clock.now();
        if !permitted_transitions(&session, caller_id, now, self.cancel_cutoff).contains(&to) {
            return Err(Error::forbidden(describe_transition(to)));
        }

        let applied = self
            .repository
            .update_status(session_id, from, to, caller_id, now)
            .await?;

        if !applied {
            // Lost a race; report the transition against the fresh status
            let current = self
                .repository
                .get(session_id)
                .await?
                .ok_or_else(|| Error::not_found("Session", session_id))?;
            return Err(Error::InvalidTransition {
                from: current.status,
                to,
                allowed: allowed_targets(current.status).to_vec(),
            });
        }

        info!(
            session_id = %session_id,
            from = %from,
            to = %to,
            changed_by = %caller_id,
            "Session status changed"
        );

        self.repository
            .get(session_id)
            .await?
            .ok_or_else(|| Error::not_found("Session", session_id))
    }

    // ========== Auxiliary Mutations ==========

    /// Replace the notes; either participant, any status
    pub async fn update_notes(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
        notes: Option<String>,
    ) -> Result<Session> {
        self.load_for(session_id, caller_id, "update this session's notes")
            .await?;

        let now = self.clock.now();
        self.repository.update_notes(session_id, notes, now).await?;

        self.repository
            .get(session_id)
            .await?
            .ok_or_else(|| Error::not_found("Session", session_id))
    }

    /// Set the meeting link; student only, confirmed sessions only
    pub async fn update_meeting_link(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
        meeting_link: String,
    ) -> Result<Session> {
        let session = self
            .load_for(session_id, caller_id, "update this session")
            .await?;

        if !session.is_student(caller_id) {
            return Err(Error::forbidden("set the meeting link"));
        }

        if session.status != SessionStatus::Confirmed {
            return Err(Error::InvalidState {
                operation: "set the meeting link".to_string(),
                status: session.status,
            });
        }

        let now = self.clock.now();
        self.repository
            .update_meeting_link(session_id, meeting_link, now)
            .await?;

        info!(session_id = %session_id, "Meeting link set");

        self.repository
            .get(session_id)
            .await?
            .ok_or_else(|| Error::not_found("Session", session_id))
    }
}

fn describe_transition(to: SessionStatus) -> &'static str {
    match to {
        SessionStatus::Confirmed => "confirm this session",
        SessionStatus::Completed => "complete this session",
        SessionStatus::Cancelled => "cancel this session inside the cancellation window",
        SessionStatus::Pending => "reopen this session",
    }
}
