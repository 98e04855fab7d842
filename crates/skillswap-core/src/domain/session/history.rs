//! Status history entries
//!
//! Every accepted transition appends one entry; creation and rejected
//! attempts append nothing. The history is the audit trail for moderation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::SessionStatus;

/// One accepted status transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    /// Unique entry identifier
    pub id: Uuid,

    /// Session this entry belongs to
    pub session_id: Uuid,

    /// Status the session moved to
    pub status: SessionStatus,

    /// Participant who requested the transition
    pub changed_by: Uuid,

    /// When the transition was accepted
    pub changed_at: DateTime<Utc>,
}

impl StatusChange {
    /// Create a new history entry
    pub fn new(
        session_id: Uuid,
        status: SessionStatus,
        changed_by: Uuid,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            status,
            changed_by,
            changed_at,
        }
    }
}
