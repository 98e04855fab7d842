//! Session lifecycle rules
//!
//! One decision point for the transition table and the role/time permission
//! rules, instead of per-route conditionals. The service layer calls
//! [`permitted_transitions`] and rejects anything outside the returned set.
//!
//! Transition table:
//!
//! ```text
//! pending   → confirmed | cancelled
//! confirmed → completed | cancelled
//! completed → (terminal)
//! cancelled → (terminal)
//! ```

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::session::{Session, SessionStatus};

/// Targets reachable from a status, before permission checks
pub fn allowed_targets(from: SessionStatus) -> &'static [SessionStatus] {
    match from {
        SessionStatus::Pending => &[SessionStatus::Confirmed, SessionStatus::Cancelled],
        SessionStatus::Confirmed => &[SessionStatus::Completed, SessionStatus::Cancelled],
        SessionStatus::Completed | SessionStatus::Cancelled => &[],
    }
}

/// Whether the caller may cancel at this instant.
///
/// Either participant may cancel while more than `cancel_cutoff` remains
/// before the start; inside the cutoff only the teacher may, which protects
/// teachers from late no-shows.
fn may_cancel(session: &Session, caller_id: Uuid, now: DateTime<Utc>, cancel_cutoff: Duration) -> bool {
    if session.is_teacher(caller_id) {
        return true;
    }
    session.is_student(caller_id) && session.start_time - now > cancel_cutoff
}

/// Transitions the caller may perform on the session right now.
///
/// Non-participants get an empty set; so do terminal sessions.
pub fn permitted_transitions(
    session: &Session,
    caller_id: Uuid,
    now: DateTime<Utc>,
    cancel_cutoff: Duration,
) -> Vec<SessionStatus> {
    if !session.is_participant(caller_id) {
        return Vec::new();
    }

    allowed_targets(session.status)
        .iter()
        .copied()
        .filter(|target| match target {
            SessionStatus::Confirmed | SessionStatus::Completed => session.is_teacher(caller_id),
            SessionStatus::Cancelled => may_cancel(session, caller_id, now, cancel_cutoff),
            SessionStatus::Pending => false,
        })
        .collect()
}
