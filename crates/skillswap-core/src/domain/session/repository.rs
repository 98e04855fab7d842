//! Session repository for database operations
//!
//! Handles all database interactions for sessions and their status history.
//! The two write paths with invariants (booking insert, status transition)
//! run inside transactions so concurrent requests cannot both succeed.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::history::StatusChange;
use super::session::{Review, Session, SessionStatus};

/// Repository for session database operations
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========== Booking ==========

    /// Insert a new pending session unless it overlaps one of the teacher's
    /// pending/confirmed sessions.
    ///
    /// The overlap check and the insert share one transaction; a concurrent
    /// booking for the same teacher serializes behind it and sees the row.
    pub async fn insert_booking(&self, session: &Session) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let conflict: Option<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT start_time, end_time
            FROM sessions
            WHERE teacher_id = ?
              AND status IN ('pending', 'confirmed')
              AND start_time < ?
              AND end_time > ?
            LIMIT 1
            "#,
        )
        .bind(session.teacher_id.to_string())
        .bind(session.end_time)
        .bind(session.start_time)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if let Some((start, end)) = conflict {
            return Err(Error::BookingConflict { start, end });
        }

        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, skill, start_time, end_time, student_id, teacher_id,
                status, meeting_link, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.id.to_string())
        .bind(&session.skill)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.student_id.to_string())
        .bind(session.teacher_id.to_string())
        .bind(session.status.as_str())
        .bind(&session.meeting_link)
        .bind(&session.notes)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    // ========== Reads ==========

    /// Get a session by ID
    pub async fn get(&self, session_id: Uuid) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(&select_sessions("WHERE id = ?"))
            .bind(session_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => Ok(Some(row.into_session()?)),
            None => Ok(None),
        }
    }

    /// List sessions where the user is student or teacher, newest start first
    pub async fn list_for_participant(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let id = user_id.to_string();

        let rows: Vec<SessionRow> = sqlx::query_as(&select_sessions(
            "WHERE student_id = ? OR teacher_id = ? ORDER BY start_time DESC",
        ))
        .bind(&id)
        .bind(&id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(|row| row.into_session()).collect()
    }

    /// List sessions taught by the user, newest start first
    pub async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(&select_sessions(
            "WHERE teacher_id = ? ORDER BY start_time DESC",
        ))
        .bind(teacher_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(|row| row.into_session()).collect()
    }

    /// List all sessions, newest start first (operator inspection)
    pub async fn list_all(&self, limit: Option<i32>) -> Result<Vec<Session>> {
        let limit = limit.unwrap_or(50);

        let rows: Vec<SessionRow> =
            sqlx::query_as(&select_sessions("ORDER BY start_time DESC LIMIT ?"))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        rows.into_iter().map(|row| row.into_session()).collect()
    }

    /// Count sessions by status
    pub async fn count_by_status(&self, status: SessionStatus) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(count)
    }

    // ========== Mutations ==========

    /// Compare-and-set status update with a history append.
    ///
    /// Returns `false` when the session no longer holds `from`, in which
    /// case nothing is written; the caller re-reads and reports the
    /// transition failure against the fresh status.
    pub async fn update_status(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
        changed_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result = sqlx::query(
            r#"
            UPDATE sessions SET status = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to.as_str())
        .bind(now)
        .bind(session_id.to_string())
        .bind(from.as_str())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let entry = StatusChange::new(session_id, to, changed_by, now);
        sqlx::query(
            r#"
            INSERT INTO session_status_history (id, session_id, status, changed_by, changed_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.session_id.to_string())
        .bind(entry.status.as_str())
        .bind(entry.changed_by.to_string())
        .bind(entry.changed_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(true)
    }

    /// Replace the session notes
    pub async fn update_notes(
        &self,
        session_id: Uuid,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE sessions SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(&notes)
            .bind(now)
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(())
    }

    /// Replace the meeting link
    pub async fn update_meeting_link(
        &self,
        session_id: Uuid,
        meeting_link: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE sessions SET meeting_link = ?, updated_at = ? WHERE id = ?")
            .bind(&meeting_link)
            .bind(now)
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(())
    }

    // ========== Status History ==========

    /// Status history for a session, oldest first
    pub async fn history(&self, session_id: Uuid) -> Result<Vec<StatusChange>> {
        let rows: Vec<StatusChangeRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, status, changed_by, changed_at
            FROM session_status_history
            WHERE session_id = ?
            ORDER BY changed_at ASC, rowid ASC
            "#,
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(|row| row.into_status_change()).collect()
    }
}

fn select_sessions(tail: &str) -> String {
    format!(
        r#"
        SELECT id, skill, start_time, end_time, student_id, teacher_id,
               status, meeting_link, notes,
               student_review_rating, student_review_comment, student_review_created_at,
               teacher_review_rating, teacher_review_comment, teacher_review_created_at,
               created_at, updated_at
        FROM sessions
        {}
        "#,
        tail
    )
}

// ========== Database Row Types ==========

/// Database row for a full session
#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    skill: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    student_id: String,
    teacher_id: String,
    status: String,
    meeting_link: Option<String>,
    notes: Option<String>,
    student_review_rating: Option<i64>,
    student_review_comment: Option<String>,
    student_review_created_at: Option<DateTime<Utc>>,
    teacher_review_rating: Option<i64>,
    teacher_review_comment: Option<String>,
    teacher_review_created_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn review_from_columns(
    rating: Option<i64>,
    comment: Option<String>,
    created_at: Option<DateTime<Utc>>,
) -> Result<Option<Review>> {
    match (rating, comment, created_at) {
        (Some(rating), Some(comment), Some(created_at)) => Ok(Some(Review {
            rating,
            comment,
            created_at,
        })),
        (None, None, None) => Ok(None),
        _ => Err(Error::Parse("Partially written review columns".to_string())),
    }
}

impl SessionRow {
    fn into_session(self) -> Result<Session> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid session ID: {}", e)))?;
        let student_id = Uuid::parse_str(&self.student_id)
            .map_err(|e| Error::Parse(format!("Invalid student ID: {}", e)))?;
        let teacher_id = Uuid::parse_str(&self.teacher_id)
            .map_err(|e| Error::Parse(format!("Invalid teacher ID: {}", e)))?;
        let status = SessionStatus::parse(&self.status)
            .ok_or_else(|| Error::Parse(format!("Invalid session status: {}", self.status)))?;
        let student_review = review_from_columns(
            self.student_review_rating,
            self.student_review_comment,
            self.student_review_created_at,
        )?;
        let teacher_review = review_from_columns(
            self.teacher_review_rating,
            self.teacher_review_comment,
            self.teacher_review_created_at,
        )?;

        Ok(Session {
            id,
            skill: self.skill,
            start_time: self.start_time,
            end_time: self.end_time,
            student_id,
            teacher_id,
            status,
            meeting_link: self.meeting_link,
            notes: self.notes,
            student_review,
            teacher_review,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row for a status history entry
#[derive(sqlx::FromRow)]
struct StatusChangeRow {
    id: String,
    session_id: String,
    status: String,
    changed_by: String,
    changed_at: DateTime<Utc>,
}

impl StatusChangeRow {
    fn into_status_change(self) -> Result<StatusChange> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid history entry ID: {}", e)))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| Error::Parse(format!("Invalid session ID: {}", e)))?;
        let changed_by = Uuid::parse_str(&self.changed_by)
            .map_err(|e| Error::Parse(format!("Invalid user ID: {}", e)))?;
        let status = SessionStatus::parse(&self.status)
            .ok_or_else(|| Error::Parse(format!("Invalid status: {}", self.status)))?;

        Ok(StatusChange {
            id,
            session_id,
            status,
            changed_by,
            changed_at: self.changed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::{Duration, TimeZone};

    async fn create_test_repo() -> SessionRepository {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        SessionRepository::new(db.pool().clone())
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn make_session(teacher_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Session {
        Session::new(
            "Guitar",
            start,
            end,
            Uuid::new_v4(),
            teacher_id,
            None,
            ts(0, 0),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_session() {
        let repo = create_test_repo().await;

        let session = make_session(Uuid::new_v4(), ts(10, 0), ts(11, 0));
        repo.insert_booking(&session).await.expect("Failed to insert");

        let retrieved = repo
            .get(session.id)
            .await
            .expect("Failed to get")
            .expect("Session not found");

        assert_eq!(retrieved.id, session.id);
        assert_eq!(retrieved.skill, "Guitar");
        assert_eq!(retrieved.status, SessionStatus::Pending);
        assert_eq!(retrieved.start_time, session.start_time);
    }

    #[tokio::test]
    async fn test_overlapping_booking_rejected() {
        let repo = create_test_repo().await;
        let teacher_id = Uuid::new_v4();

        let first = make_session(teacher_id, ts(10, 0), ts(11, 0));
        repo.insert_booking(&first).await.expect("Failed to insert");

        let overlapping = make_session(teacher_id, ts(10, 30), ts(11, 30));
        let result = repo.insert_booking(&overlapping).await;

        match result {
            Err(Error::BookingConflict { start, end }) => {
                assert_eq!(start, first.start_time);
                assert_eq!(end, first.end_time);
            }
            other => panic!("Expected BookingConflict, got {:?}", other),
        }

        // The rejected insert left nothing behind
        assert!(repo.get(overlapping.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_back_to_back_booking_allowed() {
        let repo = create_test_repo().await;
        let teacher_id = Uuid::new_v4();

        let first = make_session(teacher_id, ts(10, 0), ts(11, 0));
        repo.insert_booking(&first).await.expect("Failed to insert");

        let adjacent = make_session(teacher_id, ts(11, 0), ts(12, 0));
        repo.insert_booking(&adjacent)
            .await
            .expect("Back-to-back booking should be allowed");
    }

    #[tokio::test]
    async fn test_other_teacher_not_blocked() {
        let repo = create_test_repo().await;

        let first = make_session(Uuid::new_v4(), ts(10, 0), ts(11, 0));
        repo.insert_booking(&first).await.expect("Failed to insert");

        let other_teacher = make_session(Uuid::new_v4(), ts(10, 0), ts(11, 0));
        repo.insert_booking(&other_teacher)
            .await
            .expect("Different teacher should not conflict");
    }

    #[tokio::test]
    async fn test_cancelled_session_frees_slot() {
        let repo = create_test_repo().await;
        let teacher_id = Uuid::new_v4();

        let first = make_session(teacher_id, ts(10, 0), ts(11, 0));
        repo.insert_booking(&first).await.expect("Failed to insert");
        repo.update_status(
            first.id,
            SessionStatus::Pending,
            SessionStatus::Cancelled,
            first.student_id,
            ts(9, 0),
        )
        .await
        .expect("Failed to cancel");

        let replacement = make_session(teacher_id, ts(10, 0), ts(11, 0));
        repo.insert_booking(&replacement)
            .await
            .expect("Cancelled session should free the slot");
    }

    #[tokio::test]
    async fn test_update_status_compare_and_set() {
        let repo = create_test_repo().await;
        let session = make_session(Uuid::new_v4(), ts(10, 0), ts(11, 0));
        repo.insert_booking(&session).await.expect("Failed to insert");

        // First transition wins
        let applied = repo
            .update_status(
                session.id,
                SessionStatus::Pending,
                SessionStatus::Confirmed,
                session.teacher_id,
                ts(9, 0),
            )
            .await
            .expect("Failed to update status");
        assert!(applied);

        // A racing transition expecting the old status loses
        let applied = repo
            .update_status(
                session.id,
                SessionStatus::Pending,
                SessionStatus::Cancelled,
                session.student_id,
                ts(9, 1),
            )
            .await
            .expect("Failed to attempt update");
        assert!(!applied);

        let reloaded = repo.get(session.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, SessionStatus::Confirmed);

        // Only the winner appended history
        let history = repo.history(session.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, SessionStatus::Confirmed);
        assert_eq!(history[0].changed_by, session.teacher_id);
    }

    #[tokio::test]
    async fn test_history_ordering() {
        let repo = create_test_repo().await;
        let session = make_session(Uuid::new_v4(), ts(10, 0), ts(11, 0));
        repo.insert_booking(&session).await.expect("Failed to insert");

        repo.update_status(
            session.id,
            SessionStatus::Pending,
            SessionStatus::Confirmed,
            session.teacher_id,
            ts(8, 0),
        )
        .await
        .unwrap();
        repo.update_status(
            session.id,
            SessionStatus::Confirmed,
            SessionStatus::Completed,
            session.teacher_id,
            ts(11, 30),
        )
        .await
        .unwrap();

        let history = repo.history(session.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, SessionStatus::Confirmed);
        assert_eq!(history[1].status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_notes_and_meeting_link() {
        let repo = create_test_repo().await;
        let session = make_session(Uuid::new_v4(), ts(10, 0), ts(11, 0));
        repo.insert_booking(&session).await.expect("Failed to insert");

        repo.update_notes(session.id, Some("Bring a capo".to_string()), ts(9, 0))
            .await
            .expect("Failed to update notes");
        repo.update_meeting_link(session.id, "https://meet.example/abc".to_string(), ts(9, 5))
            .await
            .expect("Failed to update meeting link");

        let reloaded = repo.get(session.id).await.unwrap().unwrap();
        assert_eq!(reloaded.notes, Some("Bring a capo".to_string()));
        assert_eq!(
            reloaded.meeting_link,
            Some("https://meet.example/abc".to_string())
        );
        assert_eq!(reloaded.updated_at, ts(9, 5));
    }

    #[tokio::test]
    async fn test_list_for_participant_ordering() {
        let repo = create_test_repo().await;
        let teacher_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();

        let mut early = make_session(teacher_id, ts(9, 0), ts(10, 0));
        early.student_id = student_id;
        let mut late = make_session(teacher_id, ts(14, 0), ts(15, 0));
        late.student_id = student_id;

        repo.insert_booking(&early).await.unwrap();
        repo.insert_booking(&late).await.unwrap();

        let sessions = repo.list_for_participant(student_id).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, late.id, "newest start first");
        assert_eq!(sessions[1].id, early.id);

        let teaching = repo.list_for_teacher(teacher_id).await.unwrap();
        assert_eq!(teaching.len(), 2);

        let stranger = repo.list_for_participant(Uuid::new_v4()).await.unwrap();
        assert!(stranger.is_empty());
    }
}
