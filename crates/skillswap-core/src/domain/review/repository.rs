//! Review persistence
//!
//! Reviews live in dedicated columns on the session row, one slot per
//! participant. The slot write is a guarded UPDATE keyed on the slot still
//! being empty, so two racing submissions from the same participant resolve
//! to exactly one stored review. Rating settlement is a single UPDATE with
//! an aggregate subquery and never drifts under concurrent submissions.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::session::{Review, SessionStatus};
use crate::error::Result;

/// Which participant's review slot to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSlot {
    /// The student's review of the teacher
    Student,
    /// The teacher's review of the student
    Teacher,
}

impl ReviewSlot {
    fn column_prefix(&self) -> &'static str {
        match self {
            Self::Student => "student_review",
            Self::Teacher => "teacher_review",
        }
    }
}

/// Repository for review slots and rating aggregates
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    /// Create a new review repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write a review into its slot if the slot is still empty.
    ///
    /// Returns `true` if the review landed, `false` if the slot was already
    /// filled or the session is not completed.
    pub async fn record(
        &self,
        session_id: Uuid,
        slot: ReviewSlot,
        review: &Review,
    ) -> Result<bool> {
        let prefix = slot.column_prefix();
        let sql = format!(
            "UPDATE sessions \
             SET {prefix}_rating = ?, {prefix}_comment = ?, {prefix}_created_at = ?, updated_at = ? \
             WHERE id = ? AND status = ? AND {prefix}_rating IS NULL",
        );

        let result = sqlx::query(&sql)
            .bind(review.rating)
            .bind(&review.comment)
            .bind(review.created_at)
            .bind(review.created_at)
            .bind(session_id.to_string())
            .bind(SessionStatus::Completed.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Recompute a student's aggregate from scratch.
    ///
    /// Only fully reviewed sessions count: the rating a student receives is
    /// the teacher's review, taken from sessions where both slots are filled.
    pub async fn refresh_student_rating(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET rating = COALESCE((
                    SELECT AVG(teacher_review_rating) FROM sessions
                    WHERE student_id = ?1
                      AND student_review_rating IS NOT NULL
                      AND teacher_review_rating IS NOT NULL
                ), 0.0),
                rating_count = (
                    SELECT COUNT(*) FROM sessions
                    WHERE student_id = ?1
                      AND student_review_rating IS NOT NULL
                      AND teacher_review_rating IS NOT NULL
                )
            WHERE id = ?1
            "#,
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recompute a teacher's aggregate from scratch, mirroring
    /// [`Self::refresh_student_rating`] with the slots swapped.
    pub async fn refresh_teacher_rating(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET rating = COALESCE((
                    SELECT AVG(student_review_rating) FROM sessions
                    WHERE teacher_id = ?1
                      AND student_review_rating IS NOT NULL
                      AND teacher_review_rating IS NOT NULL
                ), 0.0),
                rating_count = (
                    SELECT COUNT(*) FROM sessions
                    WHERE teacher_id = ?1
                      AND student_review_rating IS NOT NULL
                      AND teacher_review_rating IS NOT NULL
                )
            WHERE id = ?1
            "#,
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
