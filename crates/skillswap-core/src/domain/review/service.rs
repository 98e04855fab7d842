//! Review service
//!
//! Accepts review submissions on completed sessions and settles rating
//! aggregates once both participants have written theirs. Settlement is a
//! full recompute, so replays and races converge on the same numbers.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::validators::ReviewValidator;
use crate::domain::clock::Clock;
use crate::domain::session::{Review, Session, SessionRepository, SessionStatus};
use crate::error::{Error, Result};

use super::repository::{ReviewRepository, ReviewSlot};

/// Service accepting reviews and settling ratings
#[derive(Clone)]
pub struct ReviewService {
    sessions: SessionRepository,
    reviews: ReviewRepository,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    /// Create a new review service
    pub fn new(sessions: SessionRepository, reviews: ReviewRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions,
            reviews,
            clock,
        }
    }

    /// Submit the caller's review of a session.
    ///
    /// Preconditions check in order: the session exists, it is completed,
    /// the caller participates in it, the payload is valid, and the caller's
    /// slot is still empty. The slot write itself is guarded, so a racing
    /// duplicate resolves to one stored review and one error.
    pub async fn submit(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
        rating: i64,
        comment: &str,
    ) -> Result<Session> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::not_found("Session", session_id))?;

        if session.status != SessionStatus::Completed {
            return Err(Error::InvalidState {
                operation: "review this session".to_string(),
                status: session.status,
            });
        }

        if !session.is_participant(caller_id) {
            return Err(Error::forbidden("review this session"));
        }

        ReviewValidator::validate_rating(rating)?;
        let comment = ReviewValidator::validate_comment(comment)?;

        if session.review_by(caller_id).is_some() {
            return Err(Error::AlreadyReviewed);
        }

        let slot = if session.is_student(caller_id) {
            ReviewSlot::Student
        } else {
            ReviewSlot::Teacher
        };

        let review = Review::new(rating, comment, self.clock.now());
        let landed = self.reviews.record(session_id, slot, &review).await?;
        if !landed {
            // Lost a duplicate-submission race
            return Err(Error::AlreadyReviewed);
        }

        info!(
            session_id = %session_id,
            reviewer_id = %caller_id,
            rating = rating,
            "Review submitted"
        );

        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::not_found("Session", session_id))?;

        if session.is_fully_reviewed() {
            self.settle(&session).await?;
        }

        Ok(session)
    }

    /// Recompute both participants' aggregates from stored reviews
    async fn settle(&self, session: &Session) -> Result<()> {
        self.reviews.refresh_teacher_rating(session.teacher_id).await?;
        self.reviews.refresh_student_rating(session.student_id).await?;

        info!(
            session_id = %session.id,
            student_id = %session.student_id,
            teacher_id = %session.teacher_id,
            "Ratings settled"
        );
        Ok(())
    }
}
