//! Booking service
//!
//! Admits new sessions. The pure request checks run first, then the
//! directory checks (teacher exists, teacher qualified), and last the
//! calendar probe, which happens inside the insert transaction so two
//! racing bookings for the same slot cannot both land.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::validators::{BookingRequest, BookingValidator};
use crate::domain::clock::Clock;
use crate::domain::session::{Session, SessionRepository};
use crate::domain::user::UserDirectory;
use crate::error::{Error, Result};

use super::policy::BookingPolicy;

/// Service admitting new session bookings
#[derive(Clone)]
pub struct BookingService {
    sessions: SessionRepository,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        sessions: SessionRepository,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            sessions,
            directory,
            clock,
            policy,
        }
    }

    /// Book a session for the given student.
    ///
    /// Checks run in a fixed order and stop at the first failure, so the
    /// caller sees the earliest problem with the request: the pure input
    /// rules, then teacher existence, then teacher qualification, then the
    /// calendar. A rejected booking leaves no trace in the store.
    pub async fn create(&self, student_id: Uuid, request: &BookingRequest) -> Result<Session> {
        let now = self.clock.now();
        let validated =
            BookingValidator::validate(request, student_id, now, self.policy.max_duration)?;

        let teacher = self
            .directory
            .get(validated.teacher_id)
            .await?
            .ok_or_else(|| Error::not_found("Teacher", validated.teacher_id))?;

        if !teacher.can_teach(&validated.skill) {
            warn!(
                teacher_id = %teacher.id,
                skill = %validated.skill,
                "Booking rejected: teacher not qualified"
            );
            return Err(Error::validation(
                "teacher_id",
                format!("Teacher is not qualified to teach {}", validated.skill),
            ));
        }

        let session = Session::new(
            validated.skill,
            validated.start_time,
            validated.end_time,
            student_id,
            validated.teacher_id,
            validated.notes,
            now,
        );

        self.sessions.insert_booking(&session).await?;

        info!(
            session_id = %session.id,
            student_id = %student_id,
            teacher_id = %session.teacher_id,
            skill = %session.skill,
            "Session booked"
        );

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::session::SessionStatus;
    use crate::domain::user::{SkillEntry, SkillLevel, User, UserRepository};
    use crate::storage::Database;
    use chrono::{DateTime, TimeZone, Utc};

    struct Fixture {
        service: BookingService,
        directory: Arc<dyn UserDirectory>,
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    async fn create_fixture() -> Fixture {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let directory: Arc<dyn UserDirectory> =
            Arc::new(UserRepository::new(db.pool().clone()));
        let service = BookingService::new(
            SessionRepository::new(db.pool().clone()),
            directory.clone(),
            Arc::new(FixedClock::at(base_time())),
            BookingPolicy::default(),
        );
        Fixture { service, directory }
    }

    async fn add_user(fixture: &Fixture, name: &str, skills: Vec<SkillEntry>) -> User {
        let email = format!("{}@example.com", name.to_lowercase());
        let user = User::new(name, &email, skills, base_time());
        fixture
            .directory
            .insert(&user)
            .await
            .expect("Failed to insert user");
        user
    }

    fn skill(name: &str, level: SkillLevel) -> SkillEntry {
        SkillEntry {
            name: name.to_string(),
            level,
        }
    }

    fn guitar_request(teacher_id: Uuid) -> BookingRequest {
        BookingRequest {
            skill: "Guitar".to_string(),
            start_time: "2025-06-02T10:00:00Z".to_string(),
            end_time: "2025-06-02T11:00:00Z".to_string(),
            teacher_id,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_successful_booking_is_pending() {
        let fixture = create_fixture().await;
        let teacher = add_user(&fixture, "Ada", vec![skill("Guitar", SkillLevel::Expert)]).await;
        let student = add_user(&fixture, "Ben", vec![]).await;

        let session = fixture
            .service
            .create(student.id, &guitar_request(teacher.id))
            .await
            .expect("Booking should succeed");

        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.student_id, student.id);
        assert_eq!(session.teacher_id, teacher.id);
        assert_eq!(session.skill, "Guitar");
    }

    #[tokio::test]
    async fn test_unknown_teacher_is_not_found() {
        let fixture = create_fixture().await;
        let student = add_user(&fixture, "Ben", vec![]).await;

        let result = fixture
            .service
            .create(student.id, &guitar_request(Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unqualified_teacher_rejected() {
        let fixture = create_fixture().await;
        // Teaching level on a different skill, and too low a level on the
        // requested one
        let teacher = add_user(
            &fixture,
            "Ada",
            vec![
                skill("Chess", SkillLevel::Expert),
                skill("Guitar", SkillLevel::Intermediate),
            ],
        )
        .await;
        let student = add_user(&fixture, "Ben", vec![]).await;

        let result = fixture
            .service
            .create(student.id, &guitar_request(teacher.id))
            .await;
        match result {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "teacher_id"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_skill_match_is_case_insensitive() {
        let fixture = create_fixture().await;
        let teacher = add_user(&fixture, "Ada", vec![skill("guitar", SkillLevel::Advanced)]).await;
        let student = add_user(&fixture, "Ben", vec![]).await;

        let mut request = guitar_request(teacher.id);
        request.skill = "GUITAR".to_string();

        let session = fixture
            .service
            .create(student.id, &request)
            .await
            .expect("Case difference should not matter");
        assert_eq!(session.skill, "GUITAR");
    }

    #[tokio::test]
    async fn test_overlap_rejected_before_store_write() {
        let fixture = create_fixture().await;
        let teacher = add_user(&fixture, "Ada", vec![skill("Guitar", SkillLevel::Expert)]).await;
        let student_a = add_user(&fixture, "Ben", vec![]).await;
        let student_b = add_user(&fixture, "Cam", vec![]).await;

        fixture
            .service
            .create(student_a.id, &guitar_request(teacher.id))
            .await
            .expect("First booking should succeed");

        // Second request straddles the first
        let mut request = guitar_request(teacher.id);
        request.start_time = "2025-06-02T10:30:00Z".to_string();
        request.end_time = "2025-06-02T11:30:00Z".to_string();

        let result = fixture.service.create(student_b.id, &request).await;
        assert!(matches!(result, Err(Error::BookingConflict { .. })));

        // Only the first booking landed
        let sessions = fixture
            .service
            .sessions
            .list_for_teacher(teacher.id)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_back_to_back_allowed() {
        let fixture = create_fixture().await;
        let teacher = add_user(&fixture, "Ada", vec![skill("Guitar", SkillLevel::Expert)]).await;
        let student = add_user(&fixture, "Ben", vec![]).await;

        fixture
            .service
            .create(student.id, &guitar_request(teacher.id))
            .await
            .expect("First booking should succeed");

        let mut request = guitar_request(teacher.id);
        request.start_time = "2025-06-02T11:00:00Z".to_string();
        request.end_time = "2025-06-02T12:00:00Z".to_string();

        fixture
            .service
            .create(student.id, &request)
            .await
            .expect("Back-to-back booking should succeed");
    }

    #[tokio::test]
    async fn test_validation_runs_before_directory() {
        let fixture = create_fixture().await;
        let student = add_user(&fixture, "Ben", vec![]).await;

        // Empty skill and an unknown teacher; validation error wins
        let mut request = guitar_request(Uuid::new_v4());
        request.skill = "  ".to_string();

        let result = fixture.service.create(student.id, &request).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_self_booking_rejected_even_if_qualified() {
        let fixture = create_fixture().await;
        let teacher = add_user(&fixture, "Ada", vec![skill("Guitar", SkillLevel::Expert)]).await;

        let result = fixture
            .service
            .create(teacher.id, &guitar_request(teacher.id))
            .await;
        match result {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "teacher_id"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}
