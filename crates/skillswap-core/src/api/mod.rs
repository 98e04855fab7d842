//! Embedding API
//!
//! A front door for hosts (HTTP gateways, bots, test harnesses) that mirrors
//! the route surface one operation per method. Handles identifier parsing,
//! wires the services together, and translates domain errors into
//! serializable bodies with an HTTP-ish status code.

pub mod sessions;

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::booking::{BookingPolicy, BookingService};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::review::{ReviewRepository, ReviewService};
use crate::domain::session::{SessionRepository, SessionService};
use crate::domain::user::{UserDirectory, UserRepository};
use crate::error::Error;
use crate::storage::{Database, DatabaseConfig};

pub use sessions::{ReviewSummary, SessionSummary, StatusChangeSummary};

/// Serializable error body, one per failed operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP-equivalent status code
    pub status: u16,
    /// Human-readable message
    pub error: String,
    /// Machine-readable context, present for some error kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        let details = match err {
            Error::Validation { field, .. } => Some(json!({ "field": field })),
            Error::InvalidTransition { from, to, allowed } => Some(json!({
                "current_status": from.as_str(),
                "requested_status": to.as_str(),
                "allowed": allowed.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            })),
            Error::BookingConflict { start, end } => Some(json!({
                "start_time": start.to_rfc3339(),
                "end_time": end.to_rfc3339(),
            })),
            _ => None,
        };

        Self {
            status: err.http_status(),
            error: err.to_string(),
            details,
        }
    }
}

/// The assembled service stack behind the operation surface
#[derive(Clone)]
pub struct Api {
    booking: BookingService,
    sessions: SessionService,
    reviews: ReviewService,
    directory: Arc<dyn UserDirectory>,
}

impl Api {
    /// Wire up the services over an open database
    pub fn new(db: &Database, policy: BookingPolicy, clock: Arc<dyn Clock>) -> Self {
        let session_repo = SessionRepository::new(db.pool().clone());
        let directory: Arc<dyn UserDirectory> = Arc::new(UserRepository::new(db.pool().clone()));

        Self {
            booking: BookingService::new(
                session_repo.clone(),
                directory.clone(),
                clock.clone(),
                policy,
            ),
            sessions: SessionService::new(session_repo.clone(), clock.clone(), policy.cancel_cutoff),
            reviews: ReviewService::new(
                session_repo,
                ReviewRepository::new(db.pool().clone()),
                clock,
            ),
            directory,
        }
    }

    /// Open the configured database and wire up the services
    pub async fn init(config: &Config) -> crate::Result<Self> {
        let db_config = match &config.database.path {
            Some(path) => DatabaseConfig::with_path(path).max_connections(config.database.max_connections),
            None => DatabaseConfig::default().max_connections(config.database.max_connections),
        };

        let db = Database::new(db_config)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Configuration(e.into())))?;

        Ok(Self::new(&db, config.booking_policy(), Arc::new(SystemClock)))
    }

    /// The user directory behind this API
    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub(crate) fn booking_service(&self) -> &BookingService {
        &self.booking
    }

    pub(crate) fn session_service(&self) -> &SessionService {
        &self.sessions
    }

    pub(crate) fn review_service(&self) -> &ReviewService {
        &self.reviews
    }
}
