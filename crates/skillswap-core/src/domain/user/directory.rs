//! Identity directory trait
//!
//! The booking and review components only need lookups and profile writes;
//! credential storage and token verification live outside the core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

use super::user::{SkillEntry, User};

/// Directory of registered users
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Get a user by ID
    async fn get(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Get a user by email (stored lowercased)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Save a new user
    async fn insert(&self, user: &User) -> Result<()>;

    /// Update name, bio, and skills; the role is recomputed from the skills
    async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        bio: Option<String>,
        skills: Option<Vec<SkillEntry>>,
        now: DateTime<Utc>,
    ) -> Result<User>;

    /// List users, newest first (operator inspection)
    async fn list(&self, limit: Option<i32>) -> Result<Vec<User>>;
}
