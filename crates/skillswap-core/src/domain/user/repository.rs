//! SQLite-backed user directory
//!
//! Skills are stored as a JSON column; the role column is kept consistent
//! with the skills on every profile write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::directory::UserDirectory;
use super::user::{Role, SkillEntry, User};

/// Repository for user database operations
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        let id = user_id.to_string();

        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, role, bio, skills, rating, rating_count,
                   created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(&id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Ok(Some(row.into_user()?)),
            None => Ok(None),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();

        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, role, bio, skills, rating, rating_count,
                   created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Ok(Some(row.into_user()?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, user: &User) -> Result<()> {
        let id = user.id.to_string();
        let skills = serde_json::to_string(&user.skills)
            .map_err(|e| Error::Parse(format!("Invalid skills payload: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, role, bio, skills, rating, rating_count,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&skills)
        .bind(user.rating)
        .bind(user.rating_count)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        bio: Option<String>,
        skills: Option<Vec<SkillEntry>>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let mut user = self
            .get(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User", user_id))?;

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(bio) = bio {
            user.bio = Some(bio);
        }
        if let Some(skills) = skills {
            user.skills = skills;
            user.update_role();
        }
        user.touch(now);

        let id = user.id.to_string();
        let skills_json = serde_json::to_string(&user.skills)
            .map_err(|e| Error::Parse(format!("Invalid skills payload: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE users SET
                name = ?,
                role = ?,
                bio = ?,
                skills = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&skills_json)
        .bind(user.updated_at)
        .bind(&id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(user)
    }

    async fn list(&self, limit: Option<i32>) -> Result<Vec<User>> {
        let limit = limit.unwrap_or(50);

        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, role, bio, skills, rating, rating_count,
                   created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(|row| row.into_user()).collect()
    }
}

/// Database row for a user
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    role: String,
    bio: Option<String>,
    skills: String,
    rating: f64,
    rating_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid user ID: {}", e)))?;
        let role = Role::parse(&self.role)
            .ok_or_else(|| Error::Parse(format!("Invalid role: {}", self.role)))?;
        let skills: Vec<SkillEntry> = serde_json::from_str(&self.skills)
            .map_err(|e| Error::Parse(format!("Invalid skills JSON: {}", e)))?;

        Ok(User {
            id,
            name: self.name,
            email: self.email,
            role,
            bio: self.bio,
            skills,
            rating: self.rating,
            rating_count: self.rating_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
