//! Database migrations
//!
//! This module manages SQLite schema migrations for skillswap.
//! Migrations are versioned and applied automatically on database connection.
//!
//! The sessions table carries no foreign keys into users: profiles are
//! directory data and may be served from elsewhere, so session rows only
//! store participant identifiers.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 3;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: User directory
const MIGRATION_V1: &str = r#"
    -- User profiles with their teachable/learnable skills
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL DEFAULT 'student' CHECK (role IN ('student', 'teacher')),
        bio TEXT,
        skills TEXT NOT NULL DEFAULT '[]',
        rating REAL NOT NULL DEFAULT 0.0,
        rating_count INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);
    CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
"#;

/// Migration 2: Sessions with embedded review slots
const MIGRATION_V2: &str = r#"
    -- Booked sessions; review columns stay NULL until submission
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY NOT NULL,
        skill TEXT NOT NULL,
        start_time TIMESTAMP NOT NULL,
        end_time TIMESTAMP NOT NULL,
        student_id TEXT NOT NULL,
        teacher_id TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled')),
        meeting_link TEXT,
        notes TEXT,
        student_review_rating INTEGER CHECK (student_review_rating BETWEEN 1 AND 5),
        student_review_comment TEXT,
        student_review_created_at TIMESTAMP,
        teacher_review_rating INTEGER CHECK (teacher_review_rating BETWEEN 1 AND 5),
        teacher_review_comment TEXT,
        teacher_review_created_at TIMESTAMP,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    -- Overlap probes scan one teacher's calendar
    CREATE INDEX IF NOT EXISTS idx_sessions_teacher_time ON sessions(teacher_id, start_time);
    CREATE INDEX IF NOT EXISTS idx_sessions_student_id ON sessions(student_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);
"#;

/// Migration 3: Status history audit trail
const MIGRATION_V3: &str = r#"
    -- One row per accepted status transition
    CREATE TABLE IF NOT EXISTS session_status_history (
        id TEXT PRIMARY KEY NOT NULL,
        session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        status TEXT NOT NULL CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled')),
        changed_by TEXT NOT NULL,
        changed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_session_status_history_session_id ON session_status_history(session_id);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    // Get the latest version
    let row: Option<(i32,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    // Apply migrations in order
    if current_version < 1 {
        tracing::info!("Applying migration v1: User directory");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Sessions with review slots");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    if current_version < 3 {
        tracing::info!("Applying migration v3: Status history audit trail");
        sqlx::raw_sql(MIGRATION_V3).execute(pool).await?;
        record_migration(pool, 3).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        // Should start with no migrations
        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.expect("Failed to run migrations");

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.expect("First run failed");
        run_migrations(&pool).await.expect("Second run failed");

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_expected_tables_exist() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.expect("Failed to run migrations");

        for table in ["users", "sessions", "session_status_history"] {
            let row: Option<(String,)> = sqlx::query_as(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(&pool)
            .await
            .expect("Failed to query sqlite_master");
            assert!(row.is_some(), "Table {} should exist", table);
        }
    }

    #[tokio::test]
    async fn test_email_uniqueness_enforced() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.expect("Failed to run migrations");

        let insert = "INSERT INTO users (id, name, email, created_at, updated_at) \
                      VALUES (?, 'A', 'dup@example.com', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')";

        sqlx::query(insert)
            .bind(uuid::Uuid::new_v4().to_string())
            .execute(&pool)
            .await
            .expect("First insert should succeed");

        let result = sqlx::query(insert)
            .bind(uuid::Uuid::new_v4().to_string())
            .execute(&pool)
            .await;
        assert!(result.is_err(), "Duplicate email should be rejected");
    }

    #[tokio::test]
    async fn test_status_check_constraint() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.expect("Failed to run migrations");

        let result = sqlx::query(
            "INSERT INTO sessions (id, skill, start_time, end_time, student_id, teacher_id, status, created_at, updated_at) \
             VALUES (?, 'Guitar', '2025-06-01T10:00:00Z', '2025-06-01T11:00:00Z', 's', 't', 'paused', '2025-05-01T00:00:00Z', '2025-05-01T00:00:00Z')",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .execute(&pool)
        .await;
        assert!(result.is_err(), "Unknown status should be rejected");
    }
}
