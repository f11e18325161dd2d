// src/core/database.rs
//! Database connection management and schema migrations

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use crate::app_log;
use crate::core::FsOps;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            FsOps::ensure_dir_exists(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);
        let db = Self::connect(options, 5).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        app_log!(
            info,
            "Database connection established: {}",
            database_path.display()
        );
        Ok(db)
    }

    /// Private in-memory database, used by tests and dry runs.
    /// A single connection keeps every query on the same memory store.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?, 1).await
    }

    /// Every pooled connection enforces foreign keys
    async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options.foreign_keys(true))
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'seeker' CHECK (role IN ('seeker', 'admin')),
                education TEXT NOT NULL DEFAULT '',
                skills TEXT NOT NULL DEFAULT '',
                disability_status TEXT NOT NULL DEFAULT 'Non-PWD',
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                education TEXT NOT NULL DEFAULT '',
                skills TEXT NOT NULL DEFAULT '',
                employment_type TEXT NOT NULL DEFAULT '',
                disability_status TEXT NOT NULL DEFAULT 'Non-PWD',
                admin_id INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                seeker_id INTEGER NOT NULL REFERENCES users(id),
                status TEXT NOT NULL DEFAULT 'applied',
                cover_note TEXT,
                document_urls TEXT NOT NULL DEFAULT '[]',
                interview_score INTEGER,
                meeting_link TEXT,
                applied_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (job_id, seeker_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                message TEXT NOT NULL,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id INTEGER NOT NULL REFERENCES users(id),
                receiver_id INTEGER NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                is_read BOOLEAN NOT NULL DEFAULT FALSE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_jobs_admin ON jobs(admin_id);",
            "CREATE INDEX IF NOT EXISTS idx_applications_job ON applications(job_id);",
            "CREATE INDEX IF NOT EXISTS idx_applications_seeker ON applications(seeker_id);",
            "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, is_read);",
            "CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, receiver_id);",
        ] {
            sqlx::query(index).execute(&self.pool).await?;
        }

        app_log!(info, "Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}
