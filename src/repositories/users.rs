// src/repositories/users.rs
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::app_log;
use crate::models::{DisabilityStatus, Role, User};
use crate::repositories::is_unique_violation;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, education, skills, \
                            disability_status, is_verified, created_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub education: String,
    pub skills: String,
    pub disability_status: DisabilityStatus,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub education: Option<String>,
    pub skills: Option<String>,
    pub disability_status: Option<DisabilityStatus>,
}

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user; `Ok(None)` when the email is already registered.
    pub async fn create(&self, user: &NewUser) -> Result<Option<User>> {
        let now = Utc::now();
        let email = user.email.trim().to_lowercase();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, education, skills,
                               disability_status, is_verified, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.education)
        .bind(&user.skills)
        .bind(user.disability_status)
        .bind(user.is_verified)
        .bind(now)
        .execute(self.pool)
        .await;

        match result {
            Ok(done) => {
                app_log!(info, "Created {} account for {}", user.role, email);
                self.find_by_id(done.last_insert_rowid()).await
            }
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let users = match role {
            Some(role) => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {} FROM users WHERE role = ? ORDER BY id ASC",
                    USER_COLUMNS
                ))
                .bind(role)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {} FROM users ORDER BY id ASC",
                    USER_COLUMNS
                ))
                .fetch_all(self.pool)
                .await?
            }
        };
        Ok(users)
    }

    /// Apply the provided fields, leaving the rest untouched
    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<Option<User>> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                education = COALESCE(?, education),
                skills = COALESCE(?, skills),
                disability_status = COALESCE(?, disability_status)
            WHERE id = ?
            "#,
        )
        .bind(update.name.as_deref())
        .bind(update.education.as_deref())
        .bind(update.skills.as_deref())
        .bind(update.disability_status)
        .bind(id)
        .execute(self.pool)
        .await?;

        self.find_by_id(id).await
    }

    pub async fn set_verified(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
