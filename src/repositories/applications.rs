// src/repositories/applications.rs
use anyhow::Result;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

use crate::app_log;
use crate::lifecycle::ApplicationStatus;
use crate::models::{Application, User};
use crate::repositories::is_unique_violation;

const APPLICATION_COLUMNS: &str = "id, job_id, seeker_id, status, cover_note, document_urls, \
                                   interview_score, meeting_link, applied_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeekerApplication {
    #[sqlx(flatten)]
    pub application: Application,
    pub job_title: String,
}

pub struct ApplicationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ApplicationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an application; `Ok(None)` when the seeker already applied to this job.
    pub async fn create(
        &self,
        job_id: i64,
        seeker_id: i64,
        cover_note: Option<&str>,
        document_urls: &[String],
    ) -> Result<Option<Application>> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO applications (job_id, seeker_id, status, cover_note, document_urls,
                                      applied_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job_id)
        .bind(seeker_id)
        .bind(ApplicationStatus::Applied)
        .bind(cover_note)
        .bind(Json(document_urls))
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await;

        match result {
            Ok(done) => {
                app_log!(info, "Seeker {} applied to job {}", seeker_id, job_id);
                self.find_by_id(done.last_insert_rowid()).await
            }
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = ?",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(application)
    }

    pub async fn list_for_seeker(&self, seeker_id: i64) -> Result<Vec<SeekerApplication>> {
        let rows = sqlx::query_as::<_, SeekerApplication>(
            r#"
            SELECT a.id, a.job_id, a.seeker_id, a.status, a.cover_note, a.document_urls,
                   a.interview_score, a.meeting_link, a.applied_at, a.updated_at,
                   j.title AS job_title
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.seeker_id = ?
            ORDER BY a.applied_at DESC, a.id DESC
            "#,
        )
        .bind(seeker_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Applications to `job_id` paired with the applying seeker
    pub async fn list_with_seekers(&self, job_id: i64) -> Result<Vec<(Application, User)>> {
        let applications = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE job_id = ? ORDER BY applied_at ASC, id ASC",
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .fetch_all(self.pool)
        .await?;

        let seekers: HashMap<i64, User> = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, education, skills,
                   disability_status, is_verified, created_at
            FROM users
            WHERE id IN (SELECT seeker_id FROM applications WHERE job_id = ?)
            "#,
        )
        .bind(job_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

        Ok(applications
            .into_iter()
            .filter_map(|a| seekers.get(&a.seeker_id).cloned().map(|u| (a, u)))
            .collect())
    }

    /// Move `id` from `from` to `to` only if nobody changed it meanwhile.
    /// Returns false when the row was not in `from` any more.
    pub async fn transition_status(
        conn: &mut SqliteConnection,
        id: i64,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE applications SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_meeting_link(&self, id: i64, link: &str) -> Result<()> {
        sqlx::query("UPDATE applications SET meeting_link = ?, updated_at = ? WHERE id = ?")
            .bind(link)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_interview_score(&self, id: i64, score: i64) -> Result<Option<Application>> {
        sqlx::query("UPDATE applications SET interview_score = ?, updated_at = ? WHERE id = ?")
            .bind(score)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        self.find_by_id(id).await
    }
}
