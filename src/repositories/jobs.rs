// src/repositories/jobs.rs
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::app_log;
use crate::models::{DisabilityStatus, Job};

const JOB_COLUMNS: &str = "id, title, description, education, skills, employment_type, \
                           disability_status, admin_id, created_at";

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub education: String,
    pub skills: String,
    pub employment_type: String,
    pub disability_status: DisabilityStatus,
    pub admin_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub education: Option<String>,
    pub skills: Option<String>,
    pub employment_type: Option<String>,
    pub disability_status: Option<DisabilityStatus>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobWithCount {
    #[sqlx(flatten)]
    pub job: Job,
    pub applicant_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    HasApplicants(i64),
    NotFound,
}

pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, job: &NewJob) -> Result<Job> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (title, description, education, skills, employment_type,
                              disability_status, admin_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.education)
        .bind(&job.skills)
        .bind(&job.employment_type)
        .bind(job.disability_status)
        .bind(job.admin_id)
        .bind(now)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        app_log!(info, "Admin {} posted job {} ({})", job.admin_id, id, job.title);

        Ok(Job {
            id,
            title: job.title.clone(),
            description: job.description.clone(),
            education: job.education.clone(),
            skills: job.skills.clone(),
            employment_type: job.employment_type.clone(),
            disability_status: job.disability_status,
            admin_id: job.admin_id,
            created_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(job)
    }

    /// All jobs, newest first
    pub async fn list_all(&self) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs ORDER BY created_at DESC, id DESC",
            JOB_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn list_by_admin(&self, admin_id: i64) -> Result<Vec<JobWithCount>> {
        let jobs = sqlx::query_as::<_, JobWithCount>(
            r#"
            SELECT j.id, j.title, j.description, j.education, j.skills, j.employment_type,
                   j.disability_status, j.admin_id, j.created_at,
                   (SELECT COUNT(*) FROM applications a WHERE a.job_id = j.id) AS applicant_count
            FROM jobs j
            WHERE j.admin_id = ?
            ORDER BY j.created_at DESC, j.id DESC
            "#,
        )
        .bind(admin_id)
        .fetch_all(self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn update(&self, id: i64, update: &JobUpdate) -> Result<Option<Job>> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                education = COALESCE(?, education),
                skills = COALESCE(?, skills),
                employment_type = COALESCE(?, employment_type),
                disability_status = COALESCE(?, disability_status)
            WHERE id = ?
            "#,
        )
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.education.as_deref())
        .bind(update.skills.as_deref())
        .bind(update.employment_type.as_deref())
        .bind(update.disability_status)
        .bind(id)
        .execute(self.pool)
        .await?;

        self.find_by_id(id).await
    }

    /// Delete a job only while nobody has applied to it.
    /// The check and the delete are one statement so a concurrent application cannot slip in between.
    pub async fn delete_if_unused(&self, id: i64) -> Result<DeleteOutcome> {
        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE id = ?
              AND NOT EXISTS (SELECT 1 FROM applications WHERE job_id = ?)
            "#,
        )
        .bind(id)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            app_log!(info, "Deleted job {}", id);
            return Ok(DeleteOutcome::Deleted);
        }

        if self.find_by_id(id).await?.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM applications WHERE job_id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(DeleteOutcome::HasApplicants(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Database;
    use crate::models::Role;
    use crate::repositories::ApplicationRepository;
    use crate::test_support;

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let db = Database::in_memory().await.unwrap();
        let admin = test_support::user(&db, "admin@x.io", Role::Admin, "").await;
        let first = test_support::job(&db, admin.id, "First", "rust").await;
        let second = test_support::job(&db, admin.id, "Second", "go").await;

        let ids: Vec<i64> = JobRepository::new(db.pool())
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let db = Database::in_memory().await.unwrap();
        let admin = test_support::user(&db, "admin@x.io", Role::Admin, "").await;
        let job = test_support::job(&db, admin.id, "Backend", "rust").await;

        let updated = JobRepository::new(db.pool())
            .update(
                job.id,
                &JobUpdate {
                    title: Some("Backend Engineer".to_string()),
                    disability_status: Some(DisabilityStatus::Pwd),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Backend Engineer");
        assert_eq!(updated.skills, "rust");
        assert_eq!(updated.disability_status, DisabilityStatus::Pwd);
    }

    #[tokio::test]
    async fn test_delete_refused_with_applicants() {
        let db = Database::in_memory().await.unwrap();
        let admin = test_support::user(&db, "admin@x.io", Role::Admin, "").await;
        let seeker = test_support::user(&db, "s@x.io", Role::Seeker, "rust").await;
        let taken = test_support::job(&db, admin.id, "Taken", "rust").await;
        let empty = test_support::job(&db, admin.id, "Empty", "rust").await;

        ApplicationRepository::new(db.pool())
            .create(taken.id, seeker.id, None, &[])
            .await
            .unwrap()
            .unwrap();

        let repo = JobRepository::new(db.pool());
        assert_eq!(
            repo.delete_if_unused(taken.id).await.unwrap(),
            DeleteOutcome::HasApplicants(1)
        );
        assert_eq!(repo.delete_if_unused(empty.id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(repo.delete_if_unused(empty.id).await.unwrap(), DeleteOutcome::NotFound);

        let mine = repo.list_by_admin(admin.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].applicant_count, 1);
    }
}
