// src/repositories/notifications.rs
use anyhow::Result;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::Notification;

pub struct NotificationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NotificationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, message: &str) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::create_in(&mut conn, user_id, message).await
    }

    /// Insert on an existing connection so callers can include it in their transaction
    pub async fn create_in(conn: &mut SqliteConnection, user_id: i64, message: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, message, is_read, created_at) VALUES (?, ?, FALSE, ?)",
        )
        .bind(user_id)
        .bind(message)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, message, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Flip one notification to read; false if it does not exist or belongs to someone else
    pub async fn mark_read(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Database;
    use crate::models::Role;
    use crate::test_support;

    #[tokio::test]
    async fn test_read_flags_are_per_owner() {
        let db = Database::in_memory().await.unwrap();
        let ann = test_support::user(&db, "ann@x.io", Role::Seeker, "").await;
        let bob = test_support::user(&db, "bob@x.io", Role::Seeker, "").await;
        let repo = NotificationRepository::new(db.pool());

        let first = repo.create(ann.id, "first").await.unwrap();
        repo.create(ann.id, "second").await.unwrap();
        repo.create(bob.id, "other").await.unwrap();
        assert_eq!(repo.unread_count(ann.id).await.unwrap(), 2);

        assert!(!repo.mark_read(first, bob.id).await.unwrap());
        assert!(repo.mark_read(first, ann.id).await.unwrap());
        assert_eq!(repo.unread_count(ann.id).await.unwrap(), 1);

        let listed = repo.list_for_user(ann.id).await.unwrap();
        assert_eq!(listed[0].message, "second");
        assert!(listed[1].is_read);

        assert_eq!(repo.mark_all_read(ann.id).await.unwrap(), 1);
        assert_eq!(repo.unread_count(ann.id).await.unwrap(), 0);
        assert_eq!(repo.unread_count(bob.id).await.unwrap(), 1);
    }
}
