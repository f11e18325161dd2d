// src/repositories/messages.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::Message;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub last_message: String,
    pub last_timestamp: DateTime<Utc>,
    pub unread: i64,
}

pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, sender_id: i64, receiver_id: i64, content: &str) -> Result<Message> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO messages (sender_id, receiver_id, content, timestamp, is_read) VALUES (?, ?, ?, ?, FALSE)",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            timestamp: now,
            is_read: false,
        })
    }

    /// Every message exchanged between `a` and `b`, oldest first
    pub async fn conversation(&self, a: i64, b: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_id, receiver_id, content, timestamp, is_read
            FROM messages
            WHERE (sender_id = ?1 AND receiver_id = ?2)
               OR (sender_id = ?2 AND receiver_id = ?1)
            ORDER BY id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Mark everything `sender_id` sent to `receiver_id` as read
    pub async fn mark_read_from(&self, sender_id: i64, receiver_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE WHERE sender_id = ? AND receiver_id = ? AND is_read = FALSE",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// One row per counterpart with the latest message, most recent conversation first
    pub async fn conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT u.id AS counterpart_id,
                   u.name AS counterpart_name,
                   m.content AS last_message,
                   m.timestamp AS last_timestamp,
                   (SELECT COUNT(*) FROM messages x
                     WHERE x.sender_id = u.id AND x.receiver_id = ?1 AND x.is_read = FALSE) AS unread
            FROM messages m
            JOIN users u
              ON u.id = CASE WHEN m.sender_id = ?1 THEN m.receiver_id ELSE m.sender_id END
            WHERE m.id IN (
                SELECT MAX(id) FROM messages
                WHERE sender_id = ?1 OR receiver_id = ?1
                GROUP BY CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END
            )
            ORDER BY m.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Database;
    use crate::models::Role;
    use crate::test_support;

    #[tokio::test]
    async fn test_conversation_and_summaries() {
        let db = Database::in_memory().await.unwrap();
        let ann = test_support::user(&db, "ann@x.io", Role::Seeker, "").await;
        let bob = test_support::user(&db, "bob@x.io", Role::Admin, "").await;
        let cid = test_support::user(&db, "cid@x.io", Role::Admin, "").await;
        let repo = MessageRepository::new(db.pool());

        repo.create(ann.id, bob.id, "hi bob").await.unwrap();
        repo.create(bob.id, ann.id, "hi ann").await.unwrap();
        repo.create(bob.id, ann.id, "are you there?").await.unwrap();
        repo.create(cid.id, ann.id, "hello from cid").await.unwrap();

        let log = repo.conversation(bob.id, ann.id).await.unwrap();
        let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi bob", "hi ann", "are you there?"]);

        let summaries = repo.conversations(ann.id).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].counterpart_id, cid.id);
        assert_eq!(summaries[0].unread, 1);
        assert_eq!(summaries[1].counterpart_name, "bob");
        assert_eq!(summaries[1].last_message, "are you there?");
        assert_eq!(summaries[1].unread, 2);

        assert_eq!(repo.mark_read_from(bob.id, ann.id).await.unwrap(), 2);
        let summaries = repo.conversations(ann.id).await.unwrap();
        assert_eq!(summaries[0].unread, 1);
        assert_eq!(summaries[1].unread, 0);
        assert_eq!(repo.conversations(bob.id).await.unwrap()[0].unread, 1);
    }
}
