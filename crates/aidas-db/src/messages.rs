//! Message repository implementation.
//!
//! Messages are append-only within a conversation; ordering is by
//! creation timestamp. Similarity search ranks by pgvector inner
//! product (`<#>`), closest first.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use aidas_core::{
    ChatMessage, Error, Message, MessageRepository, MessageRole, Result, SearchMatch,
};

/// PostgreSQL implementation of MessageRepository.
pub struct PgMessageRepository {
    pool: Pool<Postgres>,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
        user_uuid: Uuid,
    ) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, user_uuid)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .bind(user_uuid)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    async fn history(&self, conversation_id: i64, limit: i64) -> Result<Vec<ChatMessage>> {
        // Newest `limit` rows, re-sorted into chronological order.
        let rows = sqlx::query(
            "SELECT role, content FROM (
                 SELECT role, content, created_at, id FROM messages
                  WHERE conversation_id = $1 AND content IS NOT NULL
                  ORDER BY created_at DESC, id DESC
                  LIMIT $2
             ) recent
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| ChatMessage {
                role: r.get("role"),
                content: r.get("content"),
            })
            .collect())
    }

    async fn list_for_conversation(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, role, content, user_uuid, created_at
             FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let messages = rows
            .into_iter()
            .filter_map(|r| {
                let role: String = r.get("role");
                MessageRole::parse(&role).map(|role| Message {
                    id: r.get("id"),
                    conversation_id: r.get("conversation_id"),
                    role,
                    content: r.get("content"),
                    user_uuid: r.get("user_uuid"),
                    created_at: r.get("created_at"),
                })
            })
            .collect();

        Ok(messages)
    }

    async fn set_embedding(&self, message_id: i64, vector: &Vector) -> Result<()> {
        sqlx::query("UPDATE messages SET embedding = $1 WHERE id = $2")
            .bind(vector)
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn find_similar(&self, query: &Vector, limit: i64) -> Result<Vec<SearchMatch>> {
        let rows = sqlx::query(
            "SELECT content, role, created_at, conversation_id
             FROM messages
             WHERE embedding IS NOT NULL AND content IS NOT NULL
             ORDER BY embedding <#> $1
             LIMIT $2",
        )
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| SearchMatch {
                content: r.get("content"),
                role: r.get("role"),
                created_at: r.get("created_at"),
                conversation_id: r.get("conversation_id"),
            })
            .collect())
    }
}
