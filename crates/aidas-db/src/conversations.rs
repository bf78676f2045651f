//! Conversation repository implementation.
//!
//! `delete_cascading` is the one operation requiring an explicit
//! multi-statement transaction: document paths are read and the
//! conversation row deleted (messages and document metadata follow via
//! referential cascade) inside a single atomic unit. Physical file
//! deletion is the caller's responsibility, outside the transaction.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use aidas_core::{ConversationRepository, ConversationSummary, Error, Result};

/// PostgreSQL implementation of ConversationRepository.
pub struct PgConversationRepository {
    pool: Pool<Postgres>,
}

impl PgConversationRepository {
    /// Create a new PgConversationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn create(&self, user_uuid: Uuid, assistant_id: i64, title: &str) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO conversations (title, assistant_id, user_uuid)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(title)
        .bind(assistant_id)
        .bind(user_uuid)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let id: i64 = row.get("id");
        debug!(
            subsystem = "database",
            component = "conversations",
            op = "create",
            conversation_id = id,
            user_uuid = %user_uuid,
            "Conversation created"
        );
        Ok(id)
    }

    async fn list_for_user(&self, user_uuid: Uuid) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            "SELECT id, title FROM conversations
             WHERE user_uuid = $1 ORDER BY updated_at DESC",
        )
        .bind(user_uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| ConversationSummary {
                id: r.get("id"),
                title: r.get("title"),
            })
            .collect())
    }

    async fn is_owned_by(&self, id: i64, user_uuid: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT id FROM conversations WHERE id = $1 AND user_uuid = $2")
            .bind(id)
            .bind(user_uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.is_some())
    }

    async fn rename(&self, id: i64, title: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE conversations SET title = $1, updated_at = now() WHERE id = $2")
                .bind(title)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("conversation {}", id)));
        }
        Ok(())
    }

    async fn set_title(&self, id: i64, title: &str) -> Result<()> {
        sqlx::query("UPDATE conversations SET title = $1 WHERE id = $2")
            .bind(title)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn touch(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE conversations SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete_cascading(&self, id: i64) -> Result<Vec<String>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let rows = sqlx::query("SELECT filepath FROM uploaded_documents WHERE conversation_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let paths: Vec<String> = rows.into_iter().map(|r| r.get("filepath")).collect();

        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "conversations",
            op = "delete_cascading",
            conversation_id = id,
            document_count = paths.len(),
            "Conversation deleted with cascaded metadata"
        );
        Ok(paths)
    }

    async fn oldest_beyond(&self, user_uuid: Uuid, keep: i64) -> Result<Option<i64>> {
        let row = sqlx::query(
            "SELECT id FROM conversations
             WHERE user_uuid = $1
               AND (SELECT COUNT(*) FROM conversations WHERE user_uuid = $1) > $2
             ORDER BY created_at ASC
             LIMIT 1",
        )
        .bind(user_uuid)
        .bind(keep)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| r.get("id")))
    }
}
