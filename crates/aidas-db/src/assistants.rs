//! Assistant repository implementation. Read-only reference data.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use aidas_core::{Assistant, AssistantRepository, Error, Result};

/// PostgreSQL implementation of AssistantRepository.
pub struct PgAssistantRepository {
    pool: Pool<Postgres>,
}

impl PgAssistantRepository {
    /// Create a new PgAssistantRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssistantRepository for PgAssistantRepository {
    async fn default_assistant(&self) -> Result<Option<Assistant>> {
        let row = sqlx::query(
            "SELECT id, name, system_prompt, created_at
             FROM assistants ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Assistant {
            id: r.get("id"),
            name: r.get("name"),
            system_prompt: r.get("system_prompt"),
            created_at: r.get("created_at"),
        }))
    }

    async fn system_prompt_for(&self, conversation_id: i64) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT a.system_prompt
             FROM assistants a
             JOIN conversations c ON a.id = c.assistant_id
             WHERE c.id = $1",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| r.get("system_prompt")))
    }
}
