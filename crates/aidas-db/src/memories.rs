//! Memory repository: one mutable text blob per user.
//!
//! `append` is a read-modify-write followed by an atomic upsert keyed by
//! user UUID. Two appends from the same user racing resolve last-write-wins;
//! that window is accepted rather than serialized.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use aidas_core::{Error, MemoryRepository, Result};

/// PostgreSQL implementation of MemoryRepository.
pub struct PgMemoryRepository {
    pool: Pool<Postgres>,
}

impl PgMemoryRepository {
    /// Create a new PgMemoryRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_content(&self, user_uuid: Uuid) -> Result<Option<String>> {
        let row = sqlx::query("SELECT content FROM memories WHERE user_uuid = $1")
            .bind(user_uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(|r| r.get("content")))
    }
}

#[async_trait]
impl MemoryRepository for PgMemoryRepository {
    async fn get(&self, user_uuid: Uuid) -> Result<String> {
        match self.fetch_content(user_uuid).await? {
            Some(content) => Ok(content),
            None => {
                // First access creates the empty row; the conflict arm makes
                // this idempotent against a concurrent first access.
                sqlx::query(
                    "INSERT INTO memories (user_uuid, content) VALUES ($1, '')
                     ON CONFLICT (user_uuid) DO NOTHING",
                )
                .bind(user_uuid)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;
                Ok(String::new())
            }
        }
    }

    async fn append(&self, user_uuid: Uuid, text: &str) -> Result<()> {
        let existing = self.fetch_content(user_uuid).await?;
        let updated = match existing {
            Some(current) if !current.trim().is_empty() => format!("{}\n{}", current, text),
            _ => text.to_string(),
        };

        sqlx::query(
            "INSERT INTO memories (user_uuid, content) VALUES ($1, $2)
             ON CONFLICT (user_uuid) DO UPDATE SET content = $2, updated_at = now()",
        )
        .bind(user_uuid)
        .bind(&updated)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
