//! Uploaded document metadata repository.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use aidas_core::{DocumentRepository, Error, NewDocument, Result, StoredDocument};

/// PostgreSQL implementation of DocumentRepository.
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    /// Create a new PgDocumentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, doc: NewDocument) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO uploaded_documents
                 (conversation_id, original_filename, stored_filename, filepath, mimetype, filesize)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(doc.conversation_id)
        .bind(&doc.original_filename)
        .bind(&doc.stored_filename)
        .bind(&doc.filepath)
        .bind(&doc.mimetype)
        .bind(doc.filesize)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    async fn fetch(&self, id: i64) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, original_filename, stored_filename,
                    filepath, mimetype, filesize, created_at
             FROM uploaded_documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| StoredDocument {
            id: r.get("id"),
            conversation_id: r.get("conversation_id"),
            original_filename: r.get("original_filename"),
            stored_filename: r.get("stored_filename"),
            filepath: r.get("filepath"),
            mimetype: r.get("mimetype"),
            filesize: r.get("filesize"),
            created_at: r.get("created_at"),
        }))
    }

    async fn paths_for_conversation(&self, conversation_id: i64) -> Result<Vec<String>> {
        let rows =
            sqlx::query("SELECT filepath FROM uploaded_documents WHERE conversation_id = $1")
                .bind(conversation_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|r| r.get("filepath")).collect())
    }
}
