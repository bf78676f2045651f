//! # aidas-db
//!
//! PostgreSQL database layer for aidas.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for users, sessions, assistants,
//!   conversations, messages, memories, and uploaded documents
//! - Vector similarity search over message embeddings with pgvector
//!
//! ## Example
//!
//! ```rust,ignore
//! use aidas_db::Database;
//! use aidas_core::ConversationRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/aidas").await?;
//!     let conversations = db.conversations.list_for_user(user_uuid).await?;
//!     Ok(())
//! }
//! ```

pub mod assistants;
pub mod conversations;
pub mod documents;
pub mod memories;
pub mod messages;
pub mod pool;
pub mod sessions;
pub mod users;

#[cfg(test)]
mod tests;

// Test fixtures for integration tests
pub mod test_fixtures;

// Re-export core types
pub use aidas_core::*;

pub use assistants::PgAssistantRepository;
pub use conversations::PgConversationRepository;
pub use documents::PgDocumentRepository;
pub use memories::PgMemoryRepository;
pub use messages::PgMessageRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use sessions::PgSessionRepository;
pub use users::PgUserRepository;

/// Aggregated database handle: the single injected capability holding the
/// connection pool and one repository per entity. No module-level state.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User account repository.
    pub users: std::sync::Arc<PgUserRepository>,
    /// Session token repository.
    pub sessions: std::sync::Arc<PgSessionRepository>,
    /// Assistant reference data repository.
    pub assistants: std::sync::Arc<PgAssistantRepository>,
    /// Conversation repository.
    pub conversations: std::sync::Arc<PgConversationRepository>,
    /// Message repository.
    pub messages: std::sync::Arc<PgMessageRepository>,
    /// Per-user memory repository.
    pub memories: std::sync::Arc<PgMemoryRepository>,
    /// Uploaded document metadata repository.
    pub documents: std::sync::Arc<PgDocumentRepository>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: std::sync::Arc::new(PgUserRepository::new(pool.clone())),
            sessions: std::sync::Arc::new(PgSessionRepository::new(pool.clone())),
            assistants: std::sync::Arc::new(PgAssistantRepository::new(pool.clone())),
            conversations: std::sync::Arc::new(PgConversationRepository::new(pool.clone())),
            messages: std::sync::Arc::new(PgMessageRepository::new(pool.clone())),
            memories: std::sync::Arc::new(PgMemoryRepository::new(pool.clone())),
            documents: std::sync::Arc::new(PgDocumentRepository::new(pool.clone())),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
