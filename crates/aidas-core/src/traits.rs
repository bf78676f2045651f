//! Core traits for aidas abstractions.
//!
//! These traits define the interfaces the concrete Postgres and OpenAI
//! implementations satisfy, enabling pluggable backends and testability.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER & SESSION REPOSITORIES
// =============================================================================

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created(Uuid),
    DuplicateEmail,
}

/// Repository for account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new unapproved account with a pre-hashed password.
    async fn register(&self, email: &str, password_hash: &str) -> Result<RegisterOutcome>;

    /// Look up an account by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Flip the approval flag. Admin-only operation.
    async fn set_approved(&self, user_id: i64, approved: bool) -> Result<()>;

    /// List non-admin accounts, unapproved first, newest first within each
    /// group. Feeds the admin panel.
    async fn list_non_admins(&self) -> Result<Vec<User>>;

    /// Whether the account has the admin flag.
    async fn is_admin(&self, user_id: i64) -> Result<bool>;
}

/// Repository for opaque session tokens.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Issue a fresh token for the user. Only the hash is persisted.
    async fn create(&self, user_id: i64) -> Result<SessionToken>;

    /// Resolve a token to its principal; `None` for unknown or expired.
    async fn validate(&self, token: &str) -> Result<Option<AuthSession>>;

    /// Revoke a token (logout).
    async fn revoke(&self, token: &str) -> Result<()>;
}

// =============================================================================
// CONVERSATION DOMAIN REPOSITORIES
// =============================================================================

/// Repository for assistant reference data.
#[async_trait]
pub trait AssistantRepository: Send + Sync {
    /// The deterministic default: least-recently-created assistant.
    async fn default_assistant(&self) -> Result<Option<Assistant>>;

    /// System prompt of the assistant bound to a conversation.
    async fn system_prompt_for(&self, conversation_id: i64) -> Result<Option<String>>;
}

/// Repository for conversation rows.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create a conversation for a user against an assistant.
    async fn create(&self, user_uuid: Uuid, assistant_id: i64, title: &str) -> Result<i64>;

    /// Conversations for the sidebar, most recently updated first.
    async fn list_for_user(&self, user_uuid: Uuid) -> Result<Vec<ConversationSummary>>;

    /// Ownership check, performed before any data is touched.
    async fn is_owned_by(&self, id: i64, user_uuid: Uuid) -> Result<bool>;

    /// Rename with a pre-sanitized title; bumps `updated_at`.
    async fn rename(&self, id: i64, title: &str) -> Result<()>;

    /// Persist a derived title without touching `updated_at`.
    async fn set_title(&self, id: i64, title: &str) -> Result<()>;

    /// Bump `updated_at` after a completed turn.
    async fn touch(&self, id: i64) -> Result<()>;

    /// Transactionally delete the conversation row, cascading to messages
    /// and document metadata. Returns the file paths of the conversation's
    /// documents so the caller can unlink them best-effort afterwards.
    async fn delete_cascading(&self, id: i64) -> Result<Vec<String>>;

    /// The oldest conversation past the `keep`-th most recent, if the user
    /// holds more than `keep` conversations.
    async fn oldest_beyond(&self, user_uuid: Uuid, keep: i64) -> Result<Option<i64>>;
}

/// Repository for message rows. Append-only within a conversation.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message; ordering is by creation timestamp.
    async fn append(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
        user_uuid: Uuid,
    ) -> Result<i64>;

    /// Prompt window source: the most recent `limit` non-null-content
    /// messages, returned in chronological order.
    async fn history(&self, conversation_id: i64, limit: i64) -> Result<Vec<ChatMessage>>;

    /// Full message listing for conversation display.
    async fn list_for_conversation(&self, conversation_id: i64) -> Result<Vec<Message>>;

    /// Attach an embedding to a stored message.
    async fn set_embedding(&self, message_id: i64, vector: &Vector) -> Result<()>;

    /// Rank messages carrying embeddings by inner-product distance to the
    /// query vector, closest first.
    async fn find_similar(&self, query: &Vector, limit: i64) -> Result<Vec<SearchMatch>>;
}

/// Repository for the per-user memory blob.
///
/// Concurrent appends from the same user race on the read-modify-write and
/// resolve last-write-wins; this is a documented limitation, not a bug to
/// serialize away.
#[async_trait]
pub trait MemoryRepository: Send + Sync {
    /// Current blob, creating an empty row on first access.
    async fn get(&self, user_uuid: Uuid) -> Result<String>;

    /// Append `text` as a new line (`existing + "\n" + text`, or just
    /// `text` when the blob is empty) via atomic upsert.
    async fn append(&self, user_uuid: Uuid, text: &str) -> Result<()>;
}

/// Repository for uploaded document metadata.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a metadata row for a stored file.
    async fn insert(&self, doc: NewDocument) -> Result<i64>;

    /// Fetch a stored document by id.
    async fn fetch(&self, id: i64) -> Result<Option<StoredDocument>>;

    /// File paths of all documents bound to a conversation.
    async fn paths_for_conversation(&self, conversation_id: i64) -> Result<Vec<String>>;
}

// =============================================================================
// COMPLETION ENGINE BACKENDS
// =============================================================================

/// Stream of incremental completion text fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Options for a non-streaming completion call.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Backend for chat completion (LLM).
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Submit messages in streaming mode; fragments arrive in emission order.
    async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream>;

    /// One-shot completion (title generation, document analysis).
    async fn chat(&self, messages: &[ChatMessage], options: GenerationOptions) -> Result<String>;

    /// Model name used for generation.
    fn model_name(&self) -> &str;
}

/// Backend for text embedding.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    async fn embed_text(&self, text: &str) -> Result<Vector>;

    /// Expected embedding dimension.
    fn dimension(&self) -> usize;

    /// Model name used for embeddings.
    fn embed_model_name(&self) -> &str;
}

/// Combined completion engine supporting chat and embedding.
pub trait InferenceBackend: ChatBackend + EmbeddingBackend {}

impl<T: ChatBackend + EmbeddingBackend> InferenceBackend for T {}
