//! Core data models shared across aidas crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export the vector type so downstream crates don't need a direct
// pgvector dependency for type signatures.
pub use pgvector::Vector;

// =============================================================================
// USERS & SESSIONS
// =============================================================================

/// A registered account.
///
/// `uuid` is the stable public identifier; `id` is the internal serial key.
/// Accounts start unapproved and cannot log in until an admin flips the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub uuid: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_approved: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// The authenticated principal resolved from a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: i64,
    pub user_uuid: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// An opaque session token freshly issued at login.
///
/// Only the SHA-256 hash is stored; the cleartext exists solely in the
/// Set-Cookie header of the login response.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// ASSISTANTS & CONVERSATIONS
// =============================================================================

/// A system-prompt template. Read-only reference data for the turn pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assistant {
    pub id: i64,
    pub name: String,
    pub system_prompt: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation owned by exactly one user and bound to one assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub user_uuid: Uuid,
    pub assistant_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sidebar listing shape: id and title only, ordered by recency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub title: String,
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a role from its database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted message. Content is nullable only transiently; the history
/// window skips null-content rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub role: MessageRole,
    pub content: Option<String>,
    pub user_uuid: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Wire shape submitted to the completion engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
        }
    }
}

// =============================================================================
// UPLOADED DOCUMENTS
// =============================================================================

/// Metadata row for an uploaded file bound to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: i64,
    pub conversation_id: i64,
    pub original_filename: String,
    pub stored_filename: String,
    pub filepath: String,
    pub mimetype: String,
    pub filesize: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert request for a document row.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub conversation_id: i64,
    pub original_filename: String,
    pub stored_filename: String,
    pub filepath: String,
    pub mimetype: String,
    pub filesize: i64,
}

// =============================================================================
// SEARCH
// =============================================================================

/// A similarity search hit over stored message embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub content: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub conversation_id: i64,
}

// =============================================================================
// TURN EVENTS
// =============================================================================

/// Events streamed to the client during a turn.
///
/// Serialized as the `data:` payload of the `/ask` event stream. `Done` is
/// the literal terminal sentinel `[DONE]`, not JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Content {
        content: String,
        conversation_id: Option<i64>,
    },
    TitleUpdated {
        title: String,
    },
    Done,
}

impl TurnEvent {
    /// Render the event as an SSE `data:` payload.
    pub fn to_sse_data(&self) -> String {
        match self {
            Self::Content {
                content,
                conversation_id,
            } => serde_json::json!({
                "content": content,
                "conversation_id": conversation_id,
            })
            .to_string(),
            Self::TitleUpdated { title } => serde_json::json!({
                "event": "title_updated",
                "title": title,
            })
            .to_string(),
            Self::Done => "[DONE]".to_string(),
        }
    }
}
