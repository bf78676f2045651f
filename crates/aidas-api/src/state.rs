//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use aidas_core::{
    AssistantRepository, ConversationRepository, DocumentRepository, InferenceBackend,
    MemoryRepository, MessageRepository, SessionRepository, UserRepository,
};
use aidas_db::Database;

/// Repository handles as trait objects.
///
/// Handlers and the turn pipeline go through this struct rather than the
/// concrete Postgres types, so tests can substitute in-memory fakes.
#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub assistants: Arc<dyn AssistantRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub memories: Arc<dyn MemoryRepository>,
    pub documents: Arc<dyn DocumentRepository>,
}

impl Repos {
    pub fn from_database(db: &Database) -> Self {
        Self {
            users: db.users.clone(),
            sessions: db.sessions.clone(),
            assistants: db.assistants.clone(),
            conversations: db.conversations.clone(),
            messages: db.messages.clone(),
            memories: db.memories.clone(),
            documents: db.documents.clone(),
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repos,
    pub backend: Arc<dyn InferenceBackend>,
    /// Directory uploaded files are written to.
    pub upload_dir: PathBuf,
}
