//! In-memory repository fakes for exercising the turn pipeline without
//! Postgres.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use aidas_api::Repos;
use aidas_core::{
    Assistant, AssistantRepository, AuthSession, ChatMessage, Conversation,
    ConversationRepository, ConversationSummary, DocumentRepository, MemoryRepository, Message,
    MessageRepository, MessageRole, NewDocument, RegisterOutcome, Result, SearchMatch,
    SessionRepository, SessionToken, StoredDocument, User, UserRepository, Vector,
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: Vec<User>,
    assistants: Vec<Assistant>,
    conversations: Vec<Conversation>,
    messages: Vec<(Message, Option<Vector>)>,
    memories: HashMap<Uuid, String>,
    documents: Vec<StoredDocument>,
    sessions: HashMap<String, AuthSession>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Single shared in-memory store implementing every repository trait.
#[derive(Default)]
pub struct MemDb {
    inner: Mutex<Inner>,
}

impl MemDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn seed_assistant(&self, name: &str, system_prompt: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        // Stagger timestamps so creation order is observable.
        let created_at = Utc::now() + Duration::milliseconds(id);
        inner.assistants.push(Assistant {
            id,
            name: name.to_string(),
            system_prompt: system_prompt.to_string(),
            created_at,
        });
        id
    }

    pub fn seed_conversation(&self, user_uuid: Uuid, assistant_id: i64, title: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        let now = Utc::now() + Duration::milliseconds(id);
        inner.conversations.push(Conversation {
            id,
            user_uuid,
            assistant_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn conversations_for(&self, user_uuid: Uuid) -> Vec<Conversation> {
        self.lock()
            .conversations
            .iter()
            .filter(|c| c.user_uuid == user_uuid)
            .cloned()
            .collect()
    }

    pub fn conversation(&self, id: i64) -> Option<Conversation> {
        self.lock().conversations.iter().find(|c| c.id == id).cloned()
    }

    pub fn messages_in(&self, conversation_id: i64) -> Vec<Message> {
        self.lock()
            .messages
            .iter()
            .filter(|(m, _)| m.conversation_id == conversation_id)
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn embedding_of(&self, message_id: i64) -> Option<Vector> {
        self.lock()
            .messages
            .iter()
            .find(|(m, _)| m.id == message_id)
            .and_then(|(_, e)| e.clone())
    }

    pub fn memory_of(&self, user_uuid: Uuid) -> Option<String> {
        self.lock().memories.get(&user_uuid).cloned()
    }

    pub fn documents_in(&self, conversation_id: i64) -> Vec<StoredDocument> {
        self.lock()
            .documents
            .iter()
            .filter(|d| d.conversation_id == conversation_id)
            .cloned()
            .collect()
    }
}

/// Build a [`Repos`] where every handle points at the same [`MemDb`].
pub fn mem_repos(db: &Arc<MemDb>) -> Repos {
    Repos {
        users: db.clone(),
        sessions: db.clone(),
        assistants: db.clone(),
        conversations: db.clone(),
        messages: db.clone(),
        memories: db.clone(),
        documents: db.clone(),
    }
}

#[async_trait]
impl UserRepository for MemDb {
    async fn register(&self, email: &str, password_hash: &str) -> Result<RegisterOutcome> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == email) {
            return Ok(RegisterOutcome::DuplicateEmail);
        }
        let id = inner.next_id();
        let uuid = Uuid::new_v4();
        inner.users.push(User {
            id,
            uuid,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_approved: false,
            is_admin: false,
            created_at: Utc::now(),
        });
        Ok(RegisterOutcome::Created(uuid))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_approved(&self, user_id: i64, approved: bool) -> Result<()> {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            user.is_approved = approved;
        }
        Ok(())
    }

    async fn list_non_admins(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .lock()
            .users
            .iter()
            .filter(|u| !u.is_admin)
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            a.is_approved
                .cmp(&b.is_approved)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(users)
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool> {
        Ok(self
            .lock()
            .users
            .iter()
            .any(|u| u.id == user_id && u.is_admin))
    }
}

#[async_trait]
impl SessionRepository for MemDb {
    async fn create(&self, user_id: i64) -> Result<SessionToken> {
        let mut inner = self.lock();
        let user = inner
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .expect("session for unknown user");
        let token = Uuid::new_v4().simple().to_string();
        inner.sessions.insert(
            token.clone(),
            AuthSession {
                user_id: user.id,
                user_uuid: user.uuid,
                email: user.email,
                is_admin: user.is_admin,
            },
        );
        Ok(SessionToken {
            token,
            expires_at: Utc::now() + Duration::days(30),
        })
    }

    async fn validate(&self, token: &str) -> Result<Option<AuthSession>> {
        Ok(self.lock().sessions.get(token).cloned())
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        self.lock().sessions.remove(token);
        Ok(())
    }
}

#[async_trait]
impl AssistantRepository for MemDb {
    async fn default_assistant(&self) -> Result<Option<Assistant>> {
        let inner = self.lock();
        Ok(inner
            .assistants
            .iter()
            .min_by_key(|a| a.created_at)
            .cloned())
    }

    async fn system_prompt_for(&self, conversation_id: i64) -> Result<Option<String>> {
        let inner = self.lock();
        let assistant_id = inner
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.assistant_id);
        Ok(assistant_id.and_then(|id| {
            inner
                .assistants
                .iter()
                .find(|a| a.id == id)
                .map(|a| a.system_prompt.clone())
        }))
    }
}

#[async_trait]
impl ConversationRepository for MemDb {
    async fn create(&self, user_uuid: Uuid, assistant_id: i64, title: &str) -> Result<i64> {
        Ok(self.seed_conversation(user_uuid, assistant_id, title))
    }

    async fn list_for_user(&self, user_uuid: Uuid) -> Result<Vec<ConversationSummary>> {
        let mut convs: Vec<Conversation> = self
            .lock()
            .conversations
            .iter()
            .filter(|c| c.user_uuid == user_uuid)
            .cloned()
            .collect();
        convs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(convs
            .into_iter()
            .map(|c| ConversationSummary {
                id: c.id,
                title: c.title,
            })
            .collect())
    }

    async fn is_owned_by(&self, id: i64, user_uuid: Uuid) -> Result<bool> {
        Ok(self
            .lock()
            .conversations
            .iter()
            .any(|c| c.id == id && c.user_uuid == user_uuid))
    }

    async fn rename(&self, id: i64, title: &str) -> Result<()> {
        let mut inner = self.lock();
        if let Some(conv) = inner.conversations.iter_mut().find(|c| c.id == id) {
            conv.title = title.to_string();
            conv.updated_at = Utc::now() + Duration::seconds(1);
        }
        Ok(())
    }

    async fn set_title(&self, id: i64, title: &str) -> Result<()> {
        if let Some(conv) = self.lock().conversations.iter_mut().find(|c| c.id == id) {
            conv.title = title.to_string();
        }
        Ok(())
    }

    async fn touch(&self, id: i64) -> Result<()> {
        if let Some(conv) = self.lock().conversations.iter_mut().find(|c| c.id == id) {
            conv.updated_at = Utc::now() + Duration::seconds(1);
        }
        Ok(())
    }

    async fn delete_cascading(&self, id: i64) -> Result<Vec<String>> {
        let mut inner = self.lock();
        let paths: Vec<String> = inner
            .documents
            .iter()
            .filter(|d| d.conversation_id == id)
            .map(|d| d.filepath.clone())
            .collect();
        inner.documents.retain(|d| d.conversation_id != id);
        inner.messages.retain(|(m, _)| m.conversation_id != id);
        inner.conversations.retain(|c| c.id != id);
        Ok(paths)
    }

    async fn oldest_beyond(&self, user_uuid: Uuid, keep: i64) -> Result<Option<i64>> {
        let inner = self.lock();
        let mut convs: Vec<&Conversation> = inner
            .conversations
            .iter()
            .filter(|c| c.user_uuid == user_uuid)
            .collect();
        if convs.len() as i64 <= keep {
            return Ok(None);
        }
        convs.sort_by_key(|c| c.created_at);
        Ok(convs.first().map(|c| c.id))
    }
}

#[async_trait]
impl MessageRepository for MemDb {
    async fn append(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
        user_uuid: Uuid,
    ) -> Result<i64> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created_at = Utc::now() + Duration::milliseconds(id);
        inner.messages.push((
            Message {
                id,
                conversation_id,
                role,
                content: Some(content.to_string()),
                user_uuid,
                created_at,
            },
            None,
        ));
        Ok(id)
    }

    async fn history(&self, conversation_id: i64, limit: i64) -> Result<Vec<ChatMessage>> {
        let inner = self.lock();
        let mut rows: Vec<&Message> = inner
            .messages
            .iter()
            .filter(|(m, _)| m.conversation_id == conversation_id && m.content.is_some())
            .map(|(m, _)| m)
            .collect();
        rows.sort_by_key(|m| m.created_at);
        let skip = rows.len().saturating_sub(limit as usize);
        Ok(rows
            .into_iter()
            .skip(skip)
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone().unwrap_or_default(),
            })
            .collect())
    }

    async fn list_for_conversation(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let mut rows = self.messages_in(conversation_id);
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn set_embedding(&self, message_id: i64, vector: &Vector) -> Result<()> {
        if let Some(entry) = self
            .lock()
            .messages
            .iter_mut()
            .find(|(m, _)| m.id == message_id)
        {
            entry.1 = Some(vector.clone());
        }
        Ok(())
    }

    async fn find_similar(&self, query: &Vector, limit: i64) -> Result<Vec<SearchMatch>> {
        let inner = self.lock();
        let mut scored: Vec<(f32, SearchMatch)> = inner
            .messages
            .iter()
            .filter_map(|(m, embedding)| {
                let embedding = embedding.as_ref()?;
                let dot: f32 = embedding
                    .as_slice()
                    .iter()
                    .zip(query.as_slice())
                    .map(|(a, b)| a * b)
                    .sum();
                Some((
                    -dot,
                    SearchMatch {
                        content: m.content.clone().unwrap_or_default(),
                        role: m.role.as_str().to_string(),
                        created_at: m.created_at,
                        conversation_id: m.conversation_id,
                    },
                ))
            })
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Ok(scored
            .into_iter()
            .take(limit as usize)
            .map(|(_, m)| m)
            .collect())
    }
}

#[async_trait]
impl MemoryRepository for MemDb {
    async fn get(&self, user_uuid: Uuid) -> Result<String> {
        let mut inner = self.lock();
        Ok(inner.memories.entry(user_uuid).or_default().clone())
    }

    async fn append(&self, user_uuid: Uuid, text: &str) -> Result<()> {
        let mut inner = self.lock();
        let entry = inner.memories.entry(user_uuid).or_default();
        if entry.trim().is_empty() {
            *entry = text.to_string();
        } else {
            *entry = format!("{}\n{}", entry, text);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for MemDb {
    async fn insert(&self, doc: NewDocument) -> Result<i64> {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.documents.push(StoredDocument {
            id,
            conversation_id: doc.conversation_id,
            original_filename: doc.original_filename,
            stored_filename: doc.stored_filename,
            filepath: doc.filepath,
            mimetype: doc.mimetype,
            filesize: doc.filesize,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn fetch(&self, id: i64) -> Result<Option<StoredDocument>> {
        Ok(self.lock().documents.iter().find(|d| d.id == id).cloned())
    }

    async fn paths_for_conversation(&self, conversation_id: i64) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .documents
            .iter()
            .filter(|d| d.conversation_id == conversation_id)
            .map(|d| d.filepath.clone())
            .collect())
    }
}
