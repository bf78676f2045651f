//! The conversational turn pipeline behind `POST /ask`.
//!
//! A turn is prepared synchronously (memory command recognition, lazy
//! conversation creation, file persistence, prompt window assembly, stream
//! handshake) so failures still map to plain HTTP statuses. Once the event
//! stream starts, the pipeline runs in a spawned task feeding an mpsc
//! channel; a client disconnect stops forwarding but the accumulated reply
//! is still persisted.

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use uuid::Uuid;

use aidas_core::defaults::{
    FALLBACK_SYSTEM_PROMPT, HISTORY_WINDOW, MAX_TURN_FILES, MEMORY_ACK, MEMORY_PREFIX,
    NEW_CONVERSATION_TITLE, RETENTION_KEEP,
};
use aidas_core::{
    extract_memory_content, is_memory_command, strip_html, ChatMessage, Error, InferenceBackend,
    MessageRole, TokenStream, TurnEvent,
};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::retention::evict_oldest;
use crate::state::{AppState, Repos};
use crate::title::generate_and_save_title;
use crate::upload::{save_upload, SavedUpload};

/// Parsed and validated `/ask` input. The message is already sanitized and
/// the files are already on disk.
#[derive(Debug)]
pub struct TurnInput {
    pub message: String,
    pub conversation_id: Option<i64>,
    pub files: Vec<SavedUpload>,
}

/// What the prepared turn resolved to.
pub enum TurnPlan {
    /// Memory command: the blob was appended; stream the fixed ack.
    MemoryAck { conversation_id: Option<i64> },
    /// Normal chat turn with a live completion stream.
    Chat(PreparedChat),
}

/// A chat turn past the point of no return: rows written, upstream stream
/// open.
pub struct PreparedChat {
    pub conversation_id: i64,
    pub is_new: bool,
    pub had_input: bool,
    pub user_message: String,
    pub stream: TokenStream,
}

/// Run the fallible pre-stream stage of a turn.
pub async fn prepare_turn(
    repos: &Repos,
    backend: &Arc<dyn InferenceBackend>,
    user_uuid: Uuid,
    input: TurnInput,
) -> Result<TurnPlan, Error> {
    if is_memory_command(&input.message) {
        let content = extract_memory_content(&input.message);
        // A bare trigger extracts nothing and falls through to normal chat.
        if !content.is_empty() {
            repos.memories.append(user_uuid, &content).await?;
            return Ok(TurnPlan::MemoryAck {
                conversation_id: input.conversation_id,
            });
        }
    }

    let memory = repos.memories.get(user_uuid).await?;

    let (conversation_id, is_new) = match input.conversation_id {
        Some(id) => {
            if !repos.conversations.is_owned_by(id, user_uuid).await? {
                return Err(Error::Forbidden("Prieiga draudžiama.".to_string()));
            }
            (id, false)
        }
        None => {
            let assistant = repos
                .assistants
                .default_assistant()
                .await?
                .ok_or_else(|| Error::Config("Nėra sukurta jokių asistentų.".to_string()))?;
            let id = repos
                .conversations
                .create(user_uuid, assistant.id, NEW_CONVERSATION_TITLE)
                .await?;
            (id, true)
        }
    };

    if !input.message.is_empty() {
        repos
            .messages
            .append(conversation_id, MessageRole::User, &input.message, user_uuid)
            .await?;
    }

    // Files are persisted even when extraction fails; a broken PDF must not
    // abort the turn.
    let mut file_context = String::new();
    for file in &input.files {
        repos
            .documents
            .insert(file.clone().into_new_document(conversation_id))
            .await?;
        match aidas_extract::extract_text(Path::new(&file.filepath), &file.mimetype).await {
            Ok(Some(text)) => {
                file_context.push_str(&format!(
                    "\n\n--- Dokumento \"{}\" turinys ---\n{}\n--- Dokumento pabaiga ---",
                    file.original_filename, text
                ));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    subsystem = "api",
                    op = "extract",
                    conversation_id,
                    filename = %file.original_filename,
                    error = %e,
                    "Text extraction failed"
                );
            }
        }
    }

    let window = assemble_window(repos, conversation_id, &memory, &file_context).await?;

    let had_input = !input.message.is_empty() || !input.files.is_empty();
    let stream = backend.chat_stream(&window).await?;

    Ok(TurnPlan::Chat(PreparedChat {
        conversation_id,
        is_new,
        had_input,
        user_message: input.message,
        stream,
    }))
}

/// Build the prompt window: memory system message first, assistant system
/// prompt second, then up to the history cap of messages in chronological
/// order, with any file context merged into the trailing user message.
pub async fn assemble_window(
    repos: &Repos,
    conversation_id: i64,
    memory: &str,
    file_context: &str,
) -> Result<Vec<ChatMessage>, Error> {
    let mut window = repos.messages.history(conversation_id, HISTORY_WINDOW).await?;

    if !file_context.is_empty() {
        match window.last_mut() {
            Some(last) if last.role == MessageRole::User.as_str() => {
                last.content.push_str(file_context);
            }
            _ => window.push(ChatMessage::new(MessageRole::User, file_context.trim())),
        }
    }

    let system_prompt = repos
        .assistants
        .system_prompt_for(conversation_id)
        .await?
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| FALLBACK_SYSTEM_PROMPT.to_string());
    window.insert(0, ChatMessage::new(MessageRole::System, system_prompt));

    if !memory.trim().is_empty() {
        window.insert(
            0,
            ChatMessage::new(MessageRole::System, format!("{}{}", MEMORY_PREFIX, memory)),
        );
    }

    Ok(window)
}

/// Run the post-headers stage: forward fragments, persist the reply, emit
/// the title event, and always close with the `[DONE]` sentinel.
pub async fn drive_turn(
    repos: &Repos,
    backend: &Arc<dyn InferenceBackend>,
    user_uuid: Uuid,
    chat: PreparedChat,
    tx: mpsc::Sender<TurnEvent>,
) {
    // Taken apart so the stream is released before the persistence awaits;
    // a reference to the whole struct would keep the task off the runtime.
    let PreparedChat {
        conversation_id,
        is_new,
        had_input,
        user_message,
        mut stream,
    } = chat;

    let mut reply = String::new();
    let mut client_gone = false;

    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                reply.push_str(&fragment);
                if !client_gone
                    && tx
                        .send(TurnEvent::Content {
                            content: fragment,
                            conversation_id: Some(conversation_id),
                        })
                        .await
                        .is_err()
                {
                    // Keep consuming upstream so the reply can be persisted.
                    client_gone = true;
                    warn!(
                        subsystem = "api",
                        op = "turn",
                        conversation_id,
                        "Client disconnected mid-stream"
                    );
                }
            }
            Err(e) => {
                warn!(
                    subsystem = "api",
                    op = "turn",
                    conversation_id,
                    error = %e,
                    "Upstream stream failed"
                );
                break;
            }
        }
    }
    drop(stream);

    if !reply.is_empty()
        && persist_reply(repos, backend, user_uuid, conversation_id, &reply).await
        && is_new
        && had_input
    {
        if let Some(title) =
            generate_and_save_title(repos, backend.as_ref(), conversation_id, &user_message, &reply)
                .await
        {
            let _ = tx.send(TurnEvent::TitleUpdated { title }).await;
        }
    }

    let _ = tx.send(TurnEvent::Done).await;

    if is_new {
        evict_oldest(repos, user_uuid, RETENTION_KEEP).await;
    }
}

/// Store the assistant reply with its embedding and bump the conversation.
/// Returns whether the reply row itself was stored.
async fn persist_reply(
    repos: &Repos,
    backend: &Arc<dyn InferenceBackend>,
    user_uuid: Uuid,
    conversation_id: i64,
    reply: &str,
) -> bool {
    let message_id = match repos
        .messages
        .append(conversation_id, MessageRole::Assistant, reply, user_uuid)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            error!(
                subsystem = "api",
                op = "turn",
                conversation_id,
                error = %e,
                "Failed to persist assistant reply"
            );
            return false;
        }
    };

    // The embedding is best-effort; the column stays NULL on failure.
    match backend.embed_text(reply).await {
        Ok(vector) => {
            if let Err(e) = repos.messages.set_embedding(message_id, &vector).await {
                warn!(
                    subsystem = "api",
                    op = "turn",
                    message_id,
                    error = %e,
                    "Failed to store embedding"
                );
            }
        }
        Err(e) => {
            warn!(
                subsystem = "api",
                op = "turn",
                message_id,
                error = %e,
                "Embedding generation failed"
            );
        }
    }

    if let Err(e) = repos.conversations.touch(conversation_id).await {
        warn!(
            subsystem = "api",
            op = "turn",
            conversation_id,
            error = %e,
            "Failed to bump conversation"
        );
    }

    true
}

// =============================================================================
// HANDLER
// =============================================================================

/// `POST /ask` - run a conversational turn, streaming the reply as SSE.
pub async fn ask(
    State(state): State<AppState>,
    Auth(session): Auth,
    multipart: Multipart,
) -> Result<axum::response::Response, ApiError> {
    let input = parse_turn_input(&state, multipart).await?;

    if input.message.is_empty() && input.files.is_empty() {
        return Err(ApiError::BadRequest(
            "Klaida: pranešimas ir failai negali būti tušti.".to_string(),
        ));
    }

    let plan = prepare_turn(&state.repos, &state.backend, session.user_uuid, input).await?;

    match plan {
        TurnPlan::MemoryAck { conversation_id } => {
            let events = vec![
                TurnEvent::Content {
                    content: MEMORY_ACK.to_string(),
                    conversation_id,
                },
                TurnEvent::Done,
            ];
            let stream = stream::iter(events.into_iter().map(to_sse_event));
            Ok(Sse::new(stream).into_response())
        }
        TurnPlan::Chat(chat) => {
            let (tx, rx) = mpsc::channel::<TurnEvent>(32);
            let repos = state.repos.clone();
            let backend = state.backend.clone();
            let user_uuid = session.user_uuid;
            tokio::spawn(async move {
                drive_turn(&repos, &backend, user_uuid, chat, tx).await;
            });

            let stream = ReceiverStream::new(rx).map(to_sse_event);
            Ok(Sse::new(stream)
                .keep_alive(
                    KeepAlive::new()
                        .interval(std::time::Duration::from_secs(15))
                        .text("keepalive"),
                )
                .into_response())
        }
    }
}

fn to_sse_event(event: TurnEvent) -> Result<Event, Infallible> {
    Ok(Event::default().data(event.to_sse_data()))
}

/// Parse the `/ask` multipart form: a message, an optional conversation id,
/// and up to the per-turn cap of files written straight to the upload
/// directory.
async fn parse_turn_input(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<TurnInput, ApiError> {
    let mut message = String::new();
    let mut conversation_id: Option<i64> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "message" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                message = strip_html(&raw);
            }
            "conversation_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                if !raw.is_empty() && raw != "null" {
                    conversation_id = raw.parse().ok();
                }
            }
            "documents" => {
                if files.len() >= MAX_TURN_FILES {
                    return Err(ApiError::BadRequest(
                        "Per daug failų viename pranešime.".to_string(),
                    ));
                }
                let original = field.file_name().unwrap_or("dokumentas").to_string();
                let mimetype = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let saved = save_upload(&state.upload_dir, &original, &mimetype, &data).await?;
                files.push(saved);
            }
            _ => {}
        }
    }

    Ok(TurnInput {
        message,
        conversation_id,
        files,
    })
}
