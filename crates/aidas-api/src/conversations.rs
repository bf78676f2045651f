//! Conversation listing, display, rename, and deletion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::{info, warn};

use aidas_core::strip_html;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /conversations` - sidebar listing, most recently updated first.
pub async fn list(
    State(state): State<AppState>,
    Auth(session): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = state
        .repos
        .conversations
        .list_for_user(session.user_uuid)
        .await?;
    Ok(Json(summaries))
}

/// `GET /conversations/:id` - full message listing, owner-checked.
pub async fn messages(
    State(state): State<AppState>,
    Auth(session): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state
        .repos
        .conversations
        .is_owned_by(id, session.user_uuid)
        .await?
    {
        return Err(ApiError::Forbidden("Prieiga draudžiama.".to_string()));
    }

    let messages = state.repos.messages.list_for_conversation(id).await?;
    let rows: Vec<serde_json::Value> = messages
        .into_iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect();
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: Option<String>,
}

/// `PATCH /conversations/:id` - rename with a sanitized title.
pub async fn rename(
    State(state): State<AppState>,
    Auth(session): Auth,
    Path(id): Path<i64>,
    Json(body): Json<RenameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = body
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Trūksta naujo pavadinimo.".to_string()))?;

    if !state
        .repos
        .conversations
        .is_owned_by(id, session.user_uuid)
        .await?
    {
        return Err(ApiError::Forbidden("Prieiga draudžiama.".to_string()));
    }

    let sanitized = strip_html(&title);
    state.repos.conversations.rename(id, &sanitized).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Pokalbis sėkmingai pervadintas." })),
    ))
}

/// `DELETE /conversations/:id` - transactional delete, then best-effort
/// file unlink.
pub async fn delete(
    State(state): State<AppState>,
    Auth(session): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state
        .repos
        .conversations
        .is_owned_by(id, session.user_uuid)
        .await?
    {
        return Err(ApiError::Forbidden("Prieiga draudžiama.".to_string()));
    }

    let paths = state.repos.conversations.delete_cascading(id).await?;
    unlink_files(&paths).await;

    info!(
        subsystem = "api",
        op = "delete_conversation",
        conversation_id = id,
        file_count = paths.len(),
        "Conversation deleted"
    );
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Pokalbis sėkmingai ištrintas." })),
    ))
}

/// Unlink stored files after their metadata rows are gone. One attempt per
/// file; failures are logged and leave orphans on disk.
pub async fn unlink_files(paths: &[String]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(
                subsystem = "api",
                op = "unlink",
                filepath = %path,
                error = %e,
                "Failed to delete stored file"
            );
        }
    }
}
