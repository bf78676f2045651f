//! One-shot document summarization.

use std::path::Path;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use aidas_core::{ChatMessage, GenerationOptions, MessageRole};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

/// How much extracted text is handed to the summarizer.
const ANALYZE_TEXT_CAP: usize = 4000;

/// Minimum extracted length considered analyzable.
const ANALYZE_MIN_CHARS: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub document_id: Option<i64>,
}

/// `POST /analyze` - summarize a previously uploaded document.
pub async fn analyze(
    State(state): State<AppState>,
    Auth(session): Auth,
    Json(body): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document_id = body
        .document_id
        .ok_or_else(|| ApiError::BadRequest("Trūksta dokumento ID.".to_string()))?;

    let document = state
        .repos
        .documents
        .fetch(document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dokumentas nerastas.".to_string()))?;

    let owned = state
        .repos
        .conversations
        .is_owned_by(document.conversation_id, session.user_uuid)
        .await?;
    if !owned {
        return Err(ApiError::Forbidden("Prieiga draudžiama.".to_string()));
    }

    let text = aidas_extract::extract_text(Path::new(&document.filepath), &document.mimetype)
        .await?
        .unwrap_or_default();

    if text.chars().count() < ANALYZE_MIN_CHARS {
        return Err(ApiError::BadRequest(
            "Dokumentas tuščias arba netinkamas analizei.".to_string(),
        ));
    }

    let capped: String = text.chars().take(ANALYZE_TEXT_CAP).collect();
    let prompt = format!(
        "Apibendrink šio dokumento turinį aiškiai ir glaustai:\n\n{}",
        capped
    );
    let messages = [
        ChatMessage::new(
            MessageRole::System,
            "Tu esi AI dokumentų analitikas. Glaustai apibendrink dokumento esmę.",
        ),
        ChatMessage::new(MessageRole::User, prompt),
    ];

    let summary = state
        .backend
        .chat(&messages, GenerationOptions::default())
        .await?;

    Ok(Json(serde_json::json!({ "summary": summary })))
}
