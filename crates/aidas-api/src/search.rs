//! Semantic search over stored assistant replies.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::debug;

use aidas_core::defaults::SEARCH_LIMIT;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
}

/// `POST /search` - embed the query and rank stored embeddings by
/// inner-product distance.
pub async fn search(
    State(state): State<AppState>,
    Auth(_session): Auth,
    Json(body): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = body
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Trūksta paieškos užklausos.".to_string()))?;

    let vector = state.backend.embed_text(&query).await?;
    let matches = state
        .repos
        .messages
        .find_similar(&vector, SEARCH_LIMIT)
        .await?;

    debug!(
        subsystem = "api",
        op = "search",
        result_count = matches.len(),
        "Search complete"
    );

    Ok(Json(serde_json::json!({ "matches": matches })))
}
