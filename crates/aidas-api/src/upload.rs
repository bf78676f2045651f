//! File upload handling.

use std::path::Path as FsPath;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use tracing::info;
use uuid::Uuid;

use aidas_core::defaults::{is_allowed_mime, MAX_UPLOAD_BYTES};
use aidas_core::{Error, NewDocument};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

/// A file written to the upload directory, ready for a metadata row.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub original_filename: String,
    pub stored_filename: String,
    pub filepath: String,
    pub mimetype: String,
    pub filesize: i64,
}

/// Validate and persist one uploaded file to the upload directory.
///
/// The stored name is a random hex identifier; the original filename only
/// lives in the metadata row.
pub async fn save_upload(
    upload_dir: &FsPath,
    original_filename: &str,
    mimetype: &str,
    data: &[u8],
) -> Result<SavedUpload, Error> {
    if !is_allowed_mime(mimetype) {
        return Err(Error::UnsupportedType(mimetype.to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(Error::InvalidInput("Failas per didelis.".to_string()));
    }

    let stored_filename = Uuid::new_v4().simple().to_string();
    let filepath = upload_dir.join(&stored_filename);
    tokio::fs::write(&filepath, data).await?;

    Ok(SavedUpload {
        original_filename: original_filename.to_string(),
        stored_filename,
        filepath: filepath.to_string_lossy().into_owned(),
        mimetype: mimetype.to_string(),
        filesize: data.len() as i64,
    })
}

impl SavedUpload {
    pub fn into_new_document(self, conversation_id: i64) -> NewDocument {
        NewDocument {
            conversation_id,
            original_filename: self.original_filename,
            stored_filename: self.stored_filename,
            filepath: self.filepath,
            mimetype: self.mimetype,
            filesize: self.filesize,
        }
    }
}

/// `POST /upload` - attach a single file to an existing conversation.
pub async fn upload(
    State(state): State<AppState>,
    Auth(session): Auth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut conversation_id: Option<i64> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "conversationId" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                conversation_id = value.parse().ok();
            }
            "document" => {
                let original = field.file_name().unwrap_or("dokumentas").to_string();
                let mimetype = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some((original, mimetype, data.to_vec()));
            }
            _ => {}
        }
    }

    let (original, mimetype, data) =
        file.ok_or_else(|| ApiError::BadRequest("Failas nebuvo įkeltas.".to_string()))?;

    let conversation_id = conversation_id.ok_or_else(|| {
        ApiError::BadRequest("Norėdami įkelti failą, pirmiausia pradėkite pokalbį.".to_string())
    })?;

    if !state
        .repos
        .conversations
        .is_owned_by(conversation_id, session.user_uuid)
        .await?
    {
        return Err(ApiError::Forbidden("Prieiga draudžiama.".to_string()));
    }

    let saved = save_upload(&state.upload_dir, &original, &mimetype, &data).await?;
    let filename = saved.original_filename.clone();
    state
        .repos
        .documents
        .insert(saved.into_new_document(conversation_id))
        .await?;

    info!(
        subsystem = "api",
        op = "upload",
        conversation_id,
        filesize = data.len(),
        "File stored"
    );

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Failas sėkmingai įkeltas ir susietas su pokalbiu.",
            "filename": filename,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let saved = save_upload(dir.path(), "ataskaita.txt", "text/plain", b"turinys")
            .await
            .unwrap();

        assert_eq!(saved.original_filename, "ataskaita.txt");
        assert_eq!(saved.filesize, 7);
        let on_disk = tokio::fs::read(&saved.filepath).await.unwrap();
        assert_eq!(on_disk, b"turinys");
    }

    #[tokio::test]
    async fn test_save_upload_rejects_bad_mime() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_upload(dir.path(), "archyvas.zip", "application/zip", b"x").await;
        assert!(matches!(result, Err(Error::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_save_upload_rejects_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let result = save_upload(dir.path(), "didelis.txt", "text/plain", &data).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
