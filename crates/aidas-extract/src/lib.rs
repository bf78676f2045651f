//! Text extraction from uploaded documents.
//!
//! PDF and plain text files yield extracted text for the conversation
//! context. DOCX and image uploads are stored but produce no text, so
//! extraction returns `None` for them.

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use aidas_core::{Error, Result};

/// Extract text from an uploaded file according to its MIME type.
///
/// Returns `Ok(None)` for types that are stored without extraction
/// (DOCX, JPEG, PNG) and an error for types the uploader should have
/// rejected.
pub async fn extract_text(path: &Path, mimetype: &str) -> Result<Option<String>> {
    match mimetype {
        "application/pdf" => extract_pdf(path).await.map(Some),
        "text/plain" => {
            let content = tokio::fs::read_to_string(path).await?;
            Ok(Some(content))
        }
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        | "image/jpeg"
        | "image/png" => Ok(None),
        other => Err(Error::UnsupportedType(other.to_string())),
    }
}

/// Extract text from every page of a PDF, in page order.
async fn extract_pdf(path: &Path) -> Result<String> {
    let path = path.to_path_buf();

    // lopdf is synchronous and parsing can be heavy.
    let text = tokio::task::spawn_blocking(move || -> Result<String> {
        let doc = Document::load(&path)
            .map_err(|e| Error::InvalidInput(format!("Failed to parse PDF: {}", e)))?;

        let pages = doc.get_pages();
        let mut out = String::new();
        for (page_num, page_id) in pages {
            match doc.extract_text(&[page_num]) {
                Ok(page_text) => {
                    for line in page_text.lines() {
                        let line = line.trim_end();
                        if !line.is_empty() {
                            out.push_str(line);
                            out.push('\n');
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        subsystem = "extract",
                        page = page_num,
                        object_id = ?page_id,
                        error = %e,
                        "Skipping unextractable PDF page"
                    );
                }
            }
        }
        Ok(out)
    })
    .await
    .map_err(|e| Error::Internal(format!("PDF extraction task failed: {}", e)))??;

    debug!(
        subsystem = "extract",
        op = "extract_pdf",
        response_len = text.len(),
        "Extracted PDF text"
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_plain_text_is_read_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Sveiki,\npasaulis!").unwrap();

        let text = extract_text(file.path(), "text/plain").await.unwrap();
        assert_eq!(text.as_deref(), Some("Sveiki,\npasaulis!"));
    }

    #[tokio::test]
    async fn test_docx_and_images_yield_no_text() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let docx = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

        assert!(extract_text(file.path(), docx).await.unwrap().is_none());
        assert!(extract_text(file.path(), "image/jpeg")
            .await
            .unwrap()
            .is_none());
        assert!(extract_text(file.path(), "image/png")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_type_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = extract_text(file.path(), "application/zip").await;
        assert!(matches!(result, Err(Error::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "ne pdf turinys").unwrap();

        let result = extract_text(file.path(), "application/pdf").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let path = Path::new("/nonexistent/failas.txt");
        let result = extract_text(path, "text/plain").await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
