//! Centralized default constants for the aidas system.
//!
//! All crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// TURN PIPELINE
// =============================================================================

/// Maximum number of history messages assembled into the prompt window.
pub const HISTORY_WINDOW: i64 = 200;

/// Maximum conversations retained per user before lazy eviction.
pub const RETENTION_KEEP: i64 = 500;

/// Placeholder title given to a conversation created on first message.
pub const NEW_CONVERSATION_TITLE: &str = "Naujas pokalbis...";

/// Fallback system prompt when the conversation's assistant row is missing
/// a prompt.
pub const FALLBACK_SYSTEM_PROMPT: &str = "Tu esi draugiškas AI pagalbininkas.";

/// Preamble prepended to the per-user memory blob in the leading system
/// message.
pub const MEMORY_PREFIX: &str =
    "Tai yra ilgalaikė informacija apie vartotoją, į kurią privalai atsižvelgti: ";

/// Fixed acknowledgment streamed when a memory command terminates a turn.
pub const MEMORY_ACK: &str = "Gerai, įsiminiau.";

/// Assistant reply truncation length for the title prompt.
pub const TITLE_REPLY_TRUNCATE: usize = 300;

// =============================================================================
// SEARCH
// =============================================================================

/// Number of similarity matches returned.
pub const SEARCH_LIMIT: i64 = 5;

/// Embedding vector dimension (text-embedding-ada-002 compatible).
pub const EMBED_DIMENSION: usize = 1536;

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum uploaded file size in bytes (15 MiB).
pub const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Maximum file parts accepted per turn.
pub const MAX_TURN_FILES: usize = 5;

/// Request body cap for the whole server. Must admit a full turn of
/// `MAX_TURN_FILES` files at `MAX_UPLOAD_BYTES` plus multipart overhead.
pub const REQUEST_BODY_LIMIT_BYTES: usize = 80 * 1024 * 1024;

/// Media types accepted at upload. DOCX and images are stored but yield no
/// extracted text.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

/// Whether a declared media type is allowed at upload.
pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

// =============================================================================
// SESSIONS
// =============================================================================

/// Session lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "aidas_session";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_mime_list() {
        assert!(is_allowed_mime("application/pdf"));
        assert!(is_allowed_mime("text/plain"));
        assert!(!is_allowed_mime("application/zip"));
    }

    #[test]
    fn test_body_limit_admits_a_full_turn_of_files() {
        assert!(REQUEST_BODY_LIMIT_BYTES > MAX_TURN_FILES * MAX_UPLOAD_BYTES);
    }
}
