//! Conversation title derivation.

use tracing::{info, warn};

use aidas_core::defaults::TITLE_REPLY_TRUNCATE;
use aidas_core::{ChatMessage, GenerationOptions, InferenceBackend, MessageRole};

use crate::state::Repos;

/// Build the Lithuanian summarization prompt for a fresh conversation.
pub fn title_prompt(user_message: &str, reply: &str) -> String {
    let user_part = if user_message.is_empty() {
        "Vartotojas įkėlė dokumentą analizei.".to_string()
    } else {
        format!("Vartotojas: \"{}\"", user_message)
    };
    let truncated: String = reply.chars().take(TITLE_REPLY_TRUNCATE).collect();
    format!(
        "Remdamasis šiuo pokalbiu, sugeneruok trumpą, 4-6 žodžių pavadinimą lietuvių kalba. Nenaudok kabučių.\n\n{}\nAsistentas: \"{}...\"\n\nPavadinimas:",
        user_part, truncated
    )
}

/// Derive and persist a title for a newly created conversation.
///
/// Best-effort: any failure leaves the placeholder title in place and
/// returns `None`.
pub async fn generate_and_save_title(
    repos: &Repos,
    backend: &dyn InferenceBackend,
    conversation_id: i64,
    user_message: &str,
    reply: &str,
) -> Option<String> {
    let prompt = title_prompt(user_message, reply);
    let options = GenerationOptions {
        temperature: Some(0.5),
        max_tokens: Some(20),
    };

    let raw = match backend
        .chat(&[ChatMessage::new(MessageRole::User, prompt)], options)
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                subsystem = "api",
                op = "generate_title",
                conversation_id,
                error = %e,
                "Title generation failed"
            );
            return None;
        }
    };

    let title = raw.trim().replace('"', "");
    if title.is_empty() {
        return None;
    }

    if let Err(e) = repos.conversations.set_title(conversation_id, &title).await {
        warn!(
            subsystem = "api",
            op = "generate_title",
            conversation_id,
            error = %e,
            "Failed to persist derived title"
        );
        return None;
    }

    info!(
        subsystem = "api",
        op = "generate_title",
        conversation_id,
        title = %title,
        "Conversation titled"
    );
    Some(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_user_message() {
        let prompt = title_prompt("Kas yra fotosintezė?", "Fotosintezė yra procesas...");
        assert!(prompt.contains("Vartotojas: \"Kas yra fotosintezė?\""));
        assert!(prompt.contains("Nenaudok kabučių."));
        assert!(prompt.ends_with("Pavadinimas:"));
    }

    #[test]
    fn test_prompt_for_file_only_turn() {
        let prompt = title_prompt("", "Dokumente aprašoma...");
        assert!(prompt.contains("Vartotojas įkėlė dokumentą analizei."));
    }

    #[test]
    fn test_reply_is_truncated() {
        let long_reply = "ž".repeat(1000);
        let prompt = title_prompt("klausimas", &long_reply);
        let embedded: usize = prompt.matches('ž').count();
        assert_eq!(embedded, TITLE_REPLY_TRUNCATE);
    }
}
