//! Lazy conversation retention.
//!
//! Runs after a turn that created a conversation. When the user holds more
//! than the retention cap, the single oldest conversation is deleted with
//! its messages, document rows, and stored files. Failures are logged and
//! never surface to the client.

use tracing::{info, warn};
use uuid::Uuid;

use crate::conversations::unlink_files;
use crate::state::Repos;

/// Delete the oldest conversation past the `keep`-th, if any.
pub async fn evict_oldest(repos: &Repos, user_uuid: Uuid, keep: i64) {
    let victim = match repos.conversations.oldest_beyond(user_uuid, keep).await {
        Ok(Some(id)) => id,
        Ok(None) => return,
        Err(e) => {
            warn!(
                subsystem = "api",
                op = "retention",
                user_uuid = %user_uuid,
                error = %e,
                "Failed to find eviction candidate"
            );
            return;
        }
    };

    match repos.conversations.delete_cascading(victim).await {
        Ok(paths) => {
            unlink_files(&paths).await;
            info!(
                subsystem = "api",
                op = "retention",
                user_uuid = %user_uuid,
                conversation_id = victim,
                "Evicted oldest conversation"
            );
        }
        Err(e) => {
            warn!(
                subsystem = "api",
                op = "retention",
                user_uuid = %user_uuid,
                conversation_id = victim,
                error = %e,
                "Eviction failed"
            );
        }
    }
}
