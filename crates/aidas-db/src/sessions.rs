//! Session repository: opaque bearer tokens stored as SHA-256 hashes.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use aidas_core::defaults::SESSION_TTL_DAYS;
use aidas_core::{AuthSession, Error, Result, SessionRepository, SessionToken};

/// PostgreSQL implementation of SessionRepository.
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Hash a token for storage and lookup.
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generate a 32-byte random token, hex-encoded.
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, user_id: i64) -> Result<SessionToken> {
        let token = Self::generate_token();
        let token_hash = Self::hash_token(&token);
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(SessionToken { token, expires_at })
    }

    async fn validate(&self, token: &str) -> Result<Option<AuthSession>> {
        let token_hash = Self::hash_token(token);
        let row = sqlx::query(
            "SELECT u.id, u.uuid, u.email, u.is_admin
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = $1 AND s.expires_at > now()",
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| AuthSession {
            user_id: r.get("id"),
            user_uuid: r.get("uuid"),
            email: r.get("email"),
            is_admin: r.get("is_admin"),
        }))
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        let token_hash = Self::hash_token(token);
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic() {
        let a = PgSessionRepository::hash_token("abc");
        let b = PgSessionRepository::hash_token("abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_generate_token_is_unique() {
        let a = PgSessionRepository::generate_token();
        let b = PgSessionRepository::generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
