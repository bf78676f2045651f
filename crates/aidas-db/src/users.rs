//! User repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use aidas_core::{Error, RegisterOutcome, Result, User, UserRepository};

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_user(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        uuid: row.get("uuid"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_approved: row.get("is_approved"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn register(&self, email: &str, password_hash: &str) -> Result<RegisterOutcome> {
        let uuid = Uuid::new_v4();
        let result = sqlx::query(
            "INSERT INTO users (uuid, email, password_hash) VALUES ($1, $2, $3)",
        )
        .bind(uuid)
        .bind(email)
        .bind(password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(RegisterOutcome::Created(uuid)),
            // 23505 = unique_violation on the email column
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Ok(RegisterOutcome::DuplicateEmail)
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, uuid, email, password_hash, is_approved, is_admin, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(map_row_to_user))
    }

    async fn set_approved(&self, user_id: i64, approved: bool) -> Result<()> {
        let result = sqlx::query("UPDATE users SET is_approved = $1 WHERE id = $2")
            .bind(approved)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    async fn list_non_admins(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, uuid, email, password_hash, is_approved, is_admin, created_at
             FROM users
             WHERE is_admin = FALSE
             ORDER BY is_approved ASC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_user).collect())
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT is_admin FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| r.get("is_admin")).unwrap_or(false))
    }
}
