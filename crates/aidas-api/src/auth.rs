//! Registration, login, and session extraction.
//!
//! Sessions are opaque random tokens carried in an HttpOnly cookie; only
//! their SHA-256 hash is stored server-side.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::SaltString;
use argon2::Argon2;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::{info, warn};

use aidas_core::defaults::{SESSION_COOKIE, SESSION_TTL_DAYS};
use aidas_core::{AuthSession, Error, RegisterOutcome};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// PASSWORD HASHING
// =============================================================================

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC-format hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

// =============================================================================
// SESSION EXTRACTION
// =============================================================================

/// Pull the session token out of the Cookie header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Authenticated principal extractor. Rejects with 401 when the cookie is
/// missing, unknown, or expired.
pub struct Auth(pub AuthSession);

#[async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = session_token(&parts.headers).ok_or_else(|| {
            ApiError::Unauthorized("Vartotojas neautentifikuotas arba sesija baigėsi.".to_string())
        })?;

        let session = state
            .repos
            .sessions
            .validate(&token)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "Vartotojas neautentifikuotas arba sesija baigėsi.".to_string(),
                )
            })?;

        Ok(Auth(session))
    }
}

/// Admin-gated extractor layered on [`Auth`].
pub struct AdminAuth(pub AuthSession);

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Auth(session) = Auth::from_request_parts(parts, state).await?;
        if !session.is_admin {
            return Err(ApiError::Forbidden(
                "Prieiga draudžiama. Ši sritis skirta tik administratoriams.".to_string(),
            ));
        }
        Ok(AdminAuth(session))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// `POST /register` - create an unapproved account.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Reikia el. pašto ir slaptažodžio.".to_string(),
        ));
    }

    let password_hash = hash_password(&body.password)?;
    match state.repos.users.register(&body.email, &password_hash).await? {
        RegisterOutcome::Created(uuid) => {
            info!(subsystem = "api", op = "register", user_uuid = %uuid, "Account created");
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "message": "Registracija sėkminga! Jūsų paskyra bus aktyvuota, kai ją patvirtins administratorius."
                })),
            ))
        }
        RegisterOutcome::DuplicateEmail => Err(ApiError::Conflict(
            "Toks el. paštas jau egzistuoja.".to_string(),
        )),
    }
}

/// `POST /login` - verify credentials and issue a session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Reikia el. pašto ir slaptažodžio.".to_string(),
        ));
    }

    let user = state
        .repos
        .users
        .find_by_email(&body.email)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("Neteisingi prisijungimo duomenys.".to_string())
        })?;

    if !user.is_approved {
        return Err(ApiError::Unauthorized(
            "Jūsų paskyra dar nepatvirtinta administratoriaus.".to_string(),
        ));
    }

    if !verify_password(&body.password, &user.password_hash) {
        warn!(subsystem = "api", op = "login", email = %body.email, "Password mismatch");
        return Err(ApiError::Unauthorized(
            "Neteisingi prisijungimo duomenys.".to_string(),
        ));
    }

    let session = state.repos.sessions.create(user.id).await?;
    info!(subsystem = "api", op = "login", user_uuid = %user.uuid, "Login");

    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        session.token,
        SESSION_TTL_DAYS * 24 * 60 * 60,
    );

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(serde_json::json!({ "message": "Prisijungimas sėkmingas." })),
    ))
}

/// `POST /logout` - revoke the session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.repos.sessions.revoke(&token).await?;
    }

    let clear = format!("{}=; HttpOnly; Path=/; Max-Age=0", SESSION_COOKIE);
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, clear)],
        Json(serde_json::json!({ "message": "Atsijungta sėkmingai." })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("slaptas123").unwrap();
        assert!(verify_password("slaptas123", &hash));
        assert!(!verify_password("kitas", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("slaptas123").unwrap();
        let b = hash_password("slaptas123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("other=1; aidas_session=abc123; theme=dark"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        let mut missing = HeaderMap::new();
        missing.insert(COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(session_token(&missing), None);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("slaptas123", "not-a-phc-hash"));
    }
}
