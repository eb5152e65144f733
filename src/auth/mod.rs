//! Session auth: bcrypt-hashed passwords and a signed JWT carried in an
//! HTTP-only cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::db::{models::User, queries};
use crate::error::AppError;

pub const AUTH_COOKIE: &str = "auth-token";
const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

fn not_authenticated() -> AppError {
    AppError::Unauthorized("Not authenticated".to_string())
}

pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("failed to verify password: {}", e)))
}

pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, AppError> {
    let expires = Utc::now() + Duration::days(SESSION_TTL_DAYS);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign session token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| not_authenticated())?;

    Uuid::parse_str(&data.claims.sub).map_err(|_| not_authenticated())
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    let max_age = SESSION_TTL_DAYS * 24 * 60 * 60;
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Strict",
        AUTH_COOKIE, token, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Strict",
        AUTH_COOKIE
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(&format!("{}=", AUTH_COOKIE)))
        .map(|token| token.to_string())
        .next()
}

/// Extractor resolving the session cookie to the logged-in user.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(not_authenticated)?;
        let user_id = verify_token(&token, &state.config.jwt_secret)?;
        let user = queries::find_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(not_authenticated)?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_round_trips_for_the_same_secret() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "secret-a").unwrap();

        assert_eq!(verify_token(&token, "secret-a").unwrap(), user_id);
        assert!(verify_token(&token, "secret-b").is_err());
        assert!(verify_token("garbage", "secret-a").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: (Utc::now() - Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn extracts_auth_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth-token=abc.def.ghi; other=1"),
        );

        assert_eq!(token_from_headers(&headers), Some("abc.def.ghi".to_string()));

        headers.clear();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn session_cookie_flags() {
        let cookie = session_cookie("tok", false);
        assert!(cookie.starts_with("auth-token=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie("tok", true).contains("Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("hunter2!".to_string()).await.unwrap();

        assert!(verify_password("hunter2!".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
