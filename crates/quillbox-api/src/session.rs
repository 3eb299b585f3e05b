use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use quillbox_types::api::Claims;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "access_token";

/// Fixed session lifetime; expiry forces re-login (no refresh in scope).
pub const SESSION_TTL_MINUTES: i64 = 60;

/// All variants are handled uniformly as "not authenticated".
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session token")]
    MissingToken,
    #[error("invalid session token")]
    InvalidToken,
    #[error("session expired")]
    ExpiredToken,
    #[error("unknown user")]
    UserNotFound,
}

/// Issue a signed session token for the given subject (the user's email).
pub fn issue(secret: &str, subject: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: subject.to_string(),
        exp: (Utc::now() + chrono::Duration::minutes(SESSION_TTL_MINUTES)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry; the payload is never trusted before both
/// pass. Any bit flip in the token invalidates it.
pub fn verify(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })
}
