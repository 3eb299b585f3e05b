use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::error::ApiError;
use crate::session::{self, AuthError};
use crate::AppState;

/// Identity resolved from the session cookie, injected into request
/// extensions for the protected handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Extract and validate the session token from the `access_token` cookie,
/// then resolve it to a user. Any failure redirects to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(session::SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AuthError::MissingToken)?;

    let claims = session::verify(&state.secret, &token)?;

    // The user may have been deleted after the token was issued.
    let user = state
        .db
        .get_user_by_email(&claims.sub)?
        .ok_or(AuthError::UserNotFound)?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        email: user.email,
    });
    Ok(next.run(req).await)
}
