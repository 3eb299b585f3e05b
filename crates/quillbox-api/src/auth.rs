use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::info;

use quillbox_types::api::{LoginForm, SignupForm};

use crate::error::ApiError;
use crate::{AppState, password, session};

pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<impl IntoResponse, ApiError> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".into()));
    }
    if form.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }

    let credential = password::hash(&form.password)?;
    let user = state.db.create_user(username, email, &credential)?;

    info!("New user {} registered", user.username);
    Ok(Redirect::to("/login-page"))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    // Unknown email and wrong password collapse into one error so the
    // response never confirms whether an address is registered.
    let user = state.db.get_user_by_email(form.email.trim())?;
    let verified = user
        .as_ref()
        .map(|u| password::verify(&form.password, &u.password))
        .unwrap_or(false);
    let Some(user) = user.filter(|_| verified) else {
        return Err(ApiError::InvalidCredentials);
    };

    let token = session::issue(&state.secret, &user.email)?;
    let cookie = session_cookie(token, state.cookie_secure);

    info!("User {} logged in", user.username);
    Ok((jar.add(cookie), Redirect::to("/dashboard")))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((session::SESSION_COOKIE, "")).path("/").build();
    (jar.remove(cookie), Redirect::to("/login-page"))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((session::SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(session::SESSION_TTL_MINUTES))
        .build()
}
