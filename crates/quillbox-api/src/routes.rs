use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::{AppState, auth, notes, pages};

/// Assemble the application router. Deployment-dependent layers (trace,
/// CORS) are added by the server binary.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(pages::index))
        .route("/login-page", get(pages::login_page))
        .route("/signup-page", get(pages::signup_page))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/my-notes", get(notes::my_notes))
        .route("/notes/create", post(notes::create_note))
        .route("/notes/delete/{note_id}", post(notes::delete_note))
        .route("/notes/search", get(notes::search))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
