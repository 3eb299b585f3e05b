use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims shared between quillbox-api's auth handlers (encode) and the
/// auth middleware (decode). Canonical definition lives here in
/// quillbox-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,
    pub exp: usize,
}

// -- Auth forms --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// -- Notes --

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Attachment reference (`{owner_id}/{filename}`), if any.
    pub attachment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}
