/// Database row types — these map directly to SQLite rows.
/// Distinct from quillbox-types API models to keep the DB layer independent.

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct NoteRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub file_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
