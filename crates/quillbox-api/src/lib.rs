pub mod auth;
pub mod error;
pub mod middleware;
pub mod notes;
pub mod pages;
pub mod password;
pub mod routes;
pub mod session;

use std::sync::Arc;

use quillbox_db::Database;
use quillbox_files::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub files: Storage,
    pub secret: String,
    pub cookie_secure: bool,
}
