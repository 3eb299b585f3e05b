use anyhow::{Context, Result, bail};
use std::path::PathBuf;

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Process configuration, loaded once at startup and passed explicitly to
/// the components that need it. The signing secret and database path are
/// required; startup fails without them.
pub struct Config {
    pub secret: String,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub allowed_origin: Option<String>,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("QUILLBOX_SECRET")
            .context("QUILLBOX_SECRET must be set to a random string")?;
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            bail!("QUILLBOX_SECRET is empty or still a placeholder");
        }

        let db_path: PathBuf = std::env::var("QUILLBOX_DB_PATH")
            .context("QUILLBOX_DB_PATH must be set")?
            .into();

        let upload_dir: PathBuf = std::env::var("QUILLBOX_UPLOAD_DIR")
            .unwrap_or_else(|_| "./uploads".into())
            .into();
        let host = std::env::var("QUILLBOX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("QUILLBOX_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("QUILLBOX_PORT must be a port number")?;

        let allowed_origin = std::env::var("QUILLBOX_ALLOWED_ORIGIN")
            .ok()
            .filter(|s| !s.is_empty());
        let cookie_secure = std::env::var("QUILLBOX_COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            secret,
            db_path,
            upload_dir,
            host,
            port,
            allowed_origin,
            cookie_secure,
        })
    }
}
