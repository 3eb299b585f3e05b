use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Manages on-disk attachment storage.
///
/// Each attachment is stored at `{root}/{owner_id}/{filename}` so filenames
/// never collide across users. The reference handed back to callers is the
/// relative `{owner_id}/{filename}` part.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub async fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).await?;
        info!("Attachment storage directory: {}", root.display());
        Ok(Self { root })
    }

    /// Absolute path for a stored reference.
    pub fn path_for(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }

    /// Write attachment bytes under the owner's directory and return the
    /// reference. The filename is reduced to its final path component, so a
    /// crafted name cannot escape the owner's directory.
    pub async fn store(&self, owner_id: i64, filename: &str, bytes: &[u8]) -> Result<String> {
        let name = sanitize_filename(filename)?;

        let dir = self.root.join(owner_id.to_string());
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&name), bytes).await?;

        Ok(format!("{owner_id}/{name}"))
    }

    /// Delete the bytes behind a reference. Idempotent: returns false when
    /// the file was already gone.
    pub async fn remove(&self, reference: &str) -> Result<bool> {
        if !is_clean_reference(reference) {
            bail!("invalid attachment reference: {}", reference);
        }

        match fs::remove_file(self.path_for(reference)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Attachment {} already gone", reference);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn sanitize_filename(filename: &str) -> Result<String> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        bail!("invalid attachment filename: {:?}", filename);
    }
    Ok(name.to_string())
}

fn is_clean_reference(reference: &str) -> bool {
    !reference.is_empty()
        && Path::new(reference)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("uploads")).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn store_and_remove_roundtrip() {
        let (_dir, storage) = storage().await;

        let reference = storage.store(7, "notes.txt", b"hello").await.unwrap();
        assert_eq!(reference, "7/notes.txt");
        assert_eq!(fs::read(storage.path_for(&reference)).await.unwrap(), b"hello");

        assert!(storage.remove(&reference).await.unwrap());
        // Second removal is not an error, just a signal.
        assert!(!storage.remove(&reference).await.unwrap());
    }

    #[tokio::test]
    async fn same_filename_does_not_collide_across_owners() {
        let (_dir, storage) = storage().await;

        let a = storage.store(1, "report.pdf", b"a").await.unwrap();
        let b = storage.store(2, "report.pdf", b"b").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(fs::read(storage.path_for(&a)).await.unwrap(), b"a");
        assert_eq!(fs::read(storage.path_for(&b)).await.unwrap(), b"b");
    }

    #[tokio::test]
    async fn traversal_filenames_are_reduced_to_basename() {
        let (_dir, storage) = storage().await;

        let reference = storage.store(1, "../../etc/passwd", b"x").await.unwrap();
        assert_eq!(reference, "1/passwd");

        assert!(storage.store(1, "..", b"x").await.is_err());
        assert!(storage.remove("../outside").await.is_err());
    }
}
