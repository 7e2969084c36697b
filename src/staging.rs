//! Filesystem staging for media files.
//!
//! Generates unique on-disk names, performs the move that makes an uploaded
//! file permanent, and removes orphaned files when an operation fails
//! partway. Names derive from 16 random bytes, never from user-supplied
//! content, so collisions are cryptographically negligible.

use clipvault_common::Result;
use rand::rngs::OsRng;
use rand::RngCore;
use std::path::{Path, PathBuf};

/// Handle on the staging area root.
#[derive(Debug, Clone)]
pub struct Staging {
    root: PathBuf,
}

impl Staging {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the staging root if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// A fresh permanent path whose extension matches `reference`
    /// (an original filename or an existing storage path).
    pub fn unique_path_like(&self, reference: &str) -> PathBuf {
        match Path::new(reference).extension() {
            Some(ext) => self
                .root
                .join(format!("{}.{}", random_stem(), ext.to_string_lossy())),
            None => self.root.join(random_stem()),
        }
    }

    /// A fresh permanent path with an explicit extension.
    pub fn unique_path_with_ext(&self, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{}", random_stem(), ext))
    }

    /// A transient path for bytes still being received. Files here are
    /// either promoted by the lifecycle manager or deleted.
    pub fn transient_path(&self) -> PathBuf {
        self.root.join(format!("incoming-{}.part", random_stem()))
    }

    /// Move a file into its permanent location. Atomic on one filesystem.
    pub async fn promote(&self, from: &Path, to: &Path) -> Result<()> {
        tokio::fs::rename(from, to).await?;
        Ok(())
    }
}

/// Best-effort removal of a file left behind by a failed operation.
///
/// Runs to completion before the caller reports its failure, but its own
/// failure is only logged so it never masks the original error.
pub async fn remove_orphan(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!("failed to remove orphaned file {}: {}", path.display(), e);
        }
    }
}

fn random_stem() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_paths_differ() {
        let staging = Staging::new("/tmp/staging");
        let a = staging.unique_path_like("clip.mp4");
        let b = staging.unique_path_like("clip.mp4");
        assert_ne!(a, b);
    }

    #[test]
    fn test_extension_preserved() {
        let staging = Staging::new("/tmp/staging");

        let path = staging.unique_path_like("My Movie.MKV");
        assert_eq!(path.extension().unwrap(), "MKV");
        // 32 hex chars + dot + extension
        assert_eq!(path.file_stem().unwrap().len(), 32);

        let bare = staging.unique_path_like("noextension");
        assert!(bare.extension().is_none());
    }

    #[tokio::test]
    async fn test_promote_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());

        let from = staging.transient_path();
        tokio::fs::write(&from, b"payload").await.unwrap();

        let to = staging.unique_path_like("clip.mp4");
        staging.promote(&from, &to).await.unwrap();

        assert!(!from.exists());
        assert_eq!(tokio::fs::read(&to).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_remove_orphan_is_quiet_on_missing() {
        // Deleting a path that was never created must not panic or error.
        remove_orphan(Path::new("/tmp/does-not-exist-12345")).await;
    }

    #[tokio::test]
    async fn test_remove_orphan_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orphan.mp4");
        tokio::fs::write(&path, b"x").await.unwrap();

        remove_orphan(&path).await;
        assert!(!path.exists());
    }
}
