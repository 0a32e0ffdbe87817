//! Avatar blob storage.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// File writes are bounded so a wedged disk cannot hold a request forever.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Abstract file storage for avatars.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Collision-safe storage name derived from the client-supplied filename.
    /// Names never collide for the lifetime of the store.
    fn generate_name(&self, original: &str) -> String;

    /// Persist the blob under `name`.
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Remove the blob. Best-effort by contract; callers decide whether a
    /// failure matters.
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Filesystem store under a dedicated uploads directory.
pub struct FsAvatarStore {
    dir: PathBuf,
}

impl FsAvatarStore {
    /// Open the store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create uploads directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// Split a client-supplied filename into stem and extension. Only the final
/// path component counts, so an upload cannot address outside the store.
fn split_name(original: &str) -> (String, Option<String>) {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext.to_string())),
        _ => (base, None),
    };
    let stem = if stem.is_empty() {
        "avatar".to_string()
    } else {
        stem.to_string()
    };
    (stem, ext)
}

#[async_trait]
impl AvatarStore for FsAvatarStore {
    fn generate_name(&self, original: &str) -> String {
        let (stem, ext) = split_name(original);
        let suffix = Uuid::new_v4().simple();
        match ext {
            Some(ext) => format!("{stem}{suffix}.{ext}"),
            None => format!("{stem}{suffix}"),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        tokio::time::timeout(WRITE_TIMEOUT, tokio::fs::write(&path, bytes))
            .await
            .map_err(|_| anyhow!("timed out writing avatar {name}"))?
            .with_context(|| format!("failed to write avatar {name}"))?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("failed to delete avatar {name}"))
    }
}
