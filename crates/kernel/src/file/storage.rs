//! Photo storage backends.
//!
//! Stored objects are addressed by URIs such as
//! `local://shirts/2025/12/0193a1b2_front.jpg`; the scheme names the backend.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::upload::sanitize_filename;

/// Directory every shirt photo is stored under.
pub const PHOTO_PREFIX: &str = "shirts";

const LOCAL_SCHEME: &str = "local://";

/// Storage backend for uploaded photos.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn write(&self, uri: &str, data: &[u8]) -> Result<()>;

    async fn read(&self, uri: &str) -> Result<Vec<u8>>;

    /// Remove a stored object. A missing object is not an error.
    async fn delete(&self, uri: &str) -> Result<()>;

    async fn exists(&self, uri: &str) -> Result<bool>;

    /// Fresh, collision-free URI for an upload named `filename`.
    fn generate_uri(&self, filename: &str) -> String;
}

/// Photos on the local filesystem, below `base_path`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Stored URI for a path served under the files URL.
    pub fn uri_for_path(path: &str) -> String {
        format!("{LOCAL_SCHEME}{}", path.trim_start_matches('/'))
    }

    fn path_of(&self, uri: &str) -> Result<PathBuf> {
        let relative = uri
            .strip_prefix(LOCAL_SCHEME)
            .with_context(|| format!("not a local storage URI: {uri}"))?;
        resolve_relative(&self.base_path, relative)
    }
}

/// Join `relative` onto `base`, refusing anything that could leave `base`.
pub(crate) fn resolve_relative(base: &Path, relative: &str) -> Result<PathBuf> {
    if relative.is_empty() || relative.contains('\0') {
        anyhow::bail!("empty or invalid storage path");
    }
    let escapes = Path::new(relative)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        anyhow::bail!("storage path leaves the storage root: {relative}");
    }
    Ok(base.join(relative))
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn write(&self, uri: &str, data: &[u8]) -> Result<()> {
        let path = self.path_of(uri)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        fs::write(&path, data)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        debug!(%uri, bytes = data.len(), "photo stored");
        Ok(())
    }

    async fn read(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.path_of(uri)?;
        fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))
    }

    async fn delete(&self, uri: &str) -> Result<()> {
        let path = self.path_of(uri)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%uri, "photo removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%uri, "photo already gone");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    async fn exists(&self, uri: &str) -> Result<bool> {
        let path = self.path_of(uri)?;
        fs::try_exists(&path)
            .await
            .with_context(|| format!("failed to stat {}", path.display()))
    }

    fn generate_uri(&self, filename: &str) -> String {
        let id = uuid::Uuid::now_v7().simple().to_string();
        format!(
            "{LOCAL_SCHEME}{PHOTO_PREFIX}/{}/{}_{}",
            chrono::Utc::now().format("%Y/%m"),
            &id[..8],
            sanitize_filename(filename)
        )
    }
}
