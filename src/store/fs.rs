use super::{ObjectStore, StoreError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Object store backed by a local directory tree.
///
/// Keys are slash-separated and map directly to paths under the root.
/// Writes create parent directories as needed; renames are atomic within
/// one filesystem.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let key = key.trim_matches('/');
        if key.is_empty() || key.split('/').any(|seg| seg == "..") {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.resolve(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(key)?;
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(fs::read(&path).await?)
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        Ok(())
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<(), StoreError> {
        let src_path = self.resolve(src)?;
        let dst_path = self.resolve(dst)?;
        if fs::try_exists(&dst_path).await? {
            // Destination already populated by an earlier run.
            return Ok(());
        }
        if !fs::try_exists(&src_path).await? {
            return Err(StoreError::NotFound(src.to_string()));
        }
        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&src_path, &dst_path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let base = self.resolve(prefix)?;
        if !base.exists() {
            return Ok(Vec::new());
        }
        let root = self.root.clone();
        let keys = tokio::task::spawn_blocking(move || collect_keys(&root, &base))
            .await
            .map_err(|e| StoreError::IoError(std::io::Error::other(e)))?;
        Ok(keys)
    }
}

fn collect_keys(root: &Path, base: &Path) -> Vec<String> {
    let mut keys = Vec::new();
    for entry in WalkDir::new(base).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            keys.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    keys.sort();
    keys
}
