//! Addressable blob storage for chunk markup and artifacts

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tokio::sync::RwLock;

use crate::{ExportError, Result};

const MEMORY_SCHEME: &str = "memory://";

/// Stores byte blobs under keys and hands back a location for each
#[trait_variant::make(Send)]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `key`, replacing any previous blob
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;

    async fn get(&self, location: &str) -> Result<Vec<u8>>;

    async fn exists(&self, location: &str) -> bool;

    async fn delete(&self, location: &str) -> Result<()>;
}

/// Reject keys that could escape the store root
fn validate_key(key: &str) -> Result<()> {
    let path = Path::new(key);
    let safe = !key.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if safe {
        Ok(())
    } else {
        Err(ExportError::Blob(format!("invalid blob key '{}'", key)))
    }
}

/// In-process blob store with `memory://` locations
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    fn key_of<'a>(&self, location: &'a str) -> Result<&'a str> {
        location
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| ExportError::Blob(format!("not a memory location: {}", location)))
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        validate_key(key)?;
        self.blobs.write().await.insert(key.to_string(), bytes);
        Ok(format!("{}{}", MEMORY_SCHEME, key))
    }

    async fn get(&self, location: &str) -> Result<Vec<u8>> {
        let key = self.key_of(location)?;
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ExportError::Blob(format!("blob not found: {}", location)))
    }

    async fn exists(&self, location: &str) -> bool {
        match self.key_of(location) {
            Ok(key) => self.blobs.read().await.contains_key(key),
            Err(_) => false,
        }
    }

    async fn delete(&self, location: &str) -> Result<()> {
        let key = self.key_of(location)?;
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

/// Blob store rooted in a local directory; locations are file paths
#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Create the store, creating its root directory if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location, refusing paths outside the root
    fn path_of(&self, location: &str) -> Result<PathBuf> {
        let path = PathBuf::from(location);
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| ExportError::Blob(format!("location outside store: {}", location)))?;
        validate_key(&relative.to_string_lossy())?;
        Ok(path)
    }
}

impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn get(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.path_of(location)?;
        Ok(tokio::fs::read(&path).await?)
    }

    async fn exists(&self, location: &str) -> bool {
        match self.path_of(location) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn delete(&self, location: &str) -> Result<()> {
        let path = self.path_of(location)?;
        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = MemoryBlobStore::new();
        let location = store.put("jobs/1/chunk-0000.html", b"<p>a</p>".to_vec()).await.unwrap();

        assert_eq!(location, "memory://jobs/1/chunk-0000.html");
        assert!(store.exists(&location).await);
        assert_eq!(store.get(&location).await.unwrap(), b"<p>a</p>");

        store.delete(&location).await.unwrap();
        assert!(!store.exists(&location).await);
        assert!(store.get(&location).await.is_err());
    }

    #[tokio::test]
    async fn test_keys_cannot_escape() {
        let store = MemoryBlobStore::new();
        assert!(store.put("../etc/passwd", vec![]).await.is_err());
        assert!(store.put("/abs", vec![]).await.is_err());
        assert!(store.put("", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_filesystem_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path().join("blobs")).await.unwrap();

        let location = store.put("jobs/abc/artifact.html", b"hello".to_vec()).await.unwrap();
        assert!(Path::new(&location).starts_with(store.root()));
        assert!(store.exists(&location).await);
        assert_eq!(store.get(&location).await.unwrap(), b"hello");

        store.delete(&location).await.unwrap();
        assert!(!store.exists(&location).await);
    }

    #[tokio::test]
    async fn test_filesystem_rejects_foreign_locations() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path()).await.unwrap();

        assert!(store.get("/etc/hosts").await.is_err());
        assert!(!store.exists("/etc/hosts").await);
    }
}
