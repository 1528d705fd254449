//! Local filesystem storage backend.

use super::{StorageBackend, StorageError};
use actix_web::web;
use async_trait::async_trait;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Local filesystem storage backend.
pub struct LocalStorage {
    /// Base path for file storage
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    ///
    /// The `base_path` directory will be created if it doesn't exist.
    pub fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path)?;
        log::info!("LocalStorage initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a key below `base_path`. Keys that would escape it are refused.
    fn get_file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::Rejected(format!("Invalid storage key: {}", key)));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(key)?;
        log::info!("LocalStorage: put_object: {:?}", path);

        // Use web::block for blocking file operations
        web::block(move || {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, data)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(key)?;
        log::debug!("LocalStorage: delete_object: {:?}", path);

        web::block(move || match fs::remove_file(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get_file_path(key)?.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::content_key;

    #[actix_rt::test]
    async fn test_put_exists_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();
        let key = content_key(b"picture", "png");

        assert!(!storage.exists(&key).await.unwrap());
        storage.put_object(b"picture".to_vec(), &key).await.unwrap();
        assert!(storage.exists(&key).await.unwrap());
        assert!(storage.base_path().join(&key).is_file());

        storage.delete_object(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());
        // Deleting twice is fine.
        storage.delete_object(&key).await.unwrap();
    }

    #[actix_rt::test]
    async fn test_escaping_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(storage
            .put_object(b"x".to_vec(), "../outside.png")
            .await
            .is_err());
        assert!(storage.exists("/etc/passwd").await.is_err());
    }
}
