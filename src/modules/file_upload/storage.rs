use std::path::{Path, PathBuf};

use crate::api::error;

/// Object storage addressed by slash separated keys such as `avatar/<uuid>.png`.
#[async_trait::async_trait]
pub trait BlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), error::SystemError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), error::SystemError>;
}

/// Stores blobs as plain files below `root`.
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
    root: PathBuf,
}

impl DiskBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, error::SystemError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(error::SystemError::bad_request("Invalid storage key"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl BlobStore for DiskBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), error::SystemError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Blob {} already missing", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
