use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::file_upload::{
    model::{StoredFile, UploadConfig},
    storage::BlobStore,
};

#[derive(Clone)]
pub struct FileUploadService {
    store: Arc<dyn BlobStore + Send + Sync>,
    config: UploadConfig,
}

impl FileUploadService {
    pub fn new(store: Arc<dyn BlobStore + Send + Sync>, config: UploadConfig) -> Self {
        Self { store, config }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    /// Lets callers reject a stream as soon as it grows past the limit.
    pub fn ensure_within_limit(&self, file_size: usize) -> Result<(), error::SystemError> {
        if file_size > self.config.max_file_size {
            return Err(error::SystemError::bad_request(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }
        Ok(())
    }

    /// Validate file type and size
    fn validate_file(&self, file_size: usize, mime_type: &str) -> Result<(), error::SystemError> {
        if file_size == 0 {
            return Err(error::SystemError::bad_request("File is empty"));
        }

        self.ensure_within_limit(file_size)?;

        if !self.config.allowed_mime_types.iter().any(|m| m == mime_type) {
            return Err(error::SystemError::bad_request(format!(
                "File type '{}' is not allowed",
                mime_type
            )));
        }

        Ok(())
    }

    /// `<folder>/<uuid v7>.<ext>`, extension derived from the MIME type.
    fn generate_key(&self, folder: &str, mime_type: &str) -> String {
        let subtype = mime_type.split('/').nth(1).unwrap_or_default();
        let extension = mime_guess::get_mime_extensions_str(mime_type)
            .and_then(|exts| exts.iter().find(|ext| **ext == subtype).or_else(|| exts.first()))
            .copied()
            .unwrap_or("bin");
        format!("{}/{}.{}", folder, Uuid::now_v7(), extension)
    }

    pub async fn upload(
        &self,
        folder: &str,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<StoredFile, error::SystemError> {
        self.validate_file(bytes.len(), mime_type)?;

        let key = self.generate_key(folder, mime_type);
        self.store.put(&key, bytes).await?;

        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), key);
        Ok(StoredFile { key, url })
    }

    /// Removes a blob previously returned by [`upload`](Self::upload), addressed by its URL.
    pub async fn remove(&self, url: &str) -> Result<(), error::SystemError> {
        let base = self.config.base_url.trim_end_matches('/');
        let key = url
            .strip_prefix(base)
            .map(|rest| rest.trim_start_matches('/'))
            .ok_or_else(|| error::SystemError::bad_request("File is not managed by this store"))?;

        self.store.delete(key).await
    }
}
