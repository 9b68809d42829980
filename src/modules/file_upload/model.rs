/// File upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub base_url: String,
}

impl UploadConfig {
    /// Avatars: common web image formats, 2 MiB.
    pub fn avatars(base_url: impl Into<String>) -> Self {
        Self {
            max_file_size: 2 * 1024 * 1024,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            base_url: base_url.into(),
        }
    }
}

/// A file accepted by the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub key: String,
    pub url: String,
}
