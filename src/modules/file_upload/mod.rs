pub mod model;
pub mod service;
pub mod storage;

pub use model::UploadConfig;
pub use service::FileUploadService;
pub use storage::DiskBlobStore;
