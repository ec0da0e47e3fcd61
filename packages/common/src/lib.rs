pub mod config;
pub mod storage;

pub use config::StorageAppConfig;
pub use storage::{ArtifactId, BlobInfo, BlobStore, BoxReader, StorageError, StoredBlob};
