mod artifact_id;
mod error;
mod traits;

pub mod filesystem;

pub use artifact_id::{ArtifactId, MAX_ARTIFACT_ID_LEN};
pub use error::StorageError;
pub use traits::{BlobInfo, BlobStore, BoxReader, StoredBlob};
