use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration shared by every component that opens a store.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Root directory of the filesystem blob store. Default: "./data/blobs".
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
    /// Largest blob accepted by `put`, in bytes. Default: 512 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_blob_size() -> u64 {
    512 * 1024 * 1024
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            blob_dir: default_blob_dir(),
            max_blob_size: default_max_blob_size(),
        }
    }
}
