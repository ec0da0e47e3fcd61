use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::StorageError;

/// Longest accepted artifact id, in bytes.
pub const MAX_ARTIFACT_ID_LEN: usize = 128;

/// A validated, opaque artifact identifier.
///
/// Ids are chosen by callers (or generated as UUIDs) and double as blob
/// storage keys, so only `[A-Za-z0-9._-]` is accepted and a leading dot is
/// rejected.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Validate and wrap a caller-supplied identifier.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::InvalidId("id must not be empty".into()));
        }
        if raw.len() > MAX_ARTIFACT_ID_LEN {
            return Err(StorageError::InvalidId(format!(
                "id exceeds {MAX_ARTIFACT_ID_LEN} characters"
            )));
        }
        if raw.starts_with('.') {
            return Err(StorageError::InvalidId("id must not start with '.'".into()));
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(StorageError::InvalidId(format!(
                "unsupported character {c:?} in id"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Generate a fresh random id (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// First 2 hex characters of `sha256(id)`, used as the shard directory.
    ///
    /// Hashing spreads sequential or prefix-sharing ids evenly across shards.
    pub fn shard_prefix(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..1])
    }
}

impl fmt::Debug for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactId({})", self.0)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ArtifactId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ArtifactId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
