use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid digest format (expected 'algorithm:hash'): {0}")]
pub struct DigestParseError(String);

/// A content-addressable digest, e.g. "sha256:abc123...".
///
/// Digests are derived from artifact bytes, so two targets producing
/// identical output share one digest and one physical blob.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Digest {
    algorithm: String,
    hash: String,
}

impl Digest {
    /// Parse a digest string in format "algorithm:hash".
    pub fn parse(digest: &str) -> Result<Self, DigestParseError> {
        let (algorithm, hash) = digest
            .split_once(':')
            .ok_or_else(|| DigestParseError(digest.to_string()))?;
        if algorithm.is_empty() || hash.is_empty() {
            return Err(DigestParseError(digest.to_string()));
        }
        Ok(Self {
            algorithm: algorithm.to_string(),
            hash: hash.to_string(),
        })
    }

    /// Digest of a byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            algorithm: "sha256".to_string(),
            hash: hex::encode(hasher.finalize()),
        }
    }

    /// Digest of a file's contents, streamed.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(Self {
            algorithm: "sha256".to_string(),
            hash: hex::encode(hasher.finalize()),
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Blob storage path within a cache directory.
    pub fn to_blob_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir
            .join("blobs")
            .join(&self.algorithm)
            .join(&self.hash)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hash)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}

impl TryFrom<String> for Digest {
    type Error = DigestParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
