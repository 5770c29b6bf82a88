use crate::digest::Digest;
use fs2::FileExt;
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("content blob not found: {0}")]
    NotFound(Digest),

    #[error("cache io error: {0}")]
    Io(#[from] io::Error),

    #[error("cache state is corrupt: {0}")]
    CorruptState(String),

    #[error("merge cancelled before any cache mutation")]
    Cancelled,
}

/// Durable content-addressed store mapping a digest to a local file.
///
/// Layout under the root: `blobs/<algorithm>/<hash>` for published content,
/// `ingest/` for in-flight writes, `cache.lock` serializing sweeps against
/// concurrent ingests. Writes stage into `ingest/` and publish with an atomic
/// rename, so a concurrent reader sees either nothing or a complete blob.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(root.join("blobs").join("sha256"))?;
        fs::create_dir_all(root.join("ingest"))?;
        debug!(root = %root.display(), "Opened artifact store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("cache.lock")
    }

    fn lock_file(&self) -> Result<File, CacheError> {
        Ok(OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?)
    }

    /// Store a file's contents, returning its digest. Idempotent: identical
    /// content lands on the already-published blob.
    pub fn put_file(&self, source: &Path) -> Result<Digest, CacheError> {
        let digest = Digest::of_file(source)?;
        let blob = digest.to_blob_path(&self.root);
        if blob.exists() {
            debug!(digest = %digest, "Blob already present, skipping ingest");
            return Ok(digest);
        }
        let staged = self.stage_path();
        fs::copy(source, &staged)?;
        self.publish(&staged, &digest)?;
        Ok(digest)
    }

    /// Store a byte slice, returning its digest.
    pub fn put_bytes(&self, bytes: &[u8]) -> Result<Digest, CacheError> {
        let digest = Digest::of_bytes(bytes);
        let blob = digest.to_blob_path(&self.root);
        if blob.exists() {
            return Ok(digest);
        }
        let staged = self.stage_path();
        fs::write(&staged, bytes)?;
        self.publish(&staged, &digest)?;
        Ok(digest)
    }

    /// Local path of a published blob.
    pub fn get(&self, digest: &Digest) -> Result<PathBuf, CacheError> {
        let blob = digest.to_blob_path(&self.root);
        if blob.is_file() {
            Ok(blob)
        } else {
            Err(CacheError::NotFound(digest.clone()))
        }
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        digest.to_blob_path(&self.root).is_file()
    }

    /// Exclusive cache lock, taken before a sweep. Blocks until every
    /// in-flight merge has released its shared lock, so the liveness
    /// snapshot taken afterwards cannot miss a merge in progress.
    pub(crate) fn exclusive_lock(&self) -> Result<File, CacheError> {
        let lock = self.lock_file()?;
        fs2::FileExt::lock_exclusive(&lock)?;
        Ok(lock)
    }

    /// Shared cache lock, held by a merge from its first ingest through the
    /// state replacement. Released on drop.
    pub(crate) fn shared_lock(&self) -> Result<File, CacheError> {
        let lock = self.lock_file()?;
        fs2::FileExt::lock_shared(&lock)?;
        Ok(lock)
    }

    /// Reclaim blobs outside the live set, plus any stale ingest leftovers.
    /// Callers must hold the exclusive cache lock; the public entry point is
    /// the artifact tracker's sweep, which owns the liveness snapshot.
    pub(crate) fn sweep_locked(&self, live: &BTreeSet<Digest>) -> Result<usize, CacheError> {
        let mut removed = 0;
        let sha_dir = self.root.join("blobs").join("sha256");
        for entry in fs::read_dir(&sha_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(hash) = name.to_str() else {
                continue;
            };
            let digest = match Digest::parse(&format!("sha256:{hash}")) {
                Ok(digest) => digest,
                Err(_) => {
                    warn!(file = %hash, "Skipping unparseable blob name during sweep");
                    continue;
                }
            };
            if !live.contains(&digest) {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        for entry in fs::read_dir(self.root.join("ingest"))? {
            let entry = entry?;
            let _ = fs::remove_file(entry.path());
        }
        if removed > 0 {
            info!(removed, "Swept unreferenced cache blobs");
        }
        Ok(removed)
    }

    fn stage_path(&self) -> PathBuf {
        self.root.join("ingest").join(Uuid::new_v4().to_string())
    }

    fn publish(&self, staged: &Path, digest: &Digest) -> Result<(), CacheError> {
        // Shared lock: many ingests may run at once, but never during a sweep.
        let lock = self.lock_file()?;
        lock.lock_shared()?;
        let blob = digest.to_blob_path(&self.root);
        let result = match fs::rename(staged, &blob) {
            Ok(()) => {
                debug!(digest = %digest, "Published blob");
                Ok(())
            }
            // Lost a race with an identical ingest; the content is the same.
            Err(_) if blob.exists() => {
                let _ = fs::remove_file(staged);
                Ok(())
            }
            Err(e) => Err(CacheError::Io(e)),
        };
        let _ = fs2::FileExt::unlock(&lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("cache")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_then_get() {
        let (_dir, store) = store();
        let digest = store.put_bytes(b"artifact contents").unwrap();
        let path = store.get(&digest).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"artifact contents");
    }

    #[test]
    fn test_put_is_idempotent() {
        let (_dir, store) = store();
        let first = store.put_bytes(b"same").unwrap();
        let second = store.put_bytes(b"same").unwrap();
        assert_eq!(first, second);
        assert!(store.contains(&first));
    }

    #[test]
    fn test_get_missing_digest_is_not_found() {
        let (_dir, store) = store();
        let missing = Digest::of_bytes(b"never stored");
        match store.get(&missing) {
            Err(CacheError::NotFound(digest)) => assert_eq!(digest, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_put_file_dedupes_identical_content() {
        let (dir, store) = store();
        let a = dir.path().join("a.jar");
        let b = dir.path().join("b.jar");
        fs::write(&a, b"identical").unwrap();
        fs::write(&b, b"identical").unwrap();
        let da = store.put_file(&a).unwrap();
        let db = store.put_file(&b).unwrap();
        assert_eq!(da, db);
        // one physical blob for both
        let blobs: Vec<_> = fs::read_dir(store.root().join("blobs/sha256"))
            .unwrap()
            .collect();
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn test_sweep_removes_only_dead_blobs() {
        let (_dir, store) = store();
        let live = store.put_bytes(b"live").unwrap();
        let dead = store.put_bytes(b"dead").unwrap();
        let _lock = store.exclusive_lock().unwrap();
        let removed = store.sweep_locked(&[live.clone()].into()).unwrap();
        assert_eq!(removed, 1);
        assert!(store.contains(&live));
        assert!(!store.contains(&dead));
    }

    #[test]
    fn test_sweep_clears_stale_ingest_files() {
        let (_dir, store) = store();
        fs::write(store.root().join("ingest").join("stale"), b"x").unwrap();
        let _lock = store.exclusive_lock().unwrap();
        store.sweep_locked(&BTreeSet::new()).unwrap();
        assert_eq!(
            fs::read_dir(store.root().join("ingest")).unwrap().count(),
            0
        );
    }
}
