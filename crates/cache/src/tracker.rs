use crate::artifact::{ArtifactKind, BuildResult};
use crate::digest::Digest;
use crate::store::{ArtifactStore, CacheError};
use scopesync_core::{Label, SyncContext};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

const STATE_FILE: &str = "state.json";

/// Cached outputs of one target: file name -> digest, per artifact kind.
///
/// Replaced wholesale on every successful merge for the target, never
/// partially patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetState {
    pub artifacts: BTreeMap<ArtifactKind, BTreeMap<String, Digest>>,
}

impl TargetState {
    pub fn digests(&self) -> impl Iterator<Item = &Digest> {
        self.artifacts.values().flat_map(|files| files.values())
    }

    pub fn files_of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = (&String, &Digest)> {
        self.artifacts.get(&kind).into_iter().flatten()
    }
}

/// Per-target view over the artifact store: which targets currently have
/// valid cached outputs, and which blobs those are.
///
/// State is persisted as json beside the blob store and reloaded on open, so
/// cached dependencies survive editor restarts. Entries whose blobs are gone
/// are dropped during load.
pub struct ArtifactTracker {
    store: Arc<ArtifactStore>,
    state: RwLock<BTreeMap<Label, TargetState>>,
    state_path: PathBuf,
}

impl ArtifactTracker {
    pub fn open(store: Arc<ArtifactStore>) -> Result<Self, CacheError> {
        let state_path = store.root().join(STATE_FILE);
        let mut state: BTreeMap<Label, TargetState> = match fs::read(&state_path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CacheError::CorruptState(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(CacheError::Io(e)),
        };
        state.retain(|label, target_state| {
            let complete = target_state.digests().all(|digest| store.contains(digest));
            if !complete {
                warn!(target = %label, "Dropping cache entry with missing blobs");
            }
            complete
        });
        debug!(targets = state.len(), "Loaded artifact tracker state");
        Ok(Self {
            store,
            state: RwLock::new(state),
            state_path,
        })
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// All targets with currently valid cached output.
    pub fn live_cached_targets(&self) -> BTreeSet<Label> {
        self.state.read().unwrap().keys().cloned().collect()
    }

    /// Every digest referenced by some live per-target entry.
    pub fn live_digests(&self) -> BTreeSet<Digest> {
        self.state
            .read()
            .unwrap()
            .values()
            .flat_map(|target_state| target_state.digests().cloned())
            .collect()
    }

    /// Local cache files for a target, or `None` if it has never been built.
    pub fn cached_files(&self, target: &Label) -> Option<BTreeSet<PathBuf>> {
        let state = self.state.read().unwrap();
        let target_state = state.get(target)?;
        Some(
            target_state
                .digests()
                .filter_map(|digest| self.store.get(digest).ok())
                .collect(),
        )
    }

    /// Current per-target state, for the model update pipeline.
    pub fn built_deps(&self) -> BTreeMap<Label, TargetState> {
        self.state.read().unwrap().clone()
    }

    /// Merge a build result into the cache.
    ///
    /// For every target in `expected_targets` that produced artifacts, the
    /// contents are ingested into the store and the target's state is
    /// replaced as a whole. Expected targets absent from the result (their
    /// build failed) keep their prior state: a failed rebuild must not
    /// destroy a previously good cache entry.
    ///
    /// Returns the local paths that now back the expected targets' outputs.
    pub fn update(
        &self,
        expected_targets: &BTreeSet<Label>,
        result: &BuildResult,
        context: &SyncContext,
    ) -> Result<BTreeSet<PathBuf>, CacheError> {
        let by_target = result.artifacts_by_target();
        let mut updated_paths = BTreeSet::new();
        let mut replacements: BTreeMap<Label, TargetState> = BTreeMap::new();

        // Shared cache lock held from the first ingest through the state
        // merge, so a sweep can never run between publishing these blobs
        // and the state entries that make them live.
        let _merge_lock = self.store.shared_lock()?;

        // Ingest outside the state lock; blob publication is atomic and
        // identical content dedupes, so a racing update is harmless.
        for target in expected_targets {
            let Some(artifacts) = by_target.get(target) else {
                continue;
            };
            let mut target_state = TargetState::default();
            for artifact in artifacts {
                let digest = self.store.put_file(&artifact.origin)?;
                updated_paths.insert(self.store.get(&digest)?);
                target_state
                    .artifacts
                    .entry(artifact.kind)
                    .or_default()
                    .insert(artifact.file_name(), digest);
            }
            replacements.insert(target.clone(), target_state);
        }

        if context.is_cancelled() {
            // Cancelled before the merge: leave the tracker exactly as it
            // was. The ingested blobs are unreferenced and will be swept.
            return Err(CacheError::Cancelled);
        }

        let merged = replacements.len();
        {
            let mut state = self.state.write().unwrap();
            for (target, target_state) in replacements {
                state.insert(target, target_state);
            }
            self.persist(&state)?;
        }
        info!(
            merged,
            expected = expected_targets.len(),
            "Merged build result into artifact cache"
        );
        Ok(updated_paths)
    }

    /// Reclaim store blobs not referenced by any live per-target entry, and
    /// clear stale ingest leftovers.
    ///
    /// Takes the store's exclusive lock before snapshotting the live digest
    /// set. A concurrent `update` holds the shared lock across its ingest
    /// and merge, so it either completes before the snapshot (and its blobs
    /// are seen as live) or starts after the sweep finishes; a just-merged
    /// target can never lose its blobs.
    pub fn sweep(&self) -> Result<usize, CacheError> {
        let lock = self.store.exclusive_lock()?;
        let live = self.live_digests();
        let removed = self.store.sweep_locked(&live);
        drop(lock);
        removed
    }

    fn persist(&self, state: &BTreeMap<Label, TargetState>) -> Result<(), CacheError> {
        let staged = self.state_path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| CacheError::CorruptState(e.to_string()))?;
        fs::write(&staged, bytes)?;
        fs::rename(&staged, &self.state_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactKind, BuildArtifact, BuildStatus};

    fn tracker(dir: &std::path::Path) -> ArtifactTracker {
        let store = Arc::new(ArtifactStore::open(dir.join("cache")).unwrap());
        ArtifactTracker::open(store).unwrap()
    }

    fn artifact(dir: &std::path::Path, target: &str, name: &str, bytes: &[u8]) -> BuildArtifact {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        BuildArtifact::new(target, ArtifactKind::CompiledArchive, path)
    }

    fn result_with(artifacts: Vec<BuildArtifact>, errors: &[&str]) -> BuildResult {
        BuildResult {
            artifacts,
            targets_with_errors: errors.iter().map(|t| Label::new(*t)).collect(),
            status: if errors.is_empty() {
                BuildStatus::Success
            } else {
                BuildStatus::BuildError
            },
        }
    }

    #[test]
    fn test_update_records_expected_targets() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());
        let context = SyncContext::new();

        let result = result_with(vec![artifact(dir.path(), "//ext:a", "a.jar", b"a")], &[]);
        let updated = tracker
            .update(&[Label::new("//ext:a")].into(), &result, &context)
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(tracker.live_cached_targets(), [Label::new("//ext:a")].into());
        assert_eq!(tracker.cached_files(&Label::new("//ext:a")).unwrap().len(), 1);
        assert!(tracker.cached_files(&Label::new("//ext:never")).is_none());
    }

    #[test]
    fn test_failed_target_keeps_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());
        let context = SyncContext::new();
        let a = Label::new("//ext:a");
        let b = Label::new("//ext:b");
        let expected: BTreeSet<Label> = [a.clone(), b.clone()].into();

        let first = result_with(
            vec![
                artifact(dir.path(), "//ext:a", "a.jar", b"a-v1"),
                artifact(dir.path(), "//ext:b", "b.jar", b"b-v1"),
            ],
            &[],
        );
        tracker.update(&expected, &first, &context).unwrap();
        let b_before = tracker.built_deps()[&b].clone();

        // second build: a succeeds with new content, b fails
        let second = result_with(
            vec![artifact(dir.path(), "//ext:a", "a2.jar", b"a-v2")],
            &["//ext:b"],
        );
        tracker.update(&expected, &second, &context).unwrap();

        let state = tracker.built_deps();
        assert_eq!(state[&b], b_before);
        assert!(state[&a]
            .files_of_kind(ArtifactKind::CompiledArchive)
            .any(|(name, _)| name == "a2.jar"));
        assert!(!state[&a]
            .files_of_kind(ArtifactKind::CompiledArchive)
            .any(|(name, _)| name == "a.jar"));
    }

    #[test]
    fn test_update_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());
        let context = SyncContext::new();
        let expected: BTreeSet<Label> = [Label::new("//ext:a")].into();

        let result = result_with(vec![artifact(dir.path(), "//ext:a", "a.jar", b"a")], &[]);
        tracker.update(&expected, &result, &context).unwrap();
        let once = tracker.built_deps();
        tracker.update(&expected, &result, &context).unwrap();
        assert_eq!(tracker.built_deps(), once);
    }

    #[test]
    fn test_identical_content_shares_one_blob() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());
        let context = SyncContext::new();
        let expected: BTreeSet<Label> = [Label::new("//ext:a"), Label::new("//ext:b")].into();

        let result = result_with(
            vec![
                artifact(dir.path(), "//ext:a", "a.jar", b"identical"),
                BuildArtifact::new(
                    "//ext:b",
                    ArtifactKind::CompiledArchive,
                    dir.path().join("a.jar"),
                ),
            ],
            &[],
        );
        tracker.update(&expected, &result, &context).unwrap();

        assert_eq!(tracker.live_digests().len(), 1);
        let blobs = fs::read_dir(tracker.store().root().join("blobs/sha256"))
            .unwrap()
            .count();
        assert_eq!(blobs, 1);
    }

    #[test]
    fn test_cancellation_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());
        let context = SyncContext::new();
        context.cancel();

        let result = result_with(vec![artifact(dir.path(), "//ext:a", "a.jar", b"a")], &[]);
        let outcome = tracker.update(&[Label::new("//ext:a")].into(), &result, &context);

        assert!(outcome.is_err());
        assert!(tracker.live_cached_targets().is_empty());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let context = SyncContext::new();
        {
            let tracker = tracker(dir.path());
            let result = result_with(vec![artifact(dir.path(), "//ext:a", "a.jar", b"a")], &[]);
            tracker
                .update(&[Label::new("//ext:a")].into(), &result, &context)
                .unwrap();
        }
        let reopened = tracker(dir.path());
        assert_eq!(
            reopened.live_cached_targets(),
            [Label::new("//ext:a")].into()
        );
    }

    #[test]
    fn test_sweep_reclaims_only_unreferenced_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());
        let context = SyncContext::new();
        let a = Label::new("//ext:a");
        let b = Label::new("//ext:b");

        let first = result_with(vec![artifact(dir.path(), "//ext:a", "a.jar", b"a")], &[]);
        tracker.update(&[a.clone()].into(), &first, &context).unwrap();
        let orphan = tracker.store().put_bytes(b"never referenced").unwrap();
        // A target merged after earlier liveness queries must still be live
        // by the time the sweep takes its own snapshot.
        let second = result_with(vec![artifact(dir.path(), "//ext:b", "b.jar", b"b")], &[]);
        tracker.update(&[b.clone()].into(), &second, &context).unwrap();

        let removed = tracker.sweep().unwrap();

        assert_eq!(removed, 1);
        assert!(!tracker.store().contains(&orphan));
        assert_eq!(tracker.live_cached_targets(), [a.clone(), b.clone()].into());
        assert_eq!(tracker.cached_files(&a).unwrap().len(), 1);
        assert_eq!(tracker.cached_files(&b).unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_drops_entries_with_missing_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let context = SyncContext::new();
        {
            let tracker = tracker(dir.path());
            let result = result_with(vec![artifact(dir.path(), "//ext:a", "a.jar", b"a")], &[]);
            tracker
                .update(&[Label::new("//ext:a")].into(), &result, &context)
                .unwrap();
            // simulate external reclamation of every blob
            for entry in fs::read_dir(tracker.store().root().join("blobs/sha256")).unwrap() {
                fs::remove_file(entry.unwrap().path()).unwrap();
            }
        }
        let reopened = tracker(dir.path());
        assert!(reopened.live_cached_targets().is_empty());
    }
}
