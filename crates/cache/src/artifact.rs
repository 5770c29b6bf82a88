use scopesync_core::Label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// What kind of output a build artifact is, deciding which project model
/// section it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Compiled archive (jar) attached as a library.
    CompiledArchive,
    /// Checked-in source archive (srcjar) of a dependency.
    SourceArchive,
    /// Archive of generated sources (srcjar).
    GeneratedSourceArchive,
    /// Loose generated source file.
    GeneratedSource,
}

/// One file produced by a builder invocation, still at the location the
/// builder materialized it. `update` moves its content into the store.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub target: Label,
    pub kind: ArtifactKind,
    /// The builder's output file.
    pub origin: PathBuf,
}

impl BuildArtifact {
    pub fn new(target: impl Into<Label>, kind: ArtifactKind, origin: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            kind,
            origin: origin.into(),
        }
    }

    pub fn file_name(&self) -> String {
        self.origin
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Overall exit status of one builder invocation, distinct from per-target
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Success,
    /// The build ran but reported errors, e.g. a broken build file.
    BuildError,
}

/// Raw result of one builder invocation: produced artifacts, targets whose
/// build failed, and the overall status. Immutable once returned.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub artifacts: Vec<BuildArtifact>,
    pub targets_with_errors: BTreeSet<Label>,
    pub status: BuildStatus,
}

impl BuildResult {
    pub fn empty() -> Self {
        Self {
            artifacts: Vec::new(),
            targets_with_errors: BTreeSet::new(),
            status: BuildStatus::Success,
        }
    }

    /// True when the build produced nothing at all: no artifacts and no
    /// per-target errors. Such a result is unusable and aborts the request.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty() && self.targets_with_errors.is_empty()
    }

    /// Artifacts grouped by owning target.
    pub fn artifacts_by_target(&self) -> BTreeMap<Label, Vec<&BuildArtifact>> {
        let mut by_target: BTreeMap<Label, Vec<&BuildArtifact>> = BTreeMap::new();
        for artifact in &self.artifacts {
            by_target
                .entry(artifact.target.clone())
                .or_default()
                .push(artifact);
        }
        by_target
    }
}
