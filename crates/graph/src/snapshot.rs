use crate::graph::{BuildGraph, LanguageClass, RequestedTargets};
use crate::project::ProjectDefinition;
use scopesync_core::Label;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

/// One immutable, fully-consistent view of the dependency graph and project
/// definition, produced by a sync.
#[derive(Debug)]
pub struct Snapshot {
    graph: Arc<BuildGraph>,
    project: Arc<ProjectDefinition>,
    /// Identifier of the sync that produced this snapshot, for logs.
    sync_id: u64,
}

impl Snapshot {
    pub fn new(graph: Arc<BuildGraph>, project: Arc<ProjectDefinition>, sync_id: u64) -> Self {
        Self {
            graph,
            project,
            sync_id,
        }
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    pub fn project(&self) -> &ProjectDefinition {
        &self.project
    }

    pub fn sync_id(&self) -> u64 {
        self.sync_id
    }

    pub fn external_deps_to_build_for(&self, target: &Label) -> BTreeSet<Label> {
        self.graph.external_deps_to_build_for(&self.project, target)
    }

    pub fn compute_requested_targets(&self, targets: &BTreeSet<Label>) -> Option<RequestedTargets> {
        self.graph.compute_requested_targets(&self.project, targets)
    }

    pub fn project_deps(&self) -> BTreeSet<Label> {
        self.graph.project_deps(&self.project)
    }

    pub fn target_owners(&self, workspace_relative: &Path) -> Option<BTreeSet<Label>> {
        self.graph.target_owners(workspace_relative).cloned()
    }

    pub fn target_languages(&self, targets: &BTreeSet<Label>) -> BTreeSet<LanguageClass> {
        self.graph.target_languages(targets)
    }
}

/// Process-wide slot holding the current snapshot.
///
/// `publish` fully replaces the previous snapshot; readers hold an `Arc` to
/// whichever snapshot was current when they asked and are never exposed to a
/// half-updated view. Empty until the first sync completes.
#[derive(Default)]
pub struct SnapshotHolder {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().unwrap().clone()
    }

    pub fn publish(&self, snapshot: Snapshot) {
        info!(sync_id = snapshot.sync_id, "Publishing project snapshot");
        *self.current.write().unwrap() = Some(Arc::new(snapshot));
    }
}
