use crate::model::ProjectModelBuilder;
use crate::pipeline::ModelUpdateOperation;
use anyhow::{Context as _, Result};
use scopesync_cache::{ArtifactKind, ArtifactTracker};
use scopesync_graph::ProjectDefinition;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Attaches checked-in source archives of external dependencies, giving
/// navigation into dependency sources. Only assembled into the pipeline when
/// the attach-deps-srcjars flag is on.
pub struct AddDependencySourceArchives {
    artifacts: Arc<ArtifactTracker>,
    project: Arc<ProjectDefinition>,
}

impl AddDependencySourceArchives {
    pub fn new(artifacts: Arc<ArtifactTracker>, project: Arc<ProjectDefinition>) -> Self {
        Self { artifacts, project }
    }
}

impl ModelUpdateOperation for AddDependencySourceArchives {
    fn name(&self) -> &'static str {
        "AddDependencySourceArchives"
    }

    fn apply(&self, builder: &mut ProjectModelBuilder) -> Result<()> {
        let store = self.artifacts.store();
        let mut archives = BTreeSet::new();
        for (target, state) in self.artifacts.built_deps() {
            if self.project.is_included(&target) {
                continue;
            }
            for (_, digest) in state.files_of_kind(ArtifactKind::SourceArchive) {
                let path = store
                    .get(digest)
                    .with_context(|| format!("missing dependency source archive for {target}"))?;
                archives.insert(path);
            }
        }
        builder.set_dependency_source_archives(archives);
        Ok(())
    }
}
