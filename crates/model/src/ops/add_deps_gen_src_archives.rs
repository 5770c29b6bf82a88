use crate::model::ProjectModelBuilder;
use crate::pipeline::ModelUpdateOperation;
use anyhow::{Context as _, Result};
use scopesync_cache::{ArtifactKind, ArtifactTracker};
use scopesync_graph::ProjectDefinition;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Attaches archives of generated sources of external dependencies. Only
/// assembled into the pipeline when the attach-deps-srcjars flag is on,
/// alongside [`super::AddDependencySourceArchives`].
pub struct AddDependencyGeneratedSourceArchives {
    artifacts: Arc<ArtifactTracker>,
    project: Arc<ProjectDefinition>,
}

impl AddDependencyGeneratedSourceArchives {
    pub fn new(artifacts: Arc<ArtifactTracker>, project: Arc<ProjectDefinition>) -> Self {
        Self { artifacts, project }
    }
}

impl ModelUpdateOperation for AddDependencyGeneratedSourceArchives {
    fn name(&self) -> &'static str {
        "AddDependencyGeneratedSourceArchives"
    }

    fn apply(&self, builder: &mut ProjectModelBuilder) -> Result<()> {
        let store = self.artifacts.store();
        let mut archives = BTreeSet::new();
        for (target, state) in self.artifacts.built_deps() {
            if self.project.is_included(&target) {
                continue;
            }
            for (_, digest) in state.files_of_kind(ArtifactKind::GeneratedSourceArchive) {
                let path = store.get(digest).with_context(|| {
                    format!("missing dependency generated source archive for {target}")
                })?;
                archives.insert(path);
            }
        }
        builder.set_dependency_generated_source_archives(archives);
        Ok(())
    }
}
