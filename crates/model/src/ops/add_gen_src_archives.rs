use crate::model::ProjectModelBuilder;
use crate::pipeline::ModelUpdateOperation;
use anyhow::{Context as _, Result};
use scopesync_cache::{ArtifactKind, ArtifactTracker};
use scopesync_graph::ProjectDefinition;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Attaches generated-source archives produced by in-project targets.
pub struct AddGeneratedSourceArchives {
    artifacts: Arc<ArtifactTracker>,
    project: Arc<ProjectDefinition>,
}

impl AddGeneratedSourceArchives {
    pub fn new(artifacts: Arc<ArtifactTracker>, project: Arc<ProjectDefinition>) -> Self {
        Self { artifacts, project }
    }
}

impl ModelUpdateOperation for AddGeneratedSourceArchives {
    fn name(&self) -> &'static str {
        "AddGeneratedSourceArchives"
    }

    fn apply(&self, builder: &mut ProjectModelBuilder) -> Result<()> {
        let store = self.artifacts.store();
        let mut archives = BTreeSet::new();
        for (target, state) in self.artifacts.built_deps() {
            if !self.project.is_included(&target) {
                continue;
            }
            for (_, digest) in state.files_of_kind(ArtifactKind::GeneratedSourceArchive) {
                let path = store
                    .get(digest)
                    .with_context(|| format!("missing generated source archive for {target}"))?;
                archives.insert(path);
            }
        }
        builder.set_generated_source_archives(archives);
        Ok(())
    }
}
