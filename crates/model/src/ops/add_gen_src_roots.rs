use crate::model::ProjectModelBuilder;
use crate::pipeline::ModelUpdateOperation;
use anyhow::{Context as _, Result};
use scopesync_cache::{ArtifactKind, ArtifactTracker};
use scopesync_graph::ProjectDefinition;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Registers cached generated sources of in-project targets as source roots,
/// so the editor indexes them alongside checked-in code.
pub struct AddGeneratedSourceRoots {
    artifacts: Arc<ArtifactTracker>,
    project: Arc<ProjectDefinition>,
}

impl AddGeneratedSourceRoots {
    pub fn new(artifacts: Arc<ArtifactTracker>, project: Arc<ProjectDefinition>) -> Self {
        Self { artifacts, project }
    }
}

impl ModelUpdateOperation for AddGeneratedSourceRoots {
    fn name(&self) -> &'static str {
        "AddGeneratedSourceRoots"
    }

    fn apply(&self, builder: &mut ProjectModelBuilder) -> Result<()> {
        let store = self.artifacts.store();
        let mut roots = BTreeSet::new();
        for (target, state) in self.artifacts.built_deps() {
            if !self.project.is_included(&target) {
                continue;
            }
            for (_, digest) in state.files_of_kind(ArtifactKind::GeneratedSource) {
                let path = store
                    .get(digest)
                    .with_context(|| format!("missing generated source for {target}"))?;
                roots.insert(path);
            }
        }
        builder.set_generated_source_roots(roots);
        Ok(())
    }
}
