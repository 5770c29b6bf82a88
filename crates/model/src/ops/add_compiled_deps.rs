use crate::model::ProjectModelBuilder;
use crate::pipeline::ModelUpdateOperation;
use anyhow::{Context as _, Result};
use scopesync_cache::{ArtifactKind, ArtifactTracker};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Attaches every cached compiled archive to the shared dependencies
/// library section, across all built targets.
pub struct AddCompiledDeps {
    artifacts: Arc<ArtifactTracker>,
}

impl AddCompiledDeps {
    pub fn new(artifacts: Arc<ArtifactTracker>) -> Self {
        Self { artifacts }
    }
}

impl ModelUpdateOperation for AddCompiledDeps {
    fn name(&self) -> &'static str {
        "AddCompiledDeps"
    }

    fn apply(&self, builder: &mut ProjectModelBuilder) -> Result<()> {
        let store = self.artifacts.store();
        let mut jars = BTreeSet::new();
        for (target, state) in self.artifacts.built_deps() {
            for (_, digest) in state.files_of_kind(ArtifactKind::CompiledArchive) {
                let path: PathBuf = store
                    .get(digest)
                    .with_context(|| format!("missing compiled archive for {target}"))?;
                jars.insert(path);
            }
        }
        builder.set_compiled_deps(jars);
        Ok(())
    }
}
