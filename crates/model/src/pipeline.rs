use crate::model::{ProjectModel, ProjectModelBuilder};
use crate::ops::{
    AddCompiledDeps, AddDependencyGeneratedSourceArchives, AddDependencySourceArchives,
    AddGeneratedSourceArchives, AddGeneratedSourceRoots,
};
use anyhow::{Context as _, Result};
use scopesync_cache::ArtifactTracker;
use scopesync_core::SyncConfig;
use scopesync_graph::ProjectDefinition;
use std::sync::Arc;
use tracing::{debug, info};

/// One step of the model update pipeline. Each operation reads current
/// artifact tracker state and writes its own named section of the model
/// builder.
pub trait ModelUpdateOperation: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, builder: &mut ProjectModelBuilder) -> Result<()>;
}

/// Ordered, fixed pipeline that re-derives the project model from current
/// cache contents.
///
/// The operation list is assembled once from static configuration plus
/// feature flags and never reordered: later operations may read sections
/// written by earlier ones. Every run is a full recompute, so re-running
/// against unchanged tracker state yields an identical model.
pub struct ModelUpdater {
    operations: Vec<Box<dyn ModelUpdateOperation>>,
}

impl ModelUpdater {
    pub fn new(
        artifacts: Arc<ArtifactTracker>,
        project: Arc<ProjectDefinition>,
        config: &SyncConfig,
    ) -> Self {
        let mut operations: Vec<Box<dyn ModelUpdateOperation>> = vec![
            Box::new(AddCompiledDeps::new(artifacts.clone())),
            Box::new(AddGeneratedSourceRoots::new(
                artifacts.clone(),
                project.clone(),
            )),
            Box::new(AddGeneratedSourceArchives::new(
                artifacts.clone(),
                project.clone(),
            )),
        ];
        if config.attach_deps_srcjars {
            operations.push(Box::new(AddDependencySourceArchives::new(
                artifacts.clone(),
                project.clone(),
            )));
            operations.push(Box::new(AddDependencyGeneratedSourceArchives::new(
                artifacts, project,
            )));
        }
        Self { operations }
    }

    pub fn operation_names(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name()).collect()
    }

    /// Run every operation top-to-bottom on a fresh builder and return the
    /// derived model.
    pub fn derive_model(&self) -> Result<ProjectModel> {
        let mut builder = ProjectModelBuilder::new();
        for operation in &self.operations {
            debug!(operation = operation.name(), "Applying model update operation");
            operation
                .apply(&mut builder)
                .with_context(|| format!("model update operation {} failed", operation.name()))?;
        }
        let model = builder.build();
        info!(
            compiled_deps = model.compiled_deps.len(),
            generated_source_roots = model.generated_source_roots.len(),
            "Derived project model"
        );
        Ok(model)
    }
}
