use crate::builder::DependencyBuilder;
use crate::request::BuildRequest;
use anyhow::Result;
use scopesync_cache::{ArtifactTracker, BuildResult, BuildStatus, CacheError};
use scopesync_core::{Label, Message, MessageLevel, SyncConfig, SyncContext, SyncError};
use scopesync_graph::{RequestedTargets, Snapshot, SnapshotHolder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        plural.to_string()
    }
}

/// Tracks which project targets can be analyzed and drives builds of their
/// missing external dependencies.
///
/// Safe to share across concurrent requests: snapshot reads are immutable,
/// and all cache mutation goes through the artifact tracker's merge.
pub struct DependencyTracker {
    snapshots: Arc<SnapshotHolder>,
    builder: Arc<dyn DependencyBuilder>,
    artifacts: Arc<ArtifactTracker>,
    config: SyncConfig,
}

impl DependencyTracker {
    pub fn new(
        snapshots: Arc<SnapshotHolder>,
        builder: Arc<dyn DependencyBuilder>,
        artifacts: Arc<ArtifactTracker>,
        config: SyncConfig,
    ) -> Self {
        Self {
            snapshots,
            builder,
            artifacts,
            config,
        }
    }

    pub fn artifacts(&self) -> &Arc<ArtifactTracker> {
        &self.artifacts
    }

    /// Pending external dependencies for a set of analysis-equivalent
    /// targets.
    ///
    /// Invariant: among the per-target pending sets this returns the
    /// SMALLEST one, not the union. If dependencies have been built for any
    /// one candidate, the empty set is returned even though other candidates
    /// may still have pending dependencies; the caller can proceed with the
    /// satisfied candidate. Empty when no snapshot has been published.
    pub fn pending_external_deps(&self, targets: &BTreeSet<Label>) -> BTreeSet<Label> {
        let Some(snapshot) = self.snapshots.current() else {
            return BTreeSet::new();
        };
        let cached = self.artifacts.live_cached_targets();
        targets
            .iter()
            .map(|target| {
                let deps = snapshot.external_deps_to_build_for(target);
                deps.difference(&cached).cloned().collect::<BTreeSet<_>>()
            })
            .min_by_key(|pending| pending.len())
            .unwrap_or_default()
    }

    /// Pending external dependencies for the targets owning a
    /// workspace-relative source file. Empty when the file has no owner or
    /// no snapshot exists.
    pub fn pending_targets(&self, workspace_relative: &Path) -> Result<BTreeSet<Label>, SyncError> {
        if workspace_relative.is_absolute() {
            return Err(SyncError::InvalidPath(
                workspace_relative.display().to_string(),
            ));
        }
        let Some(snapshot) = self.snapshots.current() else {
            return Ok(BTreeSet::new());
        };
        let Some(owners) = snapshot.target_owners(workspace_relative) else {
            return Ok(BTreeSet::new());
        };
        Ok(self.pending_external_deps(&owners))
    }

    /// Local cache files built for a target; `None` if it has never been
    /// built.
    pub fn cached_artifacts(&self, target: &Label) -> Option<BTreeSet<PathBuf>> {
        self.artifacts.cached_files(target)
    }

    /// Build the external dependencies for a request and merge the produced
    /// artifacts into the cache.
    ///
    /// Returns `Ok(false)` without invoking the builder when the request
    /// resolves to nothing. Fails only on builder-execution errors, unusable
    /// (empty) output, or cancellation; per-target build failures are
    /// reported through the context and do not block merging what succeeded.
    pub async fn build_dependencies_for_targets(
        &self,
        context: &SyncContext,
        request: BuildRequest,
    ) -> Result<bool> {
        let snapshot = self.snapshots.current().ok_or(SyncError::SyncNotComplete)?;

        let Some(requested) = request.resolve(&snapshot) else {
            debug!("Build request resolved to nothing, skipping builder");
            return Ok(false);
        };

        self.build_dependencies(context, &snapshot, &requested)
            .await?;
        Ok(true)
    }

    async fn build_dependencies(
        &self,
        context: &SyncContext,
        snapshot: &Snapshot,
        requested: &RequestedTargets,
    ) -> Result<()> {
        info!(
            build_targets = requested.build_targets.len(),
            expected = requested.expected_dependency_targets.len(),
            "Building external dependencies"
        );
        let languages = snapshot.target_languages(&requested.build_targets);
        let result = self
            .builder
            .build(context, &requested.build_targets, &languages)
            .await?;

        self.report_errors_and_warnings(context, snapshot, &result)?;

        let updated = self
            .artifacts
            .update(&requested.expected_dependency_targets, &result, context)
            .map_err(|e| match e {
                CacheError::Cancelled => anyhow::Error::new(SyncError::Cancelled),
                other => anyhow::Error::new(other),
            })?;
        info!(updated = updated.len(), "Dependency build complete");
        Ok(())
    }

    /// Summarize per-target failures without failing the request. Raises
    /// only when the build produced nothing usable; that is fatal and
    /// happens before any cache mutation.
    fn report_errors_and_warnings(
        &self,
        context: &SyncContext,
        snapshot: &Snapshot,
        result: &BuildResult,
    ) -> Result<(), SyncError> {
        if result.is_empty() {
            return Err(SyncError::NoUsableOutput);
        }

        if !result.targets_with_errors.is_empty() {
            context.set_has_warnings();
            let project = snapshot.project();
            let (in_project, external): (Vec<&Label>, Vec<&Label>) = result
                .targets_with_errors
                .iter()
                .partition(|target| project.is_included(target));

            self.report_error_group(
                context,
                &external,
                &format!("external {}", pluralize(external.len(), "dependency", "dependencies")),
                MessageLevel::Error,
            );
            self.report_error_group(
                context,
                &in_project,
                &format!("project {}", pluralize(in_project.len(), "target", "targets")),
                MessageLevel::Info,
            );
        } else if result.status != BuildStatus::Success {
            // An error in a build file means no build actions were attempted
            // for the affected targets, so nothing shows up per-target.
            context.set_has_warnings();
            context.output(Message::error("There were build errors."));
        }

        if context.has_warnings() {
            context.output(Message::error(
                "Your dependencies may be incomplete. If you see unresolved symbols, please fix \
                 the above build errors and try again.",
            ));
        }
        Ok(())
    }

    fn report_error_group(
        &self,
        context: &SyncContext,
        targets: &[&Label],
        description: &str,
        level: MessageLevel,
    ) {
        if targets.is_empty() {
            return;
        }
        let cap = self.config.error_preview_cap;
        let preview = targets
            .iter()
            .take(cap)
            .map(|target| target.to_string())
            .collect::<Vec<_>>()
            .join("\n  ");
        context.output(Message {
            level,
            text: format!(
                "{} {} had build errors: \n  {}",
                targets.len(),
                description,
                preview
            ),
        });
        if targets.len() > cap {
            context.output(Message::info(format!("and {} more.", targets.len() - cap)));
        }
    }
}
