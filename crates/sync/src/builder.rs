use async_trait::async_trait;
use scopesync_cache::BuildResult;
use scopesync_core::{Label, SyncContext, SyncError};
use scopesync_graph::LanguageClass;
use std::collections::BTreeSet;

/// Seam to the external build tool.
///
/// Implementations invoke the build (possibly a minutes-long external
/// process) for the given target set and return the raw result. A failure to
/// run the build at all is returned as [`SyncError::BuildExecution`];
/// individual targets failing to build belong in the result's
/// `targets_with_errors`, not here.
#[async_trait]
pub trait DependencyBuilder: Send + Sync {
    async fn build(
        &self,
        context: &SyncContext,
        targets: &BTreeSet<Label>,
        languages: &BTreeSet<LanguageClass>,
    ) -> Result<BuildResult, SyncError>;
}
