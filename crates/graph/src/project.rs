use scopesync_core::Label;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Decides which part of the workspace is loaded for full analysis.
///
/// A label or path is in project scope when it falls under one of the include
/// roots and under none of the exclude roots. Definitions are immutable and
/// supplied by the sync layer that loaded the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDefinition {
    include: Vec<PathBuf>,
    exclude: Vec<PathBuf>,
}

impl ProjectDefinition {
    pub fn new(
        include: impl IntoIterator<Item = impl Into<PathBuf>>,
        exclude: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_included_path(&self, path: &Path) -> bool {
        let covered = |roots: &[PathBuf]| roots.iter().any(|root| path.starts_with(root));
        covered(&self.include) && !covered(&self.exclude)
    }

    pub fn is_included(&self, label: &Label) -> bool {
        self.is_included_path(Path::new(label.package()))
    }
}

/// Maps workspace-relative paths to absolute filesystem paths and back.
#[derive(Debug, Clone)]
pub struct PathResolver {
    workspace_root: PathBuf,
}

impl PathResolver {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn resolve(&self, workspace_relative: &Path) -> PathBuf {
        self.workspace_root.join(workspace_relative)
    }

    /// Returns the workspace-relative form of `path`, or `None` when the path
    /// lies outside the workspace.
    pub fn relativize(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.workspace_root)
            .ok()
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_exclude() {
        let project = ProjectDefinition::new(["java/com/app"], ["java/com/app/experimental"]);
        assert!(project.is_included(&Label::new("//java/com/app:lib")));
        assert!(project.is_included(&Label::new("//java/com/app/ui:ui")));
        assert!(!project.is_included(&Label::new("//java/com/app/experimental:x")));
        assert!(!project.is_included(&Label::new("//third_party/guava:guava")));
    }

    #[test]
    fn test_resolver_round_trip() {
        let resolver = PathResolver::new("/workspace");
        let absolute = resolver.resolve(Path::new("java/com/app/App.java"));
        assert_eq!(absolute, PathBuf::from("/workspace/java/com/app/App.java"));
        assert_eq!(
            resolver.relativize(&absolute),
            Some(PathBuf::from("java/com/app/App.java"))
        );
        assert_eq!(resolver.relativize(Path::new("/elsewhere/x")), None);
    }
}
