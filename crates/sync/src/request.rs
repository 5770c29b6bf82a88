use scopesync_core::Label;
use scopesync_graph::{RequestedTargets, Snapshot};
use std::collections::BTreeSet;

/// What a caller wants built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildRequest {
    /// Build the external dependencies of these project targets, following
    /// graph closure rules.
    Targets(BTreeSet<Label>),
    /// Build exactly this target, verbatim, expecting its own outputs back.
    SingleTarget(Label),
    /// Build the external dependencies of the whole project scope.
    WholeProject,
}

impl BuildRequest {
    pub fn targets(targets: impl IntoIterator<Item = impl Into<Label>>) -> Self {
        Self::Targets(targets.into_iter().map(Into::into).collect())
    }

    pub fn single(target: impl Into<Label>) -> Self {
        Self::SingleTarget(target.into())
    }

    /// Resolve to the concrete `(build, expected)` target pair, or `None`
    /// when there is nothing to build.
    pub fn resolve(&self, snapshot: &Snapshot) -> Option<RequestedTargets> {
        match self {
            Self::Targets(targets) => snapshot.compute_requested_targets(targets),
            Self::SingleTarget(target) => {
                let set: BTreeSet<Label> = [target.clone()].into();
                Some(RequestedTargets {
                    build_targets: set.clone(),
                    expected_dependency_targets: set,
                })
            }
            Self::WholeProject => Some(RequestedTargets {
                build_targets: snapshot.graph().all_targets(),
                expected_dependency_targets: snapshot.project_deps(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopesync_graph::{BuildGraph, LanguageClass, ProjectDefinition};
    use std::sync::Arc;

    fn snapshot() -> Snapshot {
        let graph = BuildGraph::builder()
            .target("//app:main", LanguageClass::Jvm, ["//ext:dep"])
            .target("//ext:dep", LanguageClass::Jvm, Vec::<Label>::new())
            .build();
        Snapshot::new(
            Arc::new(graph),
            Arc::new(ProjectDefinition::new(["app"], Vec::<&str>::new())),
            1,
        )
    }

    #[test]
    fn test_empty_target_request_resolves_to_nothing() {
        assert_eq!(BuildRequest::Targets(BTreeSet::new()).resolve(&snapshot()), None);
    }

    #[test]
    fn test_single_target_is_verbatim() {
        let resolved = BuildRequest::single("//ext:dep").resolve(&snapshot()).unwrap();
        assert_eq!(resolved.build_targets, [Label::new("//ext:dep")].into());
        assert_eq!(
            resolved.expected_dependency_targets,
            [Label::new("//ext:dep")].into()
        );
    }

    #[test]
    fn test_whole_project_expects_project_deps() {
        let resolved = BuildRequest::WholeProject.resolve(&snapshot()).unwrap();
        assert!(resolved.build_targets.contains(&Label::new("//app:main")));
        assert_eq!(
            resolved.expected_dependency_targets,
            [Label::new("//ext:dep")].into()
        );
    }
}
