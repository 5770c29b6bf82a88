use crate::project::ProjectDefinition;
use scopesync_core::Label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Coarse language classification of a target, passed to the builder so it
/// can pick the right output groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LanguageClass {
    Jvm,
    Cc,
    Python,
    Generic,
}

/// One target in the dependency graph: its direct deps and language tag.
#[derive(Debug, Clone)]
pub struct TargetNode {
    pub label: Label,
    pub deps: BTreeSet<Label>,
    pub language: LanguageClass,
}

/// The resolution of a build request: what to hand to the builder, and which
/// targets' outputs we expect back from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedTargets {
    pub build_targets: BTreeSet<Label>,
    pub expected_dependency_targets: BTreeSet<Label>,
}

/// Immutable directed graph over build targets.
///
/// Built once per sync and shared read-only through the owning snapshot; all
/// queries are pure and safe for concurrent use.
#[derive(Debug, Default)]
pub struct BuildGraph {
    nodes: BTreeMap<Label, TargetNode>,
    /// Workspace-relative source file -> targets that own it.
    source_owners: BTreeMap<PathBuf, BTreeSet<Label>>,
}

impl BuildGraph {
    pub fn builder() -> BuildGraphBuilder {
        BuildGraphBuilder::default()
    }

    pub fn get(&self, label: &Label) -> Option<&TargetNode> {
        self.nodes.get(label)
    }

    pub fn all_targets(&self) -> BTreeSet<Label> {
        self.nodes.keys().cloned().collect()
    }

    /// Targets that own a workspace-relative source file. `None` when the
    /// file is unknown to the graph.
    pub fn target_owners(&self, workspace_relative: &Path) -> Option<&BTreeSet<Label>> {
        self.source_owners.get(workspace_relative)
    }

    /// The transitive dependencies of `target` that lie outside project
    /// scope.
    ///
    /// Traversal descends through in-project nodes only: once an edge crosses
    /// the project boundary the external target is recorded and not expanded,
    /// since building it builds whatever it statically needs.
    pub fn external_deps_to_build_for(
        &self,
        project: &ProjectDefinition,
        target: &Label,
    ) -> BTreeSet<Label> {
        let mut external = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![target.clone()];
        while let Some(label) = stack.pop() {
            if !visited.insert(label.clone()) {
                continue;
            }
            let Some(node) = self.nodes.get(&label) else {
                continue;
            };
            for dep in &node.deps {
                if project.is_included(dep) {
                    stack.push(dep.clone());
                } else {
                    external.insert(dep.clone());
                }
            }
        }
        external
    }

    /// External dependencies of the whole project scope.
    pub fn project_deps(&self, project: &ProjectDefinition) -> BTreeSet<Label> {
        let mut deps = BTreeSet::new();
        for label in self.nodes.keys() {
            if project.is_included(label) {
                deps.extend(self.external_deps_to_build_for(project, label));
            }
        }
        deps
    }

    /// Expands a requested target set into the set passed to the builder plus
    /// the set whose outputs are expected back. `None` when the request
    /// resolves to nothing.
    pub fn compute_requested_targets(
        &self,
        project: &ProjectDefinition,
        targets: &BTreeSet<Label>,
    ) -> Option<RequestedTargets> {
        if targets.is_empty() {
            return None;
        }
        let expected: BTreeSet<Label> = targets
            .iter()
            .flat_map(|target| self.external_deps_to_build_for(project, target))
            .collect();
        Some(RequestedTargets {
            build_targets: targets.clone(),
            expected_dependency_targets: expected,
        })
    }

    /// Language hints for a target set, for the builder's output-group
    /// selection. Unknown targets contribute nothing.
    pub fn target_languages(&self, targets: &BTreeSet<Label>) -> BTreeSet<LanguageClass> {
        targets
            .iter()
            .filter_map(|label| self.nodes.get(label))
            .map(|node| node.language)
            .collect()
    }
}

#[derive(Default)]
pub struct BuildGraphBuilder {
    nodes: BTreeMap<Label, TargetNode>,
    source_owners: BTreeMap<PathBuf, BTreeSet<Label>>,
}

impl BuildGraphBuilder {
    pub fn target(
        mut self,
        label: impl Into<Label>,
        language: LanguageClass,
        deps: impl IntoIterator<Item = impl Into<Label>>,
    ) -> Self {
        let label = label.into();
        self.nodes.insert(
            label.clone(),
            TargetNode {
                label,
                deps: deps.into_iter().map(Into::into).collect(),
                language,
            },
        );
        self
    }

    pub fn source(mut self, workspace_relative: impl Into<PathBuf>, owner: impl Into<Label>) -> Self {
        self.source_owners
            .entry(workspace_relative.into())
            .or_default()
            .insert(owner.into());
        self
    }

    pub fn build(self) -> BuildGraph {
        BuildGraph {
            nodes: self.nodes,
            source_owners: self.source_owners,
        }
    }
}
