use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// The exported project model: a structured document with named,
/// independently written sections, consumed by the editor for indexing.
///
/// Each section is written wholesale by exactly one pipeline operation; a
/// re-derivation with unchanged cache state yields a byte-identical
/// document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    /// Compiled archives attached as the shared dependencies library.
    pub compiled_deps: BTreeSet<PathBuf>,
    /// Roots containing generated sources of in-project targets.
    pub generated_source_roots: BTreeSet<PathBuf>,
    /// Archives of generated sources of in-project targets.
    pub generated_source_archives: BTreeSet<PathBuf>,
    /// Checked-in source archives of external dependencies, attached only
    /// when the corresponding feature flag is on.
    pub dependency_source_archives: BTreeSet<PathBuf>,
    /// Archives of generated sources of external dependencies, attached only
    /// when the corresponding feature flag is on.
    pub dependency_generated_source_archives: BTreeSet<PathBuf>,
}

impl ProjectModel {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Mutable view of the model during one pipeline pass. Yields an immutable
/// [`ProjectModel`] at the end.
#[derive(Debug, Default)]
pub struct ProjectModelBuilder {
    model: ProjectModel,
}

impl ProjectModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_compiled_deps(&mut self, jars: BTreeSet<PathBuf>) {
        self.model.compiled_deps = jars;
    }

    pub fn set_generated_source_roots(&mut self, roots: BTreeSet<PathBuf>) {
        self.model.generated_source_roots = roots;
    }

    pub fn set_generated_source_archives(&mut self, archives: BTreeSet<PathBuf>) {
        self.model.generated_source_archives = archives;
    }

    pub fn set_dependency_source_archives(&mut self, archives: BTreeSet<PathBuf>) {
        self.model.dependency_source_archives = archives;
    }

    pub fn set_dependency_generated_source_archives(&mut self, archives: BTreeSet<PathBuf>) {
        self.model.dependency_generated_source_archives = archives;
    }

    /// Read access for later pipeline stages; they may depend on sections
    /// already written, never on sections still to come.
    pub fn current(&self) -> &ProjectModel {
        &self.model
    }

    pub fn build(self) -> ProjectModel {
        self.model
    }
}
