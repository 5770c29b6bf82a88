pub mod graph;
pub mod project;
pub mod snapshot;

pub use graph::{BuildGraph, BuildGraphBuilder, LanguageClass, RequestedTargets, TargetNode};
pub use project::{PathResolver, ProjectDefinition};
pub use snapshot::{Snapshot, SnapshotHolder};
