pub mod artifact;
pub mod digest;
pub mod store;
pub mod tracker;

pub use artifact::{ArtifactKind, BuildArtifact, BuildResult, BuildStatus};
pub use digest::Digest;
pub use store::{ArtifactStore, CacheError};
pub use tracker::{ArtifactTracker, TargetState};
