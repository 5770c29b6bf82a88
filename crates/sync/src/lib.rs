pub mod builder;
pub mod disambiguate;
pub mod request;
pub mod tracker;

pub use builder::DependencyBuilder;
pub use disambiguate::{TargetDisambiguator, TargetsToBuild};
pub use request::BuildRequest;
pub use tracker::DependencyTracker;
