pub mod model;
pub mod ops;
pub mod pipeline;

pub use model::{ProjectModel, ProjectModelBuilder};
pub use pipeline::{ModelUpdateOperation, ModelUpdater};
