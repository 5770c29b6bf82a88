pub mod config;
pub mod context;
pub mod error;
pub mod label;

pub use config::SyncConfig;
pub use context::{CollectingSink, Message, MessageLevel, OutputSink, SyncContext};
pub use error::SyncError;
pub use label::Label;
