use thiserror::Error;

/// Errors that abort a dependency build request.
///
/// Per-target build failures are deliberately not represented here: they are
/// reported through the [`crate::SyncContext`] and never fail the request.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The external builder itself could not run or crashed. Nothing was
    /// merged into the cache.
    #[error("build execution failed: {0}")]
    BuildExecution(String),

    /// The builder ran but produced no usable artifacts. Raised before any
    /// cache mutation.
    #[error(
        "Build produced no usable outputs. Please fix any build errors and retry. If you \
         observe 'no such target' errors, your project may be out of sync. Please sync \
         the project and retry."
    )]
    NoUsableOutput,

    /// An internal operation required a project snapshot before the first
    /// sync completed.
    #[error("sync is not yet complete")]
    SyncNotComplete,

    /// The request was cancelled before its results were merged.
    #[error("build request cancelled")]
    Cancelled,

    /// A requested path was outside the workspace or otherwise unusable.
    #[error("invalid workspace path: {0}")]
    InvalidPath(String),
}
