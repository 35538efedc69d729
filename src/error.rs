use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfilerError>;

/// Everything that can go wrong inside the profiler.
///
/// Capture-side failures (`Storage`) are logged and swallowed by the
/// middleware so they never affect the instrumented response. Read-side
/// failures (`Corruption`, `Validation`, `Io`) surface to the reporting
/// endpoints, which render the message alongside an empty result set.
#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("profiler is only available in development")]
    Disabled,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("failed to parse {path}: {message}")]
    Corruption { path: String, message: String },
    #[error("invalid page slug: {0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
