use std::path::PathBuf;

use thiserror::Error;

/// The repository could not be materialized. The only error class that is
/// fatal to a run; the caller retries a bounded number of times first.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("repository path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("repository path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to clone {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to prepare a working directory: {0}")]
    Workdir(#[from] std::io::Error),
}

/// The classifier adapter failed or timed out. Degraded to zero predictions
/// for the affected import, never fatal.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}
