use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StalenessError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A fetch that failed, attributed to the repository it was sent to
#[derive(Debug, Error)]
#[error("{repository_id}: {error}")]
pub struct RepositoryFailure {
    pub repository_id: String,
    #[source]
    pub error: RepositoryError,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Waited more than {waited:?} to acquire lock on {path:?}")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("There is already a repository with the id {0:?} registered")]
    DuplicateRepository(String),

    #[error("Resolver has no repository it can fetch {path:?} from")]
    NoUsableRepository { path: String },

    #[error(
        "All {} repositories failed to provide {path:?}; first failure: {}",
        .failures.len(),
        .failures.first().map(ToString::to_string).unwrap_or_default()
    )]
    AllSourcesFailed {
        path: String,
        failures: Vec<RepositoryFailure>,
    },

    #[error("Cache root {0:?} exists but is not a directory")]
    CacheRootNotDirectory(PathBuf),

    #[error("Invalid artifact path {0:?}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Staleness record error: {0}")]
    Staleness(#[from] StalenessError),
}
