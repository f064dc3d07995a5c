//! Repository trait for fetching artifacts from remote sources

use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::error::RepositoryError;

/// A source of artifacts the negotiator can fetch from
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// Unique id of the repository. Two repositories with the same id cannot be
    /// registered with one negotiator.
    fn id(&self) -> &str;

    /// Plaintext URL of the repository, used as the staleness-tracking key
    fn plaintext_url(&self) -> &str;

    /// Minimum time between two fetches of the same artifact from this repository
    fn update_interval(&self) -> Duration;

    /// Fetches an artifact
    ///
    /// # Arguments
    /// * `path` - Repository path of the artifact (e.g., "org/example/lib/1.0/lib-1.0.jar")
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Local path holding the fetched bytes
    /// * `Err(RepositoryError)` - If the fetch fails
    async fn fetch(&self, path: &str) -> Result<PathBuf, RepositoryError>;
}
