//! Directory-backed repository
//!
//! Serves artifacts from another Maven-layout directory on the local file system,
//! such as a mounted mirror or a second local repository.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::{DEFAULT_UPDATE_INTERVAL_MS, RepositoryConfig};
use crate::resolver::error::RepositoryError;
use crate::resolver::repository::Repository;

/// Repository implementation for a Maven-layout directory
#[derive(Debug, Clone)]
pub struct LocalRepository {
    id: String,
    root: PathBuf,
    url: String,
    update_interval: Duration,
}

impl LocalRepository {
    /// Creates a LocalRepository rooted at `root`. `root` may be given as a
    /// `file://` URL.
    pub fn new(id: &str, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = match root.to_str().and_then(|s| s.strip_prefix("file://")) {
            Some(stripped) => PathBuf::from(stripped),
            None => root.to_path_buf(),
        };
        let url = format!("file://{}", root.display());

        Self {
            id: id.to_string(),
            root,
            url,
            update_interval: Duration::from_millis(DEFAULT_UPDATE_INTERVAL_MS),
        }
    }

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self::new(&config.id, &config.url)
            .with_update_interval(Duration::from_millis(config.update_interval_ms))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl Repository for LocalRepository {
    fn id(&self) -> &str {
        &self.id
    }

    fn plaintext_url(&self) -> &str {
        &self.url
    }

    fn update_interval(&self) -> Duration {
        self.update_interval
    }

    async fn fetch(&self, path: &str) -> Result<PathBuf, RepositoryError> {
        let candidate = self.root.join(path.trim_start_matches('/'));

        match tokio::fs::metadata(&candidate).await {
            Ok(metadata) if metadata.is_file() => {
                debug!("{} found {:?}", self.id, candidate);
                Ok(candidate)
            }
            Ok(_) => Err(RepositoryError::NotFound(path.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(RepositoryError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
