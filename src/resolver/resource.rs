use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::resolver::repository::Repository;

/// Where a resolved artifact came from
#[derive(Clone)]
pub enum ResourceSource {
    /// Served from the local cache; the supplying repository is unknown
    Cache,
    /// Freshly fetched from this repository
    Repository(Arc<dyn Repository>),
}

impl fmt::Debug for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceSource::Cache => f.write_str("Cache"),
            ResourceSource::Repository(repository) => {
                f.debug_tuple("Repository").field(&repository.id()).finish()
            }
        }
    }
}

/// An artifact available on the local file system
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    path: PathBuf,
    source: ResourceSource,
}

impl ResolvedResource {
    pub fn from_cache(path: PathBuf) -> Self {
        Self {
            path,
            source: ResourceSource::Cache,
        }
    }

    pub fn from_repository(path: PathBuf, repository: Arc<dyn Repository>) -> Self {
        Self {
            path,
            source: ResourceSource::Repository(repository),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &ResourceSource {
        &self.source
    }

    /// The repository that supplied the artifact, if known
    pub fn source_repository(&self) -> Option<&Arc<dyn Repository>> {
        match &self.source {
            ResourceSource::Cache => None,
            ResourceSource::Repository(repository) => Some(repository),
        }
    }
}
