//! Cache negotiation: decides whether the locally cached copy of an artifact can
//! be used or which repositories must be asked for a fresh one.
//!
//! One `resolve` call runs the following protocol:
//!
//! 1. acquire the lock on the artifact's directory,
//! 2. load the `<artifact>.lastUpdated` staleness record,
//! 3. queue a fetch from every repository whose update interval has elapsed and
//!    stamp it as fetched right away, then persist the record,
//! 4. race the queued fetches; the first success is copied into the cache,
//! 5. release the lock.
//!
//! Timestamps are stamped before the fetches complete, so a crash mid-fetch still
//! counts as a fetch attempt and retries do not storm the repositories.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::{LAST_UPDATED_SUFFIX, LOCK_FILE_NAME, LockConfig};
use crate::resolver::clock::{Clock, SystemClock};
use crate::resolver::error::{RepositoryError, RepositoryFailure, ResolveError};
use crate::resolver::files::replacement_file_in;
use crate::resolver::first_success::{FirstSuccessError, first_success};
use crate::resolver::lock::DirectoryLock;
use crate::resolver::repository::Repository;
use crate::resolver::resource::ResolvedResource;
use crate::resolver::staleness::StalenessRecord;

type FetchOutcome = Result<(Arc<dyn Repository>, PathBuf), RepositoryFailure>;

/// Resolves artifact paths against a local cache and a set of repositories
pub struct CacheNegotiator {
    cache_root: PathBuf,
    repository_ids: HashSet<String>,
    repositories: Vec<Arc<dyn Repository>>,
    lock_config: LockConfig,
    clock: Arc<dyn Clock>,
}

impl CacheNegotiator {
    /// Creates a negotiator with the default lock policy and the system clock
    pub fn new(cache_root: impl Into<PathBuf>) -> Result<Self, ResolveError> {
        Self::with_config(cache_root, LockConfig::default(), Arc::new(SystemClock))
    }

    /// Creates a negotiator, creating `cache_root` if it does not exist yet.
    ///
    /// Fails if `cache_root` exists but is not a directory.
    pub fn with_config(
        cache_root: impl Into<PathBuf>,
        lock_config: LockConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ResolveError> {
        let cache_root = cache_root.into();
        if !cache_root.is_dir() {
            if cache_root.exists() {
                return Err(ResolveError::CacheRootNotDirectory(cache_root));
            }
            info!("Creating cache root {:?}", cache_root);
            std::fs::create_dir_all(&cache_root)?;
        }

        Ok(Self {
            cache_root,
            repository_ids: HashSet::new(),
            repositories: Vec::new(),
            lock_config,
            clock,
        })
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Registered repositories in registration order
    pub fn repositories(&self) -> &[Arc<dyn Repository>] {
        &self.repositories
    }

    /// Registers a repository. Registration order is the order fetches are
    /// started in; it does not give any repository priority.
    pub fn add_repository(
        &mut self,
        repository: Arc<dyn Repository>,
    ) -> Result<&mut Self, ResolveError> {
        if !self.repository_ids.insert(repository.id().to_string()) {
            return Err(ResolveError::DuplicateRepository(
                repository.id().to_string(),
            ));
        }
        debug!(
            "Registered repository {} ({})",
            repository.id(),
            repository.plaintext_url()
        );
        self.repositories.push(repository);
        Ok(self)
    }

    /// Resolves `path` to a file inside the cache, fetching it when the cached
    /// copy is stale for at least one repository.
    ///
    /// Fetches run as tasks on `executor`. The directory lock is held until the
    /// returned future completes and is released on every exit path, including
    /// when the future is dropped early.
    pub async fn resolve(
        &self,
        path: &str,
        executor: &Handle,
    ) -> Result<ResolvedResource, ResolveError> {
        let local_file = self.artifact_path(path)?;
        let sidecar = sidecar_path(&local_file);

        let lock = DirectoryLock::for_artifact(&local_file, &self.lock_config);
        let guard = lock.acquire().await?;

        let mut record = StalenessRecord::load(&sidecar)?;
        let now = self.clock.now_millis();

        let mut fetches = Vec::new();
        for repository in &self.repositories {
            let url = repository.plaintext_url();
            let last_fetched = record.last_fetch_time(url);
            if !is_stale(last_fetched, now, repository.update_interval()) {
                debug!(
                    "{} is fresh for {} (last fetched at {:?})",
                    path,
                    repository.id(),
                    last_fetched
                );
                continue;
            }

            debug!("Queuing fetch of {} from {}", path, repository.id());
            fetches.push(spawn_fetch(executor, Arc::clone(repository), path));
            record.mark_fetched(url, "", now);
        }

        record.persist(&sidecar)?;

        if fetches.is_empty() {
            guard.release();
            return if local_file.exists() {
                debug!("Serving {} from cache", path);
                Ok(ResolvedResource::from_cache(local_file))
            } else {
                Err(ResolveError::NoUsableRepository {
                    path: path.to_string(),
                })
            };
        }

        match first_success(fetches).await {
            Ok((repository, fetched)) => {
                install(&fetched, &local_file)?;
                guard.release();
                info!("Fetched {} from {}", path, repository.id());
                Ok(ResolvedResource::from_repository(local_file, repository))
            }
            Err(FirstSuccessError::AllFailed(failures)) => {
                guard.release();
                for failure in &failures {
                    warn!("Failed to fetch {} from {}", path, failure);
                }
                if local_file.exists() {
                    warn!(
                        "All repositories failed for {}, falling back to cached copy",
                        path
                    );
                    Ok(ResolvedResource::from_cache(local_file))
                } else {
                    Err(ResolveError::AllSourcesFailed {
                        path: path.to_string(),
                        failures,
                    })
                }
            }
            Err(FirstSuccessError::NoOperations) => Err(ResolveError::NoUsableRepository {
                path: path.to_string(),
            }),
        }
    }

    /// Location of `path` inside the cache. Only plain relative paths are
    /// accepted, and never ones naming the resolver's own lock or sidecar files.
    fn artifact_path(&self, path: &str) -> Result<PathBuf, ResolveError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        let reserved = relative
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == LOCK_FILE_NAME || name.ends_with(LAST_UPDATED_SUFFIX));
        if relative.as_os_str().is_empty() || !plain || reserved {
            return Err(ResolveError::InvalidPath(path.to_string()));
        }
        Ok(self.cache_root.join(relative))
    }
}

fn sidecar_path(local_file: &Path) -> PathBuf {
    let mut sidecar = local_file.as_os_str().to_owned();
    sidecar.push(LAST_UPDATED_SUFFIX);
    PathBuf::from(sidecar)
}

fn is_stale(last_fetched: Option<i64>, now: i64, update_interval: Duration) -> bool {
    let Some(last_fetched) = last_fetched else {
        return true;
    };
    let interval = i64::try_from(update_interval.as_millis()).unwrap_or(i64::MAX);
    now.saturating_sub(last_fetched) > interval
}

/// Starts a fetch on `executor`. The returned future only observes the task;
/// dropping it leaves the task running.
fn spawn_fetch(
    executor: &Handle,
    repository: Arc<dyn Repository>,
    path: &str,
) -> BoxFuture<'static, FetchOutcome> {
    let task_repository = Arc::clone(&repository);
    let task_path = path.to_string();
    let task = executor.spawn(async move { task_repository.fetch(&task_path).await });

    async move {
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(RepositoryError::Unavailable(format!(
                "fetch task did not complete: {e}"
            ))),
        };
        match outcome {
            Ok(fetched) => Ok((repository, fetched)),
            Err(error) => Err(RepositoryFailure {
                repository_id: repository.id().to_string(),
                error,
            }),
        }
    }
    .boxed()
}

/// Copies fetched bytes over the cached artifact via a temp file in the same directory
fn install(fetched: &Path, local_file: &Path) -> Result<(), ResolveError> {
    if let (Ok(source), Ok(target)) = (fetched.canonicalize(), local_file.canonicalize()) {
        if source == target {
            return Ok(());
        }
    }

    let dir = local_file.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut target = replacement_file_in(dir)?;
    let mut source = File::open(fetched)?;
    std::io::copy(&mut source, &mut target)?;
    target.persist(local_file).map_err(|e| e.error)?;
    Ok(())
}
