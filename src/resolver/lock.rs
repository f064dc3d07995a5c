//! Directory-scoped exclusive lock
//!
//! All artifacts in one directory share a single `resolver-lock.lock` file. The
//! file is created on demand and removed again when the lock is released, so a
//! lock holder has to check after locking that the path still names the file it
//! locked; a releasing holder may have unlinked it in the meantime.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::config::{LOCK_FILE_NAME, LockConfig};
use crate::resolver::error::ResolveError;

/// Lock on the parent directory of an artifact
#[derive(Debug, Clone)]
pub struct DirectoryLock {
    path: PathBuf,
    poll_interval: Duration,
    timeout: Duration,
}

impl DirectoryLock {
    /// Lock guarding the directory that contains `artifact`
    pub fn for_artifact(artifact: &Path, config: &LockConfig) -> Self {
        let parent = artifact.parent().unwrap_or_else(|| Path::new("/"));
        Self {
            path: parent.join(LOCK_FILE_NAME),
            poll_interval: config.poll_interval(),
            timeout: config.timeout(),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for the lock, polling every `poll_interval`.
    ///
    /// Fails with [`ResolveError::LockTimeout`] once the accumulated wait exceeds
    /// `timeout`. Creates the parent directory if needed.
    pub async fn acquire(&self) -> Result<LockGuard, ResolveError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let started = Instant::now();
        loop {
            if let Some(guard) = self.try_acquire()? {
                debug!("Acquired lock {:?} after {:?}", self.path, started.elapsed());
                return Ok(guard);
            }

            if started.elapsed() > self.timeout {
                return Err(ResolveError::LockTimeout {
                    path: self.path.clone(),
                    waited: self.timeout,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    fn try_acquire(&self) -> Result<Option<LockGuard>, ResolveError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        if !still_linked(&file, &self.path)? {
            debug!("Lock file {:?} was replaced while locking, retrying", self.path);
            return Ok(None);
        }

        Ok(Some(LockGuard {
            file: Some(file),
            path: self.path.clone(),
        }))
    }
}

fn is_contended(error: &std::io::Error) -> bool {
    error.kind() == ErrorKind::WouldBlock
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let locked = file.metadata()?;
    match std::fs::metadata(path) {
        Ok(current) => Ok(locked.dev() == current.dev() && locked.ino() == current.ino()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> std::io::Result<bool> {
    Ok(path.exists())
}

/// A held directory lock. Released when dropped.
#[derive(Debug)]
pub struct LockGuard {
    file: Option<File>,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the lock now rather than at the end of scope
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        // Unlink before unlocking so a waiter never locks a file that is about to vanish
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove lock file {:?}: {}", self.path, e);
            }
        }
        if let Err(e) = FileExt::unlock(&file) {
            warn!("Failed to unlock {:?}: {}", self.path, e);
        }
        debug!("Released lock {:?}", self.path);
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
