//! Repository test utilities

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use maven_resolve::resolver::error::RepositoryError;
use maven_resolve::resolver::repository::Repository;

/// Tracks how many fetches run at the same time
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Fake repository serving files from a map of artifact path to local file
pub struct FakeRepository {
    id: String,
    url: String,
    update_interval: Duration,
    delay: Duration,
    artifacts: Vec<(String, PathBuf)>,
    fetches: AtomicUsize,
    probe: Option<Arc<ConcurrencyProbe>>,
}

impl FakeRepository {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            url: format!("https://{id}.example.org/maven2/"),
            update_interval: Duration::from_secs(24 * 60 * 60),
            delay: Duration::ZERO,
            artifacts: Vec::new(),
            fetches: AtomicUsize::new(0),
            probe: None,
        }
    }

    pub fn with_artifact(mut self, path: &str, file: PathBuf) -> Self {
        self.artifacts.push((path.to_string(), file));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    pub fn with_probe(mut self, probe: Arc<ConcurrencyProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for FakeRepository {
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
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(probe) = &self.probe {
            probe.enter();
        }

        sleep(self.delay).await;

        if let Some(probe) = &self.probe {
            probe.exit();
        }

        self.artifacts
            .iter()
            .find(|(artifact, _)| artifact == path)
            .map(|(_, file)| file.clone())
            .ok_or_else(|| RepositoryError::NotFound(path.to_string()))
    }
}
