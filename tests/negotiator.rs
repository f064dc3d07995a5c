//! CacheNegotiator integration tests

mod helper;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::runtime::Handle;

use helper::{ConcurrencyProbe, FakeRepository};
use maven_resolve::config::LockConfig;
use maven_resolve::resolver::clock::SystemClock;
use maven_resolve::resolver::repositories::LocalRepository;
use maven_resolve::resolver::staleness::StalenessRecord;
use maven_resolve::resolver::{CacheNegotiator, ResolveError};

const JAR: &str = "org/example/lib/1.0/lib-1.0.jar";
const POM: &str = "org/example/lib/1.0/lib-1.0.pom";

fn write_file(path: &Path, contents: &str) -> PathBuf {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
    path.to_path_buf()
}

fn negotiator(root: &Path) -> CacheNegotiator {
    let lock = LockConfig {
        poll_interval_ms: 10,
        timeout_ms: 5_000,
    };
    CacheNegotiator::with_config(root, lock, Arc::new(SystemClock)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolves_in_one_directory_never_overlap() {
    let temp_dir = TempDir::new().unwrap();
    let jar = write_file(&temp_dir.path().join("remote/lib.jar"), "jar");
    let pom = write_file(&temp_dir.path().join("remote/lib.pom"), "pom");
    let probe = ConcurrencyProbe::new();

    let repository = FakeRepository::new("central")
        .with_artifact(JAR, jar)
        .with_artifact(POM, pom)
        .with_delay(Duration::from_millis(100))
        .with_probe(Arc::clone(&probe));
    let mut negotiator = negotiator(&temp_dir.path().join("cache"));
    negotiator.add_repository(Arc::new(repository)).unwrap();

    let handle = Handle::current();
    let (jar_result, pom_result) =
        tokio::join!(negotiator.resolve(JAR, &handle), negotiator.resolve(POM, &handle));

    assert_eq!(std::fs::read_to_string(jar_result.unwrap().path()).unwrap(), "jar");
    assert_eq!(std::fs::read_to_string(pom_result.unwrap().path()).unwrap(), "pom");
    assert_eq!(probe.peak(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn resolves_in_different_directories_run_in_parallel() {
    let temp_dir = TempDir::new().unwrap();
    let first = "org/example/a/1.0/a-1.0.jar";
    let second = "org/example/b/1.0/b-1.0.jar";
    let a = write_file(&temp_dir.path().join("remote/a.jar"), "a");
    let b = write_file(&temp_dir.path().join("remote/b.jar"), "b");
    let probe = ConcurrencyProbe::new();

    let repository = FakeRepository::new("central")
        .with_artifact(first, a)
        .with_artifact(second, b)
        .with_delay(Duration::from_millis(300))
        .with_probe(Arc::clone(&probe));
    let mut negotiator = negotiator(&temp_dir.path().join("cache"));
    negotiator.add_repository(Arc::new(repository)).unwrap();

    let handle = Handle::current();
    let (a_result, b_result) =
        tokio::join!(negotiator.resolve(first, &handle), negotiator.resolve(second, &handle));

    assert!(a_result.is_ok());
    assert!(b_result.is_ok());
    assert_eq!(probe.peak(), 2);
}

#[tokio::test]
async fn second_resolve_within_update_interval_uses_cache() {
    let temp_dir = TempDir::new().unwrap();
    let jar = write_file(&temp_dir.path().join("remote/lib.jar"), "jar");
    let repository = Arc::new(FakeRepository::new("central").with_artifact(JAR, jar));
    let root = temp_dir.path().join("cache");
    let mut negotiator = negotiator(&root);
    negotiator.add_repository(repository.clone()).unwrap();

    let first = negotiator.resolve(JAR, &Handle::current()).await.unwrap();
    let sidecar = root.join(format!("{JAR}.lastUpdated"));
    let record_after_first = StalenessRecord::load(&sidecar).unwrap();

    let second = negotiator.resolve(JAR, &Handle::current()).await.unwrap();

    assert_eq!(first.source_repository().map(|r| r.id()), Some("central"));
    assert!(second.source_repository().is_none());
    assert_eq!(first.path(), second.path());
    assert_eq!(repository.fetch_count(), 1);
    assert_eq!(StalenessRecord::load(&sidecar).unwrap(), record_after_first);
    assert!(record_after_first.last_fetch_time(repository.url()).is_some());
}

#[tokio::test]
async fn only_stale_repositories_are_fetched() {
    let temp_dir = TempDir::new().unwrap();
    let jar = write_file(&temp_dir.path().join("remote/lib.jar"), "jar");
    let root = temp_dir.path().join("cache");

    let fresh = Arc::new(FakeRepository::new("fresh").with_artifact(JAR, jar.clone()));
    let stale = Arc::new(FakeRepository::new("stale").with_artifact(JAR, jar));

    let now = chrono::Utc::now().timestamp_millis();
    let mut record = StalenessRecord::new();
    record.mark_fetched(fresh.url(), "", now);
    record.mark_fetched(stale.url(), "", now - 2 * 24 * 60 * 60 * 1000);
    record.persist(&root.join(format!("{JAR}.lastUpdated"))).unwrap();

    let mut negotiator = negotiator(&root);
    negotiator
        .add_repository(fresh.clone())
        .unwrap()
        .add_repository(stale.clone())
        .unwrap();

    let resolved = negotiator.resolve(JAR, &Handle::current()).await.unwrap();

    assert_eq!(fresh.fetch_count(), 0);
    assert_eq!(stale.fetch_count(), 1);
    assert_eq!(resolved.source_repository().map(|r| r.id()), Some("stale"));
}

#[tokio::test]
async fn fastest_repository_wins_the_race() {
    let temp_dir = TempDir::new().unwrap();
    let slow_file = write_file(&temp_dir.path().join("slow/lib.jar"), "slow");
    let fast_file = write_file(&temp_dir.path().join("fast/lib.jar"), "fast");

    let slow = FakeRepository::new("slow")
        .with_artifact(JAR, slow_file)
        .with_delay(Duration::from_millis(500));
    let fast = FakeRepository::new("fast").with_artifact(JAR, fast_file);

    let mut negotiator = negotiator(&temp_dir.path().join("cache"));
    negotiator
        .add_repository(Arc::new(slow))
        .unwrap()
        .add_repository(Arc::new(fast))
        .unwrap();

    let resolved = negotiator.resolve(JAR, &Handle::current()).await.unwrap();

    assert_eq!(resolved.source_repository().map(|r| r.id()), Some("fast"));
    assert_eq!(std::fs::read_to_string(resolved.path()).unwrap(), "fast");
}

#[tokio::test]
async fn stale_copy_survives_total_fetch_failure() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("cache");
    let cached = write_file(&root.join(JAR), "stale");

    let mut negotiator = negotiator(&root);
    negotiator
        .add_repository(Arc::new(FakeRepository::new("central")))
        .unwrap();

    let resolved = negotiator.resolve(JAR, &Handle::current()).await.unwrap();

    assert_eq!(resolved.path(), cached.as_path());
    assert!(resolved.source_repository().is_none());
}

#[tokio::test]
async fn total_fetch_failure_without_cache_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut negotiator = negotiator(&temp_dir.path().join("cache"));
    negotiator
        .add_repository(Arc::new(FakeRepository::new("central")))
        .unwrap();

    let error = negotiator
        .resolve(JAR, &Handle::current())
        .await
        .unwrap_err();

    assert!(matches!(error, ResolveError::AllSourcesFailed { ref failures, .. } if failures.len() == 1));
    assert!(error.to_string().contains("central"));
}

#[tokio::test]
async fn local_repository_feeds_the_cache() {
    let temp_dir = TempDir::new().unwrap();
    let mirror = temp_dir.path().join("mirror");
    write_file(&mirror.join(JAR), "mirrored");
    let root = temp_dir.path().join("cache");

    let mut negotiator = negotiator(&root);
    negotiator
        .add_repository(Arc::new(LocalRepository::new("mirror", &mirror)))
        .unwrap();

    let resolved = negotiator.resolve(JAR, &Handle::current()).await.unwrap();

    assert_eq!(resolved.path(), root.join(JAR).as_path());
    assert_eq!(std::fs::read_to_string(resolved.path()).unwrap(), "mirrored");
    assert!(!root.join("org/example/lib/1.0/resolver-lock.lock").exists());
}
