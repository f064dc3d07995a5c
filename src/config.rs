use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default interval between lock attempts in milliseconds
pub const DEFAULT_LOCK_POLL_INTERVAL_MS: u64 = 10;

/// Default time to wait for the directory lock in milliseconds (10 seconds)
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 10_000;

/// Default repository update interval in milliseconds (24 hours)
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

// =============================================================================
// File layout
// =============================================================================

/// Suffix of the staleness sidecar stored next to each cached artifact
pub const LAST_UPDATED_SUFFIX: &str = ".lastUpdated";

/// Name of the lock file created in the artifact's parent directory
pub const LOCK_FILE_NAME: &str = "resolver-lock.lock";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Resolver configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Local cache root. Defaults to [`default_cache_root`] when absent.
    pub cache_root: Option<PathBuf>,
    pub lock: LockConfig,
    pub repositories: Vec<RepositoryConfig>,
}

impl ResolverConfig {
    /// Reads a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured cache root, or the default one
    pub fn cache_root(&self) -> PathBuf {
        self.cache_root.clone().unwrap_or_else(default_cache_root)
    }
}

/// Directory lock policy
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LockConfig {
    /// Interval between lock attempts in milliseconds
    pub poll_interval_ms: u64,
    /// Give up waiting for the lock after this many milliseconds
    pub timeout_ms: u64,
}

impl LockConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_LOCK_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

/// A directory-backed repository
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub id: String,
    /// Directory of the repository, optionally as a `file://` URL
    pub url: String,
    /// Minimum time between two fetches from this repository in milliseconds
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

fn default_update_interval_ms() -> u64 {
    DEFAULT_UPDATE_INTERVAL_MS
}

/// Returns the default local cache root.
/// Uses ~/.m2/repository, or ./.m2/repository if no home directory is known.
pub fn default_cache_root() -> PathBuf {
    cache_root_with_home(dirs::home_dir())
}

fn cache_root_with_home(home_dir: Option<PathBuf>) -> PathBuf {
    home_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".m2")
        .join("repository")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn resolver_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<ResolverConfig>(json!({
            "lock": {
                "timeoutMs": 500
            }
        }))
        .unwrap();

        assert_eq!(result.lock.timeout_ms, 500);
        assert_eq!(result.lock.poll_interval_ms, DEFAULT_LOCK_POLL_INTERVAL_MS);
        assert_eq!(result.cache_root, None);
        assert!(result.repositories.is_empty());
    }

    #[test]
    fn resolver_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<ResolverConfig>(json!({
            "cacheRoot": "/tmp/m2",
            "lock": {
                "pollIntervalMs": 5,
                "timeoutMs": 2000
            },
            "repositories": [
                { "id": "central-mirror", "url": "/srv/mirror", "updateIntervalMs": 1000 },
                { "id": "local", "url": "file:///srv/local" }
            ]
        }))
        .unwrap();

        assert_eq!(
            result,
            ResolverConfig {
                cache_root: Some(PathBuf::from("/tmp/m2")),
                lock: LockConfig {
                    poll_interval_ms: 5,
                    timeout_ms: 2000,
                },
                repositories: vec![
                    RepositoryConfig {
                        id: "central-mirror".to_string(),
                        url: "/srv/mirror".to_string(),
                        update_interval_ms: 1000,
                    },
                    RepositoryConfig {
                        id: "local".to_string(),
                        url: "file:///srv/local".to_string(),
                        update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
                    },
                ],
            }
        );
    }

    #[test]
    fn lock_config_defaults_to_ten_millis_and_ten_seconds() {
        let lock = LockConfig::default();
        assert_eq!(lock.poll_interval(), Duration::from_millis(10));
        assert_eq!(lock.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn load_reads_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resolver.json");
        std::fs::write(&path, r#"{ "cacheRoot": "/opt/cache" }"#).unwrap();

        let config = ResolverConfig::load(&path).unwrap();
        assert_eq!(config.cache_root(), PathBuf::from("/opt/cache"));
    }

    #[test]
    fn load_reports_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resolver.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = ResolverConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[test]
    fn cache_root_with_home_uses_dot_m2() {
        let path = cache_root_with_home(Some(PathBuf::from("/home/user")));
        assert_eq!(path, PathBuf::from("/home/user/.m2/repository"));
    }

    #[test]
    fn cache_root_with_home_falls_back_to_current_dir() {
        let path = cache_root_with_home(None);
        assert_eq!(path, PathBuf::from("./.m2/repository"));
    }
}
