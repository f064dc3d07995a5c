//! Per-artifact record of when each repository was last asked for it
//!
//! The record lives in a `<artifact>.lastUpdated` sidecar next to the cached
//! artifact and uses the properties layout Maven itself writes:
//!
//! ```text
//! #NOTE: This is a Maven Resolver internal implementation file, its format can be changed without prior notice.
//! https\://repo.example.org/maven2/.lastUpdated=1700000000000
//! https\://repo.example.org/maven2/.error=
//! ```
//!
//! Keys are repository URLs, never repository ids. The record does no locking of
//! its own; callers serialise access through the directory lock.

use std::io::{ErrorKind, Write};
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::resolver::error::StalenessError;
use crate::resolver::files::replacement_file_in;

const HEADER: &str = "#NOTE: This is a Maven Resolver internal implementation file, its format can be changed without prior notice.";
const LAST_UPDATED_KEY: &str = ".lastUpdated";
const ERROR_KEY: &str = ".error";

/// Last fetch of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchEntry {
    /// Milliseconds since the UNIX epoch
    pub last_fetched: i64,
    /// Opaque marker stored alongside the timestamp (Maven keeps the last error here)
    pub marker: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StalenessRecord {
    entries: IndexMap<String, FetchEntry>,
}

impl StalenessRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the record from a sidecar file. A missing file yields an empty record.
    pub fn load(path: &Path) -> Result<Self, StalenessError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::new()),
            Err(source) => Err(StalenessError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses the properties text of a sidecar. Lines that do not describe a
    /// repository fetch are skipped.
    pub fn parse(text: &str) -> Self {
        let mut timestamps: IndexMap<String, Option<i64>> = IndexMap::new();
        let mut markers: IndexMap<String, String> = IndexMap::new();

        for line in text.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let Some((key, value)) = split_property(line) else {
                debug!("Skipping malformed staleness line: {}", line);
                continue;
            };

            if let Some(url) = key.strip_suffix(LAST_UPDATED_KEY) {
                match value.trim().parse::<i64>() {
                    Ok(timestamp) => {
                        timestamps.insert(url.to_string(), Some(timestamp));
                    }
                    Err(_) => debug!("Skipping invalid timestamp for {}: {}", url, value),
                }
            } else if let Some(url) = key.strip_suffix(ERROR_KEY) {
                timestamps.entry(url.to_string()).or_insert(None);
                markers.insert(url.to_string(), value);
            } else {
                debug!("Skipping unknown staleness key: {}", key);
            }
        }

        let entries = timestamps
            .into_iter()
            .filter_map(|(url, timestamp)| {
                let last_fetched = timestamp?;
                let marker = markers.get(&url).cloned().unwrap_or_default();
                Some((
                    url,
                    FetchEntry {
                        last_fetched,
                        marker,
                    },
                ))
            })
            .collect();

        Self { entries }
    }

    /// Returns when the repository at `url` was last fetched from, or `None` if never
    pub fn last_fetch_time(&self, url: &str) -> Option<i64> {
        self.entries.get(url).map(|entry| entry.last_fetched)
    }

    pub fn entry(&self, url: &str) -> Option<&FetchEntry> {
        self.entries.get(url)
    }

    /// Records a fetch from the repository at `url`, replacing any earlier entry
    pub fn mark_fetched(&mut self, url: &str, marker: &str, now: i64) {
        self.entries.insert(
            url.to_string(),
            FetchEntry {
                last_fetched: now,
                marker: marker.to_string(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FetchEntry)> {
        self.entries.iter().map(|(url, entry)| (url.as_str(), entry))
    }

    /// Renders the record in sidecar format
    pub fn render(&self) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');
        for (url, entry) in &self.entries {
            let key = escape(url, true);
            out.push_str(&format!("{key}{LAST_UPDATED_KEY}={}\n", entry.last_fetched));
            if !entry.marker.is_empty() {
                out.push_str(&format!("{key}{ERROR_KEY}={}\n", escape(&entry.marker, false)));
            }
        }
        out
    }

    /// Writes the full record to `path`, replacing the previous file atomically
    pub fn persist(&self, path: &Path) -> Result<(), StalenessError> {
        let write_error = |source| StalenessError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(write_error)?;

        let mut file = replacement_file_in(dir).map_err(write_error)?;
        file.write_all(self.render().as_bytes())
            .map_err(write_error)?;
        file.persist(path).map_err(|e| write_error(e.error))?;

        debug!("Persisted {} staleness entries to {:?}", self.len(), path);
        Ok(())
    }
}

/// Splits a properties line at its first unescaped `=` or `:` and unescapes
/// both halves
fn split_property(line: &str) -> Option<(String, String)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => {
                let key = unescape(line[..i].trim_end());
                let value = unescape(line[i + 1..].trim_start());
                return Some((key, value));
            }
            _ => {}
        }
    }
    None
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' ' if i == 0 || is_key => out.push_str("\\ "),
            ':' | '=' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
