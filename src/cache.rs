//! File-backed response cache with time-based invalidation
//!
//! Stores one JSON file per logical key under a configured directory. Each
//! entry records its write timestamp; reads return the payload only while it
//! is younger than the TTL (24 hours by default). Caching here is purely a
//! performance layer: unreadable, undecodable, or stale entries degrade to a
//! miss, and write failures are swallowed, so a broken cache can never break
//! a fetch.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::constants::CACHE_TTL_HOURS;

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached payload, exactly as decoded from the provider
    data: T,
    /// When the entry was written
    cached_at: DateTime<Utc>,
}

/// File-backed key/value store for provider responses
#[derive(Debug, Clone)]
pub struct ResponseCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// Maximum entry age before a read reports a miss
    ttl: Duration,
}

impl ResponseCache {
    /// Creates a cache rooted at `cache_dir` with the standard 24-hour TTL.
    ///
    /// The directory does not need to exist yet; it is created on first write.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(cache_dir, Duration::hours(CACHE_TTL_HOURS as i64))
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl,
        }
    }

    /// Returns the platform cache directory for this SDK
    /// (`~/.cache/ticker-price-sdk/` on Linux), or `None` when no home
    /// directory can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "ticker-price-sdk")?;
        Some(project_dirs.cache_dir().to_path_buf())
    }

    /// Returns the path to the cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Reads a payload from the cache.
    ///
    /// Returns `None` for a missing entry, an entry older than the TTL, or an
    /// entry that cannot be decoded into `T`. A stale or corrupt entry is
    /// never returned.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = fs::read_to_string(self.cache_path(key)).ok()?;
        let entry: CacheEntry<T> = serde_json::from_str(&content).ok()?;

        let age = Utc::now().signed_duration_since(entry.cached_at);
        if age >= self.ttl {
            tracing::debug!(key, age_secs = age.num_seconds(), "cache entry expired");
            return None;
        }

        Some(entry.data)
    }

    /// Writes a payload to the cache with the current timestamp, overwriting
    /// any prior entry for the key.
    ///
    /// Persistence failures are logged and swallowed.
    pub fn put<T: Serialize>(&self, key: &str, data: &T) {
        if let Err(err) = self.try_put(key, data) {
            tracing::warn!(key, error = %err, "failed to write cache entry");
        }
    }

    fn try_put<T: Serialize>(&self, key: &str, data: &T) -> io::Result<()> {
        self.ensure_dir()?;

        let entry = CacheEntry {
            data,
            cached_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(self.cache_path(key), json)
    }
}
