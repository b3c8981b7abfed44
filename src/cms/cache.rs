//! API response cache for incremental builds.
//!
//! Listing and detail queries are the slow part of a build, and published
//! content changes rarely. This module stores raw response bodies so a
//! rebuild within the revalidation window makes no search requests at all.
//!
//! # Design
//!
//! ## Cache keys
//!
//! Entries are keyed by the SHA-256 of the full request URL. Every search URL
//! carries the content release `ref`, so publishing anything in the CMS
//! changes the ref, changes every URL, and misses the whole cache. The API
//! root, which is where the ref comes from, is never cached.
//!
//! ## Freshness
//!
//! An entry is served while it is younger than `cache.revalidate_secs`
//! (24 hours by default). Expired entries are dropped when the cache is
//! saved, so the file does not grow without bound.
//!
//! ## Storage
//!
//! The cache is a JSON file at `<temp_dir>/.cms-cache.json`. A file that is
//! missing, corrupt, or from another format version loads as empty.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `fetch` or `build` to start from an empty cache.
//! Responses fetched during that run are still stored for the next one.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache file within the temp directory.
const CACHE_FILENAME: &str = ".cms-cache.json";

/// Version of the cache file format. Bump this to invalidate all existing
/// caches when the format or key computation changes.
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Unix timestamp (seconds) of when the response was fetched.
    pub fetched_at: i64,
    /// Raw response body.
    pub body: String,
}

/// On-disk map from URL hash to response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseCache {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    /// Create an empty cache (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the temp directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(dir: &Path) -> Self {
        let content = match std::fs::read_to_string(cache_path(dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Ignoring unreadable CMS cache: {}", e);
                return Self::empty();
            }
        };
        if cache.version != CACHE_VERSION {
            return Self::empty();
        }
        cache
    }

    /// Save to the temp directory.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(dir), json)
    }

    /// Body cached for `url`, if it was fetched less than `max_age_secs` ago.
    pub fn get_fresh(&self, url: &str, now: i64, max_age_secs: u64) -> Option<&str> {
        let entry = self.entries.get(&hash_url(url))?;
        is_fresh(entry, now, max_age_secs).then_some(entry.body.as_str())
    }

    /// Record the body fetched for `url` at `now`.
    pub fn insert(&mut self, url: &str, body: String, now: i64) {
        self.entries.insert(
            hash_url(url),
            CacheEntry {
                fetched_at: now,
                body,
            },
        );
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn prune(&mut self, now: i64, max_age_secs: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| is_fresh(entry, now, max_age_secs));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An entry from the future (clock moved back) counts as stale.
fn is_fresh(entry: &CacheEntry, now: i64, max_age_secs: u64) -> bool {
    let age = now - entry.fetched_at;
    age >= 0 && (age as u64) < max_age_secs
}

/// SHA-256 of a request URL, returned as a hex string.
pub fn hash_url(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Summary of cache performance for a fetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} fetched ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} fetched", self.misses)
        }
    }
}

/// Resolve the cache file path for a temp directory.
pub fn cache_path(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const URL: &str = "https://blog.cdn.prismic.io/api/v2/documents/search?ref=abc&pageSize=20";

    #[test]
    fn empty_cache_has_no_entries() {
        let cache = ResponseCache::empty();
        assert_eq!(cache.version, CACHE_VERSION);
        assert!(cache.is_empty());
    }

    #[test]
    fn fresh_entry_is_served() {
        let mut cache = ResponseCache::empty();
        cache.insert(URL, "{}".into(), 1_000);
        assert_eq!(cache.get_fresh(URL, 1_500, 3_600), Some("{}"));
    }

    #[test]
    fn expired_entry_is_not_served() {
        let mut cache = ResponseCache::empty();
        cache.insert(URL, "{}".into(), 1_000);
        assert_eq!(cache.get_fresh(URL, 4_600, 3_600), None);
    }

    #[test]
    fn zero_max_age_never_serves() {
        let mut cache = ResponseCache::empty();
        cache.insert(URL, "{}".into(), 1_000);
        assert_eq!(cache.get_fresh(URL, 1_000, 0), None);
    }

    #[test]
    fn future_entry_is_stale() {
        let mut cache = ResponseCache::empty();
        cache.insert(URL, "{}".into(), 5_000);
        assert_eq!(cache.get_fresh(URL, 1_000, 3_600), None);
    }

    #[test]
    fn different_url_misses() {
        let mut cache = ResponseCache::empty();
        cache.insert(URL, "{}".into(), 1_000);
        let other = URL.replace("ref=abc", "ref=def");
        assert_eq!(cache.get_fresh(&other, 1_000, 3_600), None);
    }

    #[test]
    fn prune_removes_expired_entries() {
        let mut cache = ResponseCache::empty();
        cache.insert("https://a", "old".into(), 0);
        cache.insert("https://b", "new".into(), 9_000);
        assert_eq!(cache.prune(10_000, 3_600), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_fresh("https://b", 10_000, 3_600), Some("new"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut cache = ResponseCache::empty();
        cache.insert(URL, r#"{"results":[]}"#.into(), 42);
        cache.save(tmp.path()).unwrap();

        let loaded = ResponseCache::load(tmp.path());
        assert_eq!(loaded.get_fresh(URL, 43, 60), Some(r#"{"results":[]}"#));
    }

    #[test]
    fn load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(ResponseCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn load_corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(cache_path(tmp.path()), "not json").unwrap();
        assert!(ResponseCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn load_other_version_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            cache_path(tmp.path()),
            r#"{"version": 999, "entries": {"k": {"fetched_at": 1, "body": "x"}}}"#,
        )
        .unwrap();
        assert!(ResponseCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn hash_is_stable_hex() {
        let hash = hash_url("https://example.com");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_url("https://example.com"));
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stats_display() {
        let mut stats = CacheStats::default();
        stats.miss();
        stats.miss();
        assert_eq!(stats.to_string(), "2 fetched");
        stats.hit();
        assert_eq!(stats.to_string(), "1 cached, 2 fetched (3 total)");
    }
}
