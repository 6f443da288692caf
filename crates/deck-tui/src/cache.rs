//! On-disk cache of raw feed payloads, one file per key.
//!
//! Freshness comes from the file's mtime: an entry is served while
//! `now - mtime < ttl`. Anything else (missing, stale, unreadable, mtime in
//! the future) counts as a miss.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tracing::debug;

pub struct FeedCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FeedCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    /// Fresh payload for `key`, judged against `now`.
    pub fn load(&self, key: &str, now: SystemTime) -> Option<String> {
        let path = self.path_for(key);
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = now.duration_since(modified).ok()?;
        if age >= self.ttl {
            debug!("cache stale for {} ({:?} old)", key, age);
            return None;
        }
        let payload = std::fs::read_to_string(&path).ok()?;
        debug!("cache hit for {} ({:?} old)", key, age);
        Some(payload)
    }

    pub fn store(&self, key: &str, payload: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(key);
        std::fs::write(&path, payload).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// Subreddit names are user input; keep them to a single safe path segment.
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtime(cache: &FeedCache, key: &str) -> SystemTime {
        std::fs::metadata(cache.path_for(key))
            .unwrap()
            .modified()
            .unwrap()
    }

    #[test]
    fn test_fresh_entry_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), Duration::from_secs(600));
        cache.store("videos", "{\"a\":1}").unwrap();

        let written = mtime(&cache, "videos");
        let payload = cache.load("videos", written + Duration::from_secs(599));
        assert_eq!(payload.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_entry_expires_exactly_at_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), Duration::from_secs(600));
        cache.store("videos", "{}").unwrap();

        let written = mtime(&cache, "videos");
        assert!(cache.load("videos", written + Duration::from_secs(600)).is_none());
        assert!(cache.load("videos", written + Duration::from_secs(601)).is_none());
    }

    #[test]
    fn test_missing_entry_and_future_mtime_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), Duration::from_secs(600));
        assert!(cache.load("nothing", SystemTime::now()).is_none());

        cache.store("videos", "{}").unwrap();
        let written = mtime(&cache, "videos");
        assert!(cache.load("videos", written - Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_keys_stay_inside_cache_dir() {
        let cache = FeedCache::new("/tmp/deck", Duration::from_secs(1));
        assert_eq!(
            cache.path_for("../etc/Passwd"),
            PathBuf::from("/tmp/deck/___etc_passwd.json")
        );
        assert_eq!(cache.path_for(""), PathBuf::from("/tmp/deck/_.json"));
    }
}
