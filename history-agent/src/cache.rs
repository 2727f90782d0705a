//! In-memory TTL cache for rendered context prefixes.
//!
//! Why cache?
//! - Assembling history (blame + commit metadata + PR discussions) costs
//!   several subprocess and network round-trips per block.
//! - Repeated questions about the same block should be O(1) on that work.
//!
//! Key (stable across processes): SHA256("{owner}:{repo}:{ref}:{path}:{start}:{end}:{kind}")
//!
//! Entries are owned exclusively by the cache and expired lazily: a read of
//! a stale entry removes it and reports a miss. Per-key atomicity comes from
//! the single mutex guarding the map; no cross-key coordination is needed.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use git_block_engine::BlockRef;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Computes a deterministic cache key for a block plus a context-kind tag.
///
/// Identical inputs always yield identical keys; distinct kinds for the same
/// block yield distinct keys.
pub fn cache_key(block_ref: &BlockRef, kind: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}:{}:{}:{}:{}:{}:{}",
        block_ref.repo_owner,
        block_ref.repo_name,
        block_ref.git_ref,
        block_ref.path,
        block_ref.start_line,
        block_ref.end_line,
        kind
    ));
    format!("{:x}", hasher.finalize())
}

#[derive(Debug)]
struct CacheEntry {
    text: String,
    label: String,
    created: Instant,
}

/// Shared, mutable store of rendered prompt prefixes.
#[derive(Debug)]
pub struct ContextCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    enabled: bool,
}

impl ContextCache {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the cached text for `key` if present and fresh.
    ///
    /// A stale entry is removed on the spot and reported as a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.created.elapsed() <= self.ttl => Some(entry.text.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `text` under `key` with the current timestamp.
    pub fn insert(&self, key: &str, label: &str, text: String) {
        if !self.enabled {
            return;
        }
        debug!(key = %&key[..12.min(key.len())], label, bytes = text.len(), "caching context");
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                text,
                label: label.to_string(),
                created: Instant::now(),
            },
        );
    }

    /// Returns the cached rendering for `key`, building and storing it on a
    /// miss. The builder runs at most once per miss; with caching disabled it
    /// runs every call.
    pub fn get_or_create<F>(&self, key: &str, label: &str, builder: F) -> String
    where
        F: FnOnce() -> String,
    {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let text = builder();
        self.insert(key, label, text.clone());
        text
    }

    /// Removes one entry; returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.remove(key).is_some()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let before = entries.len();
        entries.retain(|_, e| e.created.elapsed() <= self.ttl);
        before - entries.len()
    }

    /// Number of fresh entries currently stored.
    pub fn active_len(&self) -> usize {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries
            .values()
            .filter(|e| e.created.elapsed() <= self.ttl)
            .count()
    }

    /// Labels of fresh entries, for diagnostics.
    pub fn active_labels(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries
            .values()
            .filter(|e| e.created.elapsed() <= self.ttl)
            .map(|e| e.label.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> BlockRef {
        BlockRef {
            repo_owner: "acme".into(),
            repo_name: "widgets".into(),
            git_ref: "main".into(),
            path: "a.py".into(),
            start_line: 10,
            end_line: 12,
        }
    }

    #[test]
    fn keys_are_stable_and_kind_sensitive() {
        let a = cache_key(&block(), "full");
        let b = cache_key(&block(), "full");
        let c = cache_key(&block(), "code_only");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut other = block();
        other.end_line = 13;
        assert_ne!(a, cache_key(&other, "full"));
    }

    #[test]
    fn get_or_create_builds_exactly_once() {
        let cache = ContextCache::new(Duration::from_secs(60), true);
        let key = cache_key(&block(), "full");

        let mut builds = 0;
        let first = cache.get_or_create(&key, "widgets a.py", || {
            builds += 1;
            "rendered".to_string()
        });
        let second = cache.get_or_create(&key, "widgets a.py", || {
            builds += 1;
            "rebuilt".to_string()
        });

        assert_eq!(first, "rendered");
        assert_eq!(second, "rendered");
        assert_eq!(builds, 1);
        assert_eq!(cache.active_len(), 1);
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = ContextCache::new(Duration::ZERO, true);
        let key = cache_key(&block(), "full");

        cache.insert(&key, "widgets a.py", "rendered".to_string());
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.active_len(), 0);
    }

    #[test]
    fn purge_counts_removed_entries() {
        let cache = ContextCache::new(Duration::ZERO, true);
        cache.insert("k1", "a", "x".into());
        cache.insert("k2", "b", "y".into());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.purge_expired(), 2);
    }

    #[test]
    fn disabled_cache_always_rebuilds() {
        let cache = ContextCache::new(Duration::from_secs(60), false);
        let key = cache_key(&block(), "full");

        let mut builds = 0;
        for _ in 0..2 {
            cache.get_or_create(&key, "widgets a.py", || {
                builds += 1;
                "rendered".to_string()
            });
        }
        assert_eq!(builds, 2);
        assert_eq!(cache.active_len(), 0);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ContextCache::new(Duration::from_secs(60), true);
        cache.insert("k", "a", "x".into());
        assert!(cache.invalidate("k"));
        assert!(!cache.invalidate("k"));
        assert_eq!(cache.get("k"), None);
    }
}
