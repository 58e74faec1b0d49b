//! In-memory translation cache with per-entry TTL.
//!
//! Entries expire lazily: an expired entry is dropped when it is read, and
//! nothing sweeps the map in the background. `invalidate(None)` flushes all.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Number of normalised source characters kept readable in a key
const KEY_PREFIX_CHARS: usize = 50;

/// Deterministic cache key for a translation.
///
/// Layout: `{context}:{target}:{digest}:{prefix}` where `digest` is the first
/// 16 hex characters of the blake3 hash of the normalised text and `prefix` is
/// its first 50 characters. The prefix keeps keys readable in logs; the digest
/// keeps texts that share a prefix apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_translation(context: &str, target_language: &str, text: &str) -> Self {
        let normalized = normalize_source(text);
        let digest = blake3::hash(normalized.as_bytes()).to_hex();
        let prefix: String = normalized.chars().take(KEY_PREFIX_CHARS).collect();

        Self(format!(
            "{}:{}:{}:{}",
            context,
            target_language.trim().to_lowercase(),
            &digest.as_str()[..16],
            prefix
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and collapse whitespace runs, so reflowed text shares a key.
fn normalize_source(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A stored value and its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }
}

/// Generic key → value store with per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

/// The cache the translation client uses.
pub type TranslationCache = TtlCache<String>;

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a value. Returns None if absent or expired; an expired entry is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
            debug!("Cache entry expired: {}", key);
        }
        None
    }

    /// Insert or overwrite a value.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.lock().insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove one key, or every entry when `key` is None.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, key: Option<&str>) -> usize {
        let mut entries = self.entries.lock();
        match key {
            Some(key) => usize::from(entries.remove(key).is_some()),
            None => {
                let removed = entries.len();
                entries.clear();
                debug!("Cache flushed ({} entries)", removed);
                removed
            }
        }
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
