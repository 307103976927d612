//! Bounded TTL cache for catalog lookups
//!
//! Entries expire a fixed time after insertion. When full, the oldest
//! entry is evicted first. All access goes through one mutex, so a reader
//! never sees a half-written entry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cached value with its insertion metadata
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    /// Insertion order, used to pick the eviction victim
    seq: u64,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

/// Thread-safe cache with a capacity bound and time-to-live
#[derive(Debug)]
pub struct TtlCache<V> {
    state: Mutex<CacheState<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `capacity` entries for `ttl` each.
    ///
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            capacity,
            ttl,
        }
    }

    /// Get a live entry, dropping it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => return None,
            Some(entry) => entry.created_at.elapsed() >= self.ttl,
        };

        if expired {
            state.entries.remove(key);
            return None;
        }

        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or replace an entry, evicting the oldest ones when full
    pub fn insert(&self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }

        let mut state = self.state.lock();
        let ttl = self.ttl;
        state.entries.retain(|_, entry| entry.created_at.elapsed() < ttl);

        if !state.entries.contains_key(&key) {
            while state.entries.len() >= self.capacity {
                let oldest = state
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.seq)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        state.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                seq,
            },
        );
    }

    /// Number of stored entries (expired ones included until next access)
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
