use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// LRU cache whose entries also expire after a fixed time-to-live.
pub struct Cache<K, V> {
    inner: LruCache<K, (Instant, V)>,
    ttl: Duration,
}

impl<K: Hash + Eq, V> Cache<K, V> {
    /// `None` when `capacity` is zero.
    pub fn new(capacity: usize, ttl: Duration) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Cache {
            inner: LruCache::new(capacity),
            ttl,
        })
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        let expired = match self.inner.peek(key) {
            Some((inserted_at, _)) => inserted_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            self.inner.pop(key);
            return None;
        }
        self.inner.get(key).map(|(_, value)| value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.inner.put(key, (Instant::now(), value));
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
