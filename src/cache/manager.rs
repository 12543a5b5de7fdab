/// Generic in-memory cache with TTL and LRU eviction
///
/// Thread-safe, generic over key/value types.
/// Tracks metrics for monitoring.
use super::config::CacheConfig;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Cache entry with TTL tracking
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState<K, V> {
    data: HashMap<K, CacheEntry<V>>,
    // Front = least recently used
    access_order: VecDeque<K>,
}

/// Generic cache manager
pub struct CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    config: CacheConfig,
    state: RwLock<CacheState<K, V>>,
    metrics: Mutex<CacheMetrics>,
}

impl<K, V> CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CacheState {
                data: HashMap::new(),
                access_order: VecDeque::new(),
            }),
            metrics: Mutex::new(CacheMetrics::default()),
        }
    }

    /// Get value from cache (returns None if expired or missing)
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.write();

        let expired = match state.data.get(key) {
            Some(entry) => entry.is_expired(self.config.ttl),
            None => {
                self.metrics.lock().misses += 1;
                return None;
            }
        };

        if expired {
            state.data.remove(key);
            state.access_order.retain(|k| k != key);
            let mut metrics = self.metrics.lock();
            metrics.misses += 1;
            metrics.expirations += 1;
            return None;
        }

        Self::touch(&mut state.access_order, key);
        self.metrics.lock().hits += 1;
        state.data.get(key).map(|entry| entry.value.clone())
    }

    /// Insert value into cache (evicts LRU if at capacity)
    pub fn insert(&self, key: K, value: V) {
        let mut state = self.state.write();

        if state.data.len() >= self.config.capacity && !state.data.contains_key(&key) {
            if let Some(lru_key) = state.access_order.pop_front() {
                state.data.remove(&lru_key);
                self.metrics.lock().evictions += 1;
            }
        }

        state.data.insert(key.clone(), CacheEntry::new(value));
        Self::touch(&mut state.access_order, &key);
        self.metrics.lock().inserts += 1;
    }

    pub fn remove(&self, key: &K) {
        let mut state = self.state.write();
        state.data.remove(key);
        state.access_order.retain(|k| k != key);
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.data.clear();
        state.access_order.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Move key to the back (most recently used)
    fn touch(access_order: &mut VecDeque<K>, key: &K) {
        access_order.retain(|k| k != key);
        access_order.push_back(key.clone());
    }
}
