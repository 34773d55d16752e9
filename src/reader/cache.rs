//! Hot word cache in front of any [`WordReader`].
//!
//! Decoding a struct or a long string touches the same slots repeatedly across
//! queries (the length word of an array, the head word of a string). An LRU of
//! `(address, slot) → word` turns those into memory hits.
//!
//! ```text
//!   StorageResolver
//!     → CachedWordReader   (this module, in-memory LRU)
//!       → RpcWordReader / MemoryWordReader
//! ```
//!
//! The cache can be shared between readers via `Arc<Mutex<HotWordCache>>`.
//! The lock is never held across an await.

use super::WordReader;
use crate::constants::DEFAULT_CACHE_ENTRIES;
use crate::errors::ReaderError;
use alloy_primitives::{Address, B256, U256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// A reference-counted, thread-safe handle to a [`HotWordCache`].
pub type SharedCache = Arc<Mutex<HotWordCache>>;

/// Sizing of a [`HotWordCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Words kept before the least recently read one is dropped
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: DEFAULT_CACHE_ENTRIES }
    }
}

impl CacheConfig {
    pub fn with_capacity(max_entries: usize) -> Self {
        Self { max_entries }
    }
}

/// Counters for one cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from memory
    pub hits: u64,
    /// Reads forwarded to the inner reader
    pub misses: u64,
    /// Words dropped at capacity
    pub evictions: u64,
    pub current_entries: usize,
    pub max_entries: usize,
}

impl CacheStats {
    /// Fraction of reads answered from memory, `0.0` before any read.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            reads => self.hits as f64 / reads as f64,
        }
    }

    /// No read has gone through the cache yet.
    pub fn is_cold(&self) -> bool {
        self.hits + self.misses == 0
    }
}

/// LRU cache mapping `(Address, slot) → B256`.
///
/// `HashMap` for lookup, `VecDeque` for recency (front = least recently used).
#[derive(Debug)]
pub struct HotWordCache {
    map: HashMap<(Address, U256), B256>,
    order: VecDeque<(Address, U256)>,
    max_entries: usize,
    stats: CacheStats,
}

impl HotWordCache {
    /// Create a new cache; a capacity of 0 is raised to 1.
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            map: HashMap::with_capacity(max_entries),
            order: VecDeque::with_capacity(max_entries),
            max_entries,
            stats: CacheStats { max_entries, ..Default::default() },
        }
    }

    /// Look up a word. Updates LRU order on hit.
    pub fn get(&mut self, addr: Address, slot: U256) -> Option<B256> {
        let key = (addr, slot);
        if let Some(&value) = self.map.get(&key) {
            self.stats.hits += 1;
            self.promote(key);
            Some(value)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Insert or update a word. Evicts the LRU entry if at capacity.
    pub fn insert(&mut self, addr: Address, slot: U256, value: B256) {
        let key = (addr, slot);
        if self.map.insert(key, value).is_some() {
            self.promote(key);
        } else {
            if self.map.len() > self.max_entries {
                if let Some(lru_key) = self.order.pop_front() {
                    self.map.remove(&lru_key);
                    self.stats.evictions += 1;
                }
            }
            self.order.push_back(key);
        }
        self.stats.current_entries = self.map.len();
    }

    /// Drop every cached word of one contract.
    pub fn invalidate_address(&mut self, addr: Address) {
        self.map.retain(|(a, _), _| *a != addr);
        self.order.retain(|(a, _)| *a != addr);
        self.stats.current_entries = self.map.len();
    }

    /// Evict all entries.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.stats.current_entries = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of performance counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    fn promote(&mut self, key: (Address, U256)) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
            self.order.push_back(key);
        }
    }
}

/// A [`WordReader`] that consults a shared LRU before the inner reader.
///
/// Failed reads are not cached.
pub struct CachedWordReader<R> {
    inner: R,
    cache: SharedCache,
}

impl<R: WordReader> CachedWordReader<R> {
    /// Wrap a reader with a new, unshared cache.
    pub fn new(inner: R, config: CacheConfig) -> Self {
        Self {
            inner,
            cache: Arc::new(Mutex::new(HotWordCache::new(config.max_entries))),
        }
    }

    /// Wrap a reader with an existing cache handle.
    pub fn new_shared(inner: R, cache: SharedCache) -> Self {
        Self { inner, cache }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.lock().expect("cache lock poisoned").stats()
    }

    /// Forget every word of `addr`, e.g. after a transaction touched it.
    pub fn invalidate_address(&self, addr: Address) {
        self.cache.lock().expect("cache lock poisoned").invalidate_address(addr);
    }

    pub fn clear(&self) {
        self.cache.lock().expect("cache lock poisoned").clear();
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Handle for building further readers over the same cache.
    pub fn shared_cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }
}

#[async_trait::async_trait]
impl<R: WordReader> WordReader for CachedWordReader<R> {
    async fn read_word(&self, address: Address, slot: U256) -> Result<B256, ReaderError> {
        let cached = self.cache.lock().expect("cache lock poisoned").get(address, slot);
        if let Some(word) = cached {
            trace!(target: "storage_map::cache", %slot, "hit");
            return Ok(word);
        }

        let word = self.inner.read_word(address, slot).await?;
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .insert(address, slot, word);
        Ok(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MemoryWordReader;

    // ── Test helpers ──────────────────────────────────────────────────────────

    fn addr(n: u8) -> Address {
        Address::from([n; 20])
    }

    fn slot(n: u64) -> U256 {
        U256::from(n)
    }

    fn val(n: u8) -> B256 {
        B256::from([n; 32])
    }

    struct FailingReader;

    #[async_trait::async_trait]
    impl WordReader for FailingReader {
        async fn read_word(&self, _address: Address, _slot: U256) -> Result<B256, ReaderError> {
            Err(ReaderError::Transport("connection refused".into()))
        }
    }

    // ── HotWordCache ──────────────────────────────────────────────────────────

    #[test]
    fn test_cache_empty_on_creation() {
        let cache = HotWordCache::new(10);
        assert!(cache.is_empty());
        assert!(cache.stats().is_cold());
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_cache_insert_and_hit() {
        let mut cache = HotWordCache::new(10);
        assert!(cache.get(addr(1), slot(0)).is_none());
        cache.insert(addr(1), slot(0), val(42));
        assert_eq!(cache.get(addr(1), slot(0)), Some(val(42)));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_cache_lru_eviction() {
        let mut cache = HotWordCache::new(3);
        cache.insert(addr(1), slot(0), val(1));
        cache.insert(addr(2), slot(0), val(2));
        cache.insert(addr(3), slot(0), val(3));

        // Touch addr(1) so addr(2) becomes the LRU entry
        cache.get(addr(1), slot(0));
        cache.insert(addr(4), slot(0), val(4));

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(addr(1), slot(0)), Some(val(1)));
        assert!(cache.get(addr(2), slot(0)).is_none(), "addr(2) should be evicted");
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_cache_update_existing_entry() {
        let mut cache = HotWordCache::new(2);
        cache.insert(addr(1), slot(0), val(10));
        cache.insert(addr(1), slot(0), val(20));
        assert_eq!(cache.get(addr(1), slot(0)), Some(val(20)));
        assert_eq!(cache.len(), 1, "update should not create duplicate");
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_cache_invalidate_address() {
        let mut cache = HotWordCache::new(10);
        cache.insert(addr(1), slot(0), val(1));
        cache.insert(addr(1), slot(1), val(2));
        cache.insert(addr(2), slot(0), val(3));

        cache.invalidate_address(addr(1));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(addr(1), slot(1)).is_none());
        assert_eq!(cache.get(addr(2), slot(0)), Some(val(3)));
    }

    #[test]
    fn test_cache_zero_capacity_is_raised() {
        let mut cache = HotWordCache::new(0);
        cache.insert(addr(1), slot(0), val(1));
        cache.insert(addr(2), slot(0), val(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(addr(2), slot(0)), Some(val(2)));
    }

    // ── CachedWordReader ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cached_reader_miss_then_hit() {
        let mut storage = MemoryWordReader::new();
        storage.set_word(addr(1), slot(5), val(99));
        let reader = CachedWordReader::new(storage, CacheConfig::default());

        assert_eq!(reader.read_word(addr(1), slot(5)).await.unwrap(), val(99));
        assert_eq!(reader.read_word(addr(1), slot(5)).await.unwrap(), val(99));

        assert_eq!(reader.stats().misses, 1);
        assert_eq!(reader.stats().hits, 1);
        assert_eq!(reader.inner().reads(), 1, "second read served from cache");
    }

    #[tokio::test]
    async fn test_cached_reader_caches_empty_words() {
        let reader = CachedWordReader::new(MemoryWordReader::new(), CacheConfig::default());
        assert_eq!(reader.read_word(addr(1), slot(0)).await.unwrap(), B256::ZERO);
        assert_eq!(reader.read_word(addr(1), slot(0)).await.unwrap(), B256::ZERO);
        assert_eq!(reader.inner().reads(), 1);
    }

    #[tokio::test]
    async fn test_cached_reader_does_not_cache_failures() {
        let reader = CachedWordReader::new(FailingReader, CacheConfig::default());
        assert!(reader.read_word(addr(1), slot(0)).await.is_err());
        assert!(reader.read_word(addr(1), slot(0)).await.is_err());
        assert_eq!(reader.stats().misses, 2);
        assert_eq!(reader.stats().current_entries, 0);
    }

    #[tokio::test]
    async fn test_cached_reader_invalidate_and_clear() {
        let mut storage = MemoryWordReader::new();
        storage.set_word(addr(1), slot(0), val(50));
        let reader = CachedWordReader::new(storage, CacheConfig::with_capacity(4));

        reader.read_word(addr(1), slot(0)).await.unwrap();
        reader.invalidate_address(addr(1));
        reader.read_word(addr(1), slot(0)).await.unwrap();
        reader.clear();
        reader.read_word(addr(1), slot(0)).await.unwrap();

        assert_eq!(reader.stats().misses, 3);
        assert_eq!(reader.inner().reads(), 3);
    }

    #[tokio::test]
    async fn test_shared_cache_between_readers() {
        let mut storage = MemoryWordReader::new();
        storage.set_word(addr(1), slot(0), val(7));
        let storage = Arc::new(storage);

        let first = CachedWordReader::new(Arc::clone(&storage), CacheConfig::default());
        let second = CachedWordReader::new_shared(Arc::clone(&storage), first.shared_cache());

        first.read_word(addr(1), slot(0)).await.unwrap();
        second.read_word(addr(1), slot(0)).await.unwrap();

        assert_eq!(storage.reads(), 1);
        assert_eq!(second.stats().hits, 1);
    }
}
