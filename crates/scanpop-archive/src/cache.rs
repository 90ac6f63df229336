//! Content-addressed scanline cache with LRU eviction.
//!
//! Rows are looked up by a cheap hash of their bytes, then confirmed by an
//! exact byte comparison against every candidate sharing that hash. Hash
//! collisions are expected and never produce a false hit.

use std::collections::{BTreeMap, HashMap};

use crate::error::{ArchiveError, Result};

/// Default number of cached scanlines: four 1080-line frames.
pub const DEFAULT_CACHE_CAPACITY: usize = 4 * 1080;

/// Row hash used to bucket cache entries.
pub type RowHashFn = fn(&[u8]) -> u64;

/// Polynomial rolling hash over every byte of the row.
pub fn rolling_hash(row: &[u8]) -> u64 {
    row.iter()
        .fold(0u64, |h, &b| h.wrapping_mul(31).wrapping_add(u64::from(b)))
}

/// Outcome of [`ScanlineCache::lookup_or_insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Content already stored by the `New` record at this data offset.
    Hit(u64),
    /// First sighting; the row was registered at the caller's offset.
    Miss,
}

/// Running counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
struct CacheEntry {
    row: Box<[u8]>,
    offset: u64,
    tick: u64,
    hash: u64,
}

/// Bounded map from scanline content to the data offset of its `New` record.
///
/// Every call to [`lookup_or_insert`](Self::lookup_or_insert) advances a
/// logical clock by one. Entries are ordered by the tick of their last use
/// and the oldest are evicted once the cache grows past its capacity.
#[derive(Debug)]
pub struct ScanlineCache {
    capacity: usize,
    clock: u64,
    hash_fn: RowHashFn,
    slots: Vec<Option<CacheEntry>>,
    free: Vec<usize>,
    buckets: HashMap<u64, Vec<usize>>,
    recency: BTreeMap<u64, usize>,
    len: usize,
    stats: CacheStats,
}

impl ScanlineCache {
    /// Create an empty cache using [`rolling_hash`].
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hasher(capacity, rolling_hash)
    }

    /// Create an empty cache with a custom row hash.
    pub fn with_hasher(capacity: usize, hash_fn: RowHashFn) -> Result<Self> {
        if capacity == 0 {
            return Err(ArchiveError::InvalidConfig(
                "cache capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            clock: 0,
            hash_fn,
            slots: Vec::new(),
            free: Vec::new(),
            buckets: HashMap::new(),
            recency: BTreeMap::new(),
            len: 0,
            stats: CacheStats::default(),
        })
    }

    /// Look `row` up; on a miss, register it as stored at `offset`.
    ///
    /// `offset` must be the data-file position the caller is about to write
    /// the row's `New` record to. A hit refreshes the entry's recency and
    /// returns the offset recorded when the content was first seen.
    pub fn lookup_or_insert(&mut self, row: &[u8], offset: u64) -> Lookup {
        let tick = self.clock;
        self.clock += 1;
        let hash = (self.hash_fn)(row);

        if let Some(slot) = self.find(hash, row) {
            if let Some(entry) = self.slots[slot].as_mut() {
                self.recency.remove(&entry.tick);
                entry.tick = tick;
                self.recency.insert(tick, slot);
                self.stats.hits += 1;
                return Lookup::Hit(entry.offset);
            }
        }

        let entry = CacheEntry {
            row: row.into(),
            offset,
            tick,
            hash,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.buckets.entry(hash).or_default().push(slot);
        self.recency.insert(tick, slot);
        self.len += 1;
        self.stats.misses += 1;

        self.evict_overflow();
        Lookup::Miss
    }

    /// True if a row with exactly these bytes is cached. Does not touch recency.
    pub fn contains(&self, row: &[u8]) -> bool {
        self.find((self.hash_fn)(row), row).is_some()
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current logical clock: the number of lookups performed so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn find(&self, hash: u64, row: &[u8]) -> Option<usize> {
        self.buckets.get(&hash)?.iter().copied().find(|&slot| {
            self.slots[slot]
                .as_ref()
                .is_some_and(|entry| entry.row.as_ref() == row)
        })
    }

    fn evict_overflow(&mut self) {
        while self.len > self.capacity {
            let Some((tick, slot)) = self.recency.pop_first() else {
                break;
            };
            let Some(entry) = self.slots.get_mut(slot).and_then(Option::take) else {
                continue;
            };

            if let Some(bucket) = self.buckets.get_mut(&entry.hash) {
                bucket.retain(|&s| s != slot);
                if bucket.is_empty() {
                    self.buckets.remove(&entry.hash);
                }
            }
            self.free.push(slot);
            self.len -= 1;
            self.stats.evictions += 1;
            tracing::trace!(tick, offset = entry.offset, "evicted scanline");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tag: u8) -> [u8; 4] {
        [tag, tag, 0, tag]
    }

    fn colliding_hash(_row: &[u8]) -> u64 {
        7
    }

    #[test]
    fn miss_then_hit_returns_first_offset() {
        let mut cache = ScanlineCache::new(4).unwrap();
        assert_eq!(cache.lookup_or_insert(&row(1), 0), Lookup::Miss);
        assert_eq!(cache.lookup_or_insert(&row(1), 5), Lookup::Hit(0));
        assert_eq!(cache.lookup_or_insert(&row(1), 14), Lookup::Hit(0));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn clock_advances_on_hit_and_miss() {
        let mut cache = ScanlineCache::new(4).unwrap();
        cache.lookup_or_insert(&row(1), 0);
        cache.lookup_or_insert(&row(1), 1);
        cache.lookup_or_insert(&row(2), 2);
        assert_eq!(cache.clock(), 3);
    }

    #[test]
    fn overflow_evicts_first_inserted() {
        let capacity = 3;
        let mut cache = ScanlineCache::new(capacity).unwrap();
        for tag in 0..=capacity as u8 {
            assert_eq!(cache.lookup_or_insert(&row(tag), tag as u64), Lookup::Miss);
        }

        assert_eq!(cache.len(), capacity);
        assert!(!cache.contains(&row(0)));
        assert!((1..=capacity as u8).all(|tag| cache.contains(&row(tag))));
        assert_eq!(cache.stats().evictions, 1);

        // Evicted content registers again at its new offset.
        assert_eq!(cache.lookup_or_insert(&row(0), 99), Lookup::Miss);
        assert_eq!(cache.lookup_or_insert(&row(0), 120), Lookup::Hit(99));
    }

    #[test]
    fn hit_protects_old_entry_from_eviction() {
        let mut cache = ScanlineCache::new(3).unwrap();
        cache.lookup_or_insert(&row(0), 0);
        cache.lookup_or_insert(&row(1), 1);
        cache.lookup_or_insert(&row(2), 2);

        // Touch the oldest entry; row(1) is now least recently used.
        assert_eq!(cache.lookup_or_insert(&row(0), 3), Lookup::Hit(0));
        cache.lookup_or_insert(&row(3), 4);

        assert!(cache.contains(&row(0)));
        assert!(!cache.contains(&row(1)));
        assert!(cache.contains(&row(2)));
        assert!(cache.contains(&row(3)));
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = ScanlineCache::new(5).unwrap();
        for i in 0..200u64 {
            let r = [(i % 17) as u8, (i % 13) as u8];
            cache.lookup_or_insert(&r, i);
            assert!(cache.len() <= cache.capacity());
        }
    }

    #[test]
    fn collisions_resolved_by_content() {
        let mut cache = ScanlineCache::with_hasher(8, colliding_hash).unwrap();
        assert_eq!(cache.lookup_or_insert(&[1, 2], 0), Lookup::Miss);
        assert_eq!(cache.lookup_or_insert(&[2, 1], 10), Lookup::Miss);
        assert_eq!(cache.lookup_or_insert(&[2, 1], 20), Lookup::Hit(10));
        assert_eq!(cache.lookup_or_insert(&[1, 2], 30), Lookup::Hit(0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn eviction_under_collisions_keeps_bucket_consistent() {
        let mut cache = ScanlineCache::with_hasher(2, colliding_hash).unwrap();
        cache.lookup_or_insert(&[1], 0);
        cache.lookup_or_insert(&[2], 1);
        cache.lookup_or_insert(&[3], 2);

        assert!(!cache.contains(&[1]));
        assert_eq!(cache.lookup_or_insert(&[2], 3), Lookup::Hit(1));
        assert_eq!(cache.lookup_or_insert(&[3], 4), Lookup::Hit(2));
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut cache = ScanlineCache::new(1).unwrap();
        for i in 0..10u8 {
            cache.lookup_or_insert(&[i], i as u64);
        }
        assert_eq!(cache.slots.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            ScanlineCache::new(0),
            Err(ArchiveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rolling_hash_depends_on_order() {
        assert_ne!(rolling_hash(&[1, 2]), rolling_hash(&[2, 1]));
        assert_eq!(rolling_hash(&[]), 0);
    }
}
