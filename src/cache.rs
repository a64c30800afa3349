//! Process-lifetime cache of resolved records.
//!
//! Entries are written at most once per identifier and never updated or
//! evicted, so a reader either sees nothing or a complete record.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::collection::{Record, RecordId};

/// Concurrency-safe identifier to record map with insert-if-absent semantics.
///
/// Designed to be wrapped in `Arc` and handed to every component that needs
/// it. `DashMap` shards the key space, so writers of different identifiers
/// rarely contend. No guard is ever held across an `.await`.
#[derive(Debug, Default)]
pub struct RecordCache {
    entries: DashMap<RecordId, Record>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time counters for a [`RecordCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0 when nothing was looked up.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl RecordCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached record, counting the lookup.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record> {
        let found = self.entries.get(&id).map(|entry| entry.value().clone());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Returns true when `id` is cached, without touching the counters.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Inserts `record` under `id` unless an entry already exists.
    ///
    /// Returns true when the entry was new. An existing entry is left as is.
    pub fn put(&self, id: RecordId, record: Record) -> bool {
        match self.entries.entry(id) {
            Entry::Occupied(_) => {
                trace!(id, "cache entry already present; keeping first write");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Inserts `record` unless `id` is already cached, then returns the stored record.
    ///
    /// When two requests race on the same identifier, both walk away with
    /// the first write.
    pub fn get_or_insert(&self, id: RecordId, record: Record) -> Record {
        match self.entries.entry(id) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => slot.insert(record).value().clone(),
        }
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached identifiers in unspecified order.
    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }

    /// Current hit/miss counters and entry count.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
