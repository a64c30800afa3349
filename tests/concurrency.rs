//! Stress tests: many concurrent batches sharing one cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gallery_core::cache::RecordCache;
use gallery_core::collection::{
    CollectionApi, Department, FetchError, Listing, ListingQuery, Record, RecordId,
};
use gallery_core::resolve::{BatchResolver, ResolverSettings};
use tokio::task::JoinSet;

/// Deterministic upstream: multiples of 7 are undepictable, multiples of 11 fail.
#[derive(Default)]
struct SyntheticApi {
    fetches: AtomicUsize,
}

fn synthetic(id: RecordId) -> Record {
    let mut record = Record::new(id);
    record.title = format!("Object {id}");
    if id % 7 != 0 {
        record.image_small = format!("https://images.test/{id}.jpg");
    }
    record.begin_year = i32::try_from(id % 2000).unwrap_or(0);
    record
}

#[async_trait]
impl CollectionApi for SyntheticApi {
    async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if id % 11 == 0 {
            return Err(FetchError::from_status(format!("synthetic://{id}"), 500, None));
        }
        Ok(synthetic(id))
    }

    async fn fetch_listing(&self, _query: &ListingQuery) -> Result<Listing, FetchError> {
        Ok(Listing::default())
    }

    async fn fetch_departments(&self) -> Result<Vec<Department>, FetchError> {
        Ok(Vec::new())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_overlapping_batches_leave_cache_equal_to_union() {
    let api = Arc::new(SyntheticApi::default());
    let cache = Arc::new(RecordCache::new());
    let resolver = BatchResolver::new(
        api.clone(),
        Arc::clone(&cache),
        ResolverSettings {
            pacing: Duration::ZERO,
            ..ResolverSettings::default()
        },
    );

    let mut tasks = JoinSet::new();
    for worker in 0..32_u64 {
        let resolver = resolver.clone();
        tasks.spawn(async move {
            // Each worker covers a window overlapping its neighbours.
            let ids: Vec<RecordId> = (worker * 10..worker * 10 + 60).collect();
            resolver.resolve(&ids).await
        });
    }

    let mut union: HashSet<RecordId> = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        let records = joined.expect("resolver task panicked");
        for record in records {
            assert!(record.is_depictable());
            assert_eq!(record, synthetic(record.id));
            union.insert(record.id);
        }
    }

    let cached: HashSet<RecordId> = cache.ids().into_iter().collect();
    assert_eq!(cached, union);
    for id in &cached {
        assert_eq!(cache.get(*id), Some(synthetic(*id)));
        assert!(id % 7 != 0 && id % 11 != 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sequential_batches_fetch_each_identifier_once() {
    let api = Arc::new(SyntheticApi::default());
    let resolver = BatchResolver::new(
        api.clone(),
        Arc::new(RecordCache::new()),
        ResolverSettings {
            pacing: Duration::ZERO,
            ..ResolverSettings::default()
        },
    );

    let ids: Vec<RecordId> = (1..=50).collect();
    resolver.resolve(&ids).await;
    let after_first = api.fetches.load(Ordering::SeqCst);
    assert_eq!(after_first, 50);

    // Only undepictable and failed ids are misses the second time.
    resolver.resolve(&ids).await;
    let refetched = api.fetches.load(Ordering::SeqCst) - after_first;
    let uncacheable = ids.iter().filter(|id| *id % 7 == 0 || *id % 11 == 0).count();
    assert_eq!(refetched, uncacheable);
}
