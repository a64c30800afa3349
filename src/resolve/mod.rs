//! Batch resolution of identifier lists into records.
//!
//! [`BatchResolver`] serves cache hits immediately, then fetches misses one
//! at a time under a per-batch [`Pacer`]. Misses are never fetched in
//! parallel within a batch: the pacing interval has to add up across the
//! whole miss set. Concurrent batches (one per request) proceed
//! independently and only meet inside the shared [`RecordCache`].
//!
//! Failures never abort a batch. Each identifier ends in a
//! [`ResolveOutcome`], and the records that made it are returned in the
//! configured [`ResultOrder`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gallery_core::cache::RecordCache;
//! use gallery_core::collection::CollectionClient;
//! use gallery_core::resolve::{BatchResolver, ResolverSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(CollectionClient::new()?);
//! let cache = Arc::new(RecordCache::new());
//! let resolver = BatchResolver::new(api, cache, ResolverSettings::default());
//! let records = resolver.resolve(&[436535, 437984]).await;
//! println!("resolved {} records", records.len());
//! # Ok(())
//! # }
//! ```

mod pacing;
mod retry;

pub use pacing::{Pacer, parse_retry_after};
pub use retry::{DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_error};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::RecordCache;
use crate::collection::{CollectionApi, FailureKind, FetchError, Record, RecordId};

/// Default pacing interval between network fetches within one batch.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// How hit and miss records are combined in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultOrder {
    /// Cached records first (in input order), then fetched records (in input order).
    #[default]
    HitsFirst,
    /// Original input order, restored by a merge pass.
    Listing,
}

/// Knobs for a [`BatchResolver`].
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Wait before each network fetch. Zero disables pacing.
    pub pacing: Duration,
    /// Output ordering.
    pub order: ResultOrder,
    /// Retry policy for failed fetches.
    pub retry: RetryPolicy,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            order: ResultOrder::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Why an identifier was left out of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fetched fine but has no depiction URL.
    Undepictable,
    /// Every attempt failed.
    Failed(FailureKind),
}

/// Final state of one identifier in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Served from the cache.
    Cached,
    /// Fetched from upstream and cached.
    Fetched,
    /// Dropped from the output.
    Skipped(SkipReason),
}

/// Records plus per-identifier bookkeeping for one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Resolved records in the configured order.
    pub records: Vec<Record>,
    /// One entry per distinct input identifier, in input order.
    pub outcomes: Vec<(RecordId, ResolveOutcome)>,
    /// Number of upstream record requests issued, retries included.
    pub network_fetches: usize,
}

impl BatchReport {
    /// Number of identifiers served from the cache.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.count(|outcome| outcome == ResolveOutcome::Cached)
    }

    /// Number of identifiers fetched from upstream.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.count(|outcome| outcome == ResolveOutcome::Fetched)
    }

    /// Number of identifiers dropped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResolveOutcome::Skipped(_)))
    }

    /// Outcome recorded for `id`, if it was part of the batch.
    #[must_use]
    pub fn outcome(&self, id: RecordId) -> Option<ResolveOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, outcome)| *outcome)
    }

    fn count(&self, predicate: impl Fn(ResolveOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(*outcome))
            .count()
    }
}

/// Resolves identifier lists through the cache and the remote collection.
#[derive(Clone)]
pub struct BatchResolver {
    api: Arc<dyn CollectionApi>,
    cache: Arc<RecordCache>,
    settings: ResolverSettings,
}

impl std::fmt::Debug for BatchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchResolver")
            .field("settings", &self.settings)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl BatchResolver {
    /// Creates a resolver over `api`, sharing `cache` with other components.
    #[must_use]
    pub fn new(
        api: Arc<dyn CollectionApi>,
        cache: Arc<RecordCache>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            api,
            cache,
            settings,
        }
    }

    /// The shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    /// The active settings.
    #[must_use]
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolves `ids` to records, dropping failures and undepictable records.
    pub async fn resolve(&self, ids: &[RecordId]) -> Vec<Record> {
        self.resolve_detailed(ids).await.records
    }

    /// Resolves `ids` and reports what happened to each identifier.
    ///
    /// Duplicate identifiers collapse to their first occurrence, so no
    /// identifier is fetched twice within one batch.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn resolve_detailed(&self, ids: &[RecordId]) -> BatchReport {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<RecordId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut outcomes: Vec<(RecordId, ResolveOutcome)> = Vec::with_capacity(unique.len());
        let mut hits: Vec<(usize, Record)> = Vec::new();
        let mut misses: Vec<(usize, RecordId)> = Vec::new();

        for (position, id) in unique.iter().copied().enumerate() {
            if let Some(record) = self.cache.get(id) {
                hits.push((position, record));
                outcomes.push((id, ResolveOutcome::Cached));
            } else {
                misses.push((position, id));
                // Placeholder until the fetch settles.
                outcomes.push((id, ResolveOutcome::Fetched));
            }
        }

        debug!(hits = hits.len(), misses = misses.len(), "partitioned batch");

        let mut pacer = Pacer::new(self.settings.pacing);
        let mut fetched: Vec<(usize, Record)> = Vec::with_capacity(misses.len());
        let mut network_fetches = 0;

        for (position, id) in misses {
            let (result, attempts) = self.fetch_with_retry(id, &mut pacer).await;
            network_fetches += attempts;

            let outcome = match result {
                Ok(record) if record.is_depictable() => {
                    let stored = self.cache.get_or_insert(id, record);
                    fetched.push((position, stored));
                    ResolveOutcome::Fetched
                }
                Ok(_) => {
                    debug!(id, "record has no depiction; skipping");
                    ResolveOutcome::Skipped(SkipReason::Undepictable)
                }
                Err(error) => {
                    warn!(id, kind = %error.kind(), error = %error, "skipping unresolved record");
                    ResolveOutcome::Skipped(SkipReason::Failed(error.kind()))
                }
            };
            outcomes[position].1 = outcome;
        }

        let records = combine(hits, fetched, self.settings.order);
        let report = BatchReport {
            records,
            outcomes,
            network_fetches,
        };

        info!(
            resolved = report.records.len(),
            cached = report.cached(),
            fetched = report.fetched(),
            skipped = report.skipped(),
            pacing_ms = pacer.cumulative_delay().as_millis(),
            "batch resolved"
        );
        report
    }

    /// Resolves a single identifier for a detail lookup.
    ///
    /// Unlike a batch, a failure is returned to the caller. `Ok(None)` means
    /// the record exists but has no depiction.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] when every attempt fails.
    #[instrument(skip(self))]
    pub async fn resolve_one(&self, id: RecordId) -> Result<Option<Record>, FetchError> {
        if let Some(record) = self.cache.get(id) {
            return Ok(Some(record));
        }

        let mut pacer = Pacer::new(self.settings.pacing);
        let (result, _) = self.fetch_with_retry(id, &mut pacer).await;
        let record = result?;
        if record.is_depictable() {
            Ok(Some(self.cache.get_or_insert(id, record)))
        } else {
            debug!(id, "record has no depiction");
            Ok(None)
        }
    }

    async fn fetch_with_retry(
        &self,
        id: RecordId,
        pacer: &mut Pacer,
    ) -> (Result<Record, FetchError>, usize) {
        let mut attempt = 1;
        let mut requests = 0;
        loop {
            pacer.pace().await;
            requests += 1;
            let error = match self.api.fetch_record(id).await {
                Ok(record) => return (Ok(record), requests),
                Err(error) => error,
            };

            match self.settings.retry.should_retry(&error, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    debug!(id, attempt, kind = %error.kind(), "retrying record fetch");
                    pacer.wait_extra(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(id, attempt, %reason, "giving up on record");
                    return (Err(error), requests);
                }
            }
        }
    }
}

fn combine(
    hits: Vec<(usize, Record)>,
    fetched: Vec<(usize, Record)>,
    order: ResultOrder,
) -> Vec<Record> {
    let mut combined = hits;
    combined.extend(fetched);
    if order == ResultOrder::Listing {
        combined.sort_by_key(|(position, _)| *position);
    }
    combined.into_iter().map(|(_, record)| record).collect()
}
