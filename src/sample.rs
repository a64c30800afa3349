//! Random selection of distinct records from a listing pool.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::collection::{CollectionApi, FetchError, ListingQuery, Record, RecordId};
use crate::query::{QueryError, check_term};
use crate::resolve::BatchResolver;

/// Default number of records drawn for the random view.
pub const DEFAULT_SAMPLE_SIZE: usize = 20;

/// Draws random records from a listing pool.
#[derive(Clone)]
pub struct Sampler {
    api: Arc<dyn CollectionApi>,
    resolver: BatchResolver,
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl Sampler {
    #[must_use]
    pub fn new(api: Arc<dyn CollectionApi>, resolver: BatchResolver) -> Self {
        Self { api, resolver }
    }

    /// Picks up to `count` distinct identifiers from the `pool` listing and
    /// resolves them.
    ///
    /// The result can be shorter than `count`: the pool may be small, and
    /// resolution drops failures and undepictable records. A listing that
    /// fails for any reason other than an unusable term yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuery`] when a search pool has a blank
    /// term or one with control characters.
    #[instrument(skip(self))]
    pub async fn sample(
        &self,
        pool: &ListingQuery,
        count: usize,
    ) -> Result<Vec<Record>, QueryError> {
        if let ListingQuery::Search { term, .. } = pool {
            check_term(term)?;
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let listing = match self.api.fetch_listing(pool).await {
            Ok(listing) => listing,
            Err(FetchError::InvalidQuery { term, reason }) => {
                return Err(QueryError::InvalidQuery { term, reason });
            }
            Err(error) => {
                warn!(kind = %error.kind(), error = %error, "sample pool listing failed");
                return Ok(Vec::new());
            }
        };
        if listing.is_empty() {
            debug!("sample pool is empty");
            return Ok(Vec::new());
        }

        // ThreadRng is !Send; keep it out of the await below.
        let picked = {
            let mut rng = rand::thread_rng();
            pick_distinct(&listing.ids, count, &mut rng)
        };
        debug!(pool = listing.ids.len(), picked = picked.len(), "sample drawn");

        Ok(self.resolver.resolve(&picked).await)
    }
}

/// Draws `min(count, distinct ids in pool)` distinct identifiers uniformly
/// at random by rejection sampling.
///
/// Duplicates in `pool` are tolerated: the target is bounded by the number
/// of distinct identifiers, so the loop always terminates.
pub fn pick_distinct<R: Rng + ?Sized>(
    pool: &[RecordId],
    count: usize,
    rng: &mut R,
) -> Vec<RecordId> {
    if pool.is_empty() || count == 0 {
        return Vec::new();
    }

    let distinct = pool.iter().collect::<HashSet<_>>().len();
    let target = count.min(distinct);

    let mut chosen = HashSet::with_capacity(target);
    let mut picked = Vec::with_capacity(target);
    while picked.len() < target {
        let id = pool[rng.gen_range(0..pool.len())];
        if chosen.insert(id) {
            picked.push(id);
        }
    }
    picked
}
