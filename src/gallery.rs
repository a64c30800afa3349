//! Application facade wiring config, client, cache and the three views.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::cache::{CacheStats, RecordCache};
use crate::collection::{
    CollectionApi, CollectionClient, Department, FetchError, ListingQuery, Record, RecordId,
};
use crate::config::GalleryConfig;
use crate::query::{QueryCriteria, QueryError, QueryPipeline, ResultPage};
use crate::resolve::BatchResolver;
use crate::sample::Sampler;

/// One process-wide gallery: a single cache shared by every view.
pub struct Gallery {
    api: Arc<dyn CollectionApi>,
    resolver: BatchResolver,
    pipeline: QueryPipeline,
    sampler: Sampler,
    departments: OnceCell<Vec<Department>>,
    config: GalleryConfig,
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("config", &self.config)
            .field("cache", &self.resolver.cache().stats())
            .finish_non_exhaustive()
    }
}

impl Gallery {
    /// Builds a gallery talking to `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when the base URL is unusable or the
    /// HTTP client cannot be built.
    pub fn new(config: GalleryConfig) -> Result<Self, FetchError> {
        let client = CollectionClient::with_base_url(&config.base_url, &config.http_settings())?;
        info!(base_url = client.base_url(), "collection client ready");
        Ok(Self::with_api(
            Arc::new(client),
            Arc::new(RecordCache::new()),
            config,
        ))
    }

    /// Builds a gallery over any [`CollectionApi`] and an existing cache.
    #[must_use]
    pub fn with_api(
        api: Arc<dyn CollectionApi>,
        cache: Arc<RecordCache>,
        config: GalleryConfig,
    ) -> Self {
        let resolver = BatchResolver::new(Arc::clone(&api), cache, config.resolver_settings());
        let pipeline = QueryPipeline::new(
            Arc::clone(&api),
            resolver.clone(),
            config.pipeline_settings(),
        );
        let sampler = Sampler::new(Arc::clone(&api), resolver.clone());
        Self {
            api,
            resolver,
            pipeline,
            sampler,
            departments: OnceCell::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    /// Runs a search and returns one page.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuery`] for a term the upstream cannot
    /// express.
    pub async fn search(&self, criteria: &QueryCriteria) -> Result<ResultPage, QueryError> {
        self.pipeline.search(criteria).await
    }

    /// Draws `sample_size` records from the full catalog.
    ///
    /// # Errors
    ///
    /// Same as [`Gallery::sample`].
    pub async fn random(&self) -> Result<Vec<Record>, QueryError> {
        self.sample(&ListingQuery::Catalog, self.config.sample_size)
            .await
    }

    /// Draws up to `count` records from the `pool` listing.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuery`] for a search pool whose term the
    /// upstream cannot express.
    pub async fn sample(
        &self,
        pool: &ListingQuery,
        count: usize,
    ) -> Result<Vec<Record>, QueryError> {
        self.sampler.sample(pool, count).await
    }

    /// Looks up one record, cache first.
    ///
    /// `Ok(None)` means the record exists upstream but has no depiction.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the failed fetch.
    pub async fn lookup(&self, id: RecordId) -> Result<Option<Record>, FetchError> {
        self.resolver.resolve_one(id).await
    }

    /// Department list for filter menus.
    ///
    /// Fetched once per process on success. A failure yields an empty list
    /// and the next call tries again.
    #[instrument(skip(self))]
    pub async fn departments(&self) -> Vec<Department> {
        let result = self
            .departments
            .get_or_try_init(|| self.api.fetch_departments())
            .await;
        match result {
            Ok(departments) => departments.clone(),
            Err(error) => {
                warn!(kind = %error.kind(), error = %error, "department listing failed");
                Vec::new()
            }
        }
    }

    /// Resolves the configured landing-page selection.
    pub async fn featured(&self) -> Vec<Record> {
        self.resolver.resolve(&self.config.featured_ids).await
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.resolver.cache().stats()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::collection::Listing;

    #[derive(Default)]
    struct FlakyDepartments {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CollectionApi for FlakyDepartments {
        async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError> {
            let mut record = Record::new(id);
            record.image = format!("https://images.test/{id}.jpg");
            Ok(record)
        }

        async fn fetch_listing(&self, _query: &ListingQuery) -> Result<Listing, FetchError> {
            Ok(Listing::default())
        }

        async fn fetch_departments(&self) -> Result<Vec<Department>, FetchError> {
            // First call fails, later calls succeed.
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(FetchError::from_status("fake://departments", 502, None));
            }
            Ok(vec![Department {
                department_id: 11,
                display_name: "European Paintings".to_string(),
            }])
        }
    }

    fn gallery(api: Arc<FlakyDepartments>) -> Gallery {
        let config = GalleryConfig {
            pacing_ms: 0,
            featured_ids: vec![7, 8],
            ..GalleryConfig::default()
        };
        Gallery::with_api(api, Arc::new(RecordCache::new()), config)
    }

    #[tokio::test]
    async fn test_departments_cached_after_first_success() {
        let api = Arc::new(FlakyDepartments::default());
        let gallery = gallery(Arc::clone(&api));

        assert!(gallery.departments().await.is_empty());
        assert_eq!(gallery.departments().await.len(), 1);
        assert_eq!(gallery.departments().await.len(), 1);
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_featured_and_lookup_share_cache() {
        let gallery = gallery(Arc::new(FlakyDepartments::default()));

        let featured = gallery.featured().await;
        assert_eq!(featured.len(), 2);
        let record = gallery.lookup(7).await.unwrap().unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(gallery.cache_stats().entries, 2);
        assert!(gallery.cache_stats().hits >= 1);
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let config = GalleryConfig {
            base_url: "not a url".to_string(),
            ..GalleryConfig::default()
        };
        assert!(matches!(
            Gallery::new(config),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
