//! Search pipeline: listing, capped resolution, attribute filters, pagination.
//!
//! [`QueryPipeline::search`] turns [`QueryCriteria`] into a [`ResultPage`].
//! The identifier list is capped at `resolve_cap` *before* resolution. The
//! cap is a hard bound on batch latency (misses cost one pacing interval
//! each), so matches past the cap are never seen.

mod era;
mod page;

pub use era::{Era, ParseEraError};
pub use page::{PageWindow, page_window};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::collection::{CollectionApi, FetchError, ListingQuery, Record, validate_term};
use crate::resolve::BatchResolver;

/// Default number of identifiers resolved per search.
pub const DEFAULT_RESOLVE_CAP: usize = 15;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// User-visible search failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The term cannot be expressed as a listing request.
    #[error("invalid search term {term:?}: {reason}")]
    InvalidQuery { term: String, reason: &'static str },
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryCriteria {
    /// Free-text term. Blank means "no query".
    pub term: String,
    /// Department identifier, 0 for any.
    pub department: u32,
    /// Temporal bucket.
    pub era: Era,
    /// Requested 1-based page.
    pub page: usize,
}

impl QueryCriteria {
    /// Criteria for `term` on page 1 with no other constraint.
    #[must_use]
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            department: 0,
            era: Era::Unconstrained,
            page: 1,
        }
    }

    /// Restricts to one department (0 clears the constraint).
    #[must_use]
    pub fn department(mut self, department: u32) -> Self {
        self.department = department;
        self
    }

    /// Restricts to one era.
    #[must_use]
    pub fn era(mut self, era: Era) -> Self {
        self.era = era;
        self
    }

    /// Selects the page to return.
    #[must_use]
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// True when `record` passes the era and department constraints.
    ///
    /// A record with an unknown department (0) is kept: the upstream
    /// listing already applied the department filter.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let department_ok = self.department == 0
            || record.department_id == 0
            || record.department_id == self.department;
        department_ok && self.era.matches(record)
    }
}

/// One page of filtered search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    pub records: Vec<Record>,
    /// Echo of the search term.
    pub query: String,
    pub department: u32,
    pub era: Era,
    pub current_page: usize,
    pub total_pages: usize,
    /// Number of records that passed the filters, across all pages.
    pub total_count: usize,
}

impl ResultPage {
    /// The "no results" page for `criteria`.
    #[must_use]
    pub fn empty(criteria: &QueryCriteria) -> Self {
        Self {
            records: Vec::new(),
            query: criteria.term.clone(),
            department: criteria.department,
            era: criteria.era,
            current_page: 1,
            total_pages: 0,
            total_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Size knobs for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Hard cap on identifiers handed to the resolver.
    pub resolve_cap: usize,
    /// Records per page.
    pub page_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            resolve_cap: DEFAULT_RESOLVE_CAP,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Runs searches against the collection.
#[derive(Clone)]
pub struct QueryPipeline {
    api: Arc<dyn CollectionApi>,
    resolver: BatchResolver,
    settings: PipelineSettings,
}

impl std::fmt::Debug for QueryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPipeline")
            .field("settings", &self.settings)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl QueryPipeline {
    #[must_use]
    pub fn new(
        api: Arc<dyn CollectionApi>,
        resolver: BatchResolver,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            api,
            resolver,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Runs one search and returns the requested page.
    ///
    /// A blank term, an empty listing, or a listing that fails for any
    /// reason other than an unusable term all yield an empty page.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuery`] when the term contains control
    /// characters.
    #[instrument(skip(self), fields(term = %criteria.term, era = %criteria.era))]
    pub async fn search(&self, criteria: &QueryCriteria) -> Result<ResultPage, QueryError> {
        let term = criteria.term.trim();
        if term.is_empty() {
            debug!("blank term; returning empty page");
            return Ok(ResultPage::empty(criteria));
        }
        check_term(term)?;

        let department = (criteria.department != 0).then_some(criteria.department);
        let listing = match self
            .api
            .fetch_listing(&ListingQuery::search(term, department))
            .await
        {
            Ok(listing) => listing,
            Err(FetchError::InvalidQuery { term, reason }) => {
                return Err(QueryError::InvalidQuery { term, reason });
            }
            Err(error) => {
                warn!(kind = %error.kind(), error = %error, "listing failed; returning empty page");
                return Ok(ResultPage::empty(criteria));
            }
        };

        if listing.is_empty() {
            debug!("listing is empty");
            return Ok(ResultPage::empty(criteria));
        }

        let mut ids = listing.ids;
        if ids.len() > self.settings.resolve_cap {
            debug!(
                listed = ids.len(),
                cap = self.settings.resolve_cap,
                "truncating listing to resolve cap"
            );
            ids.truncate(self.settings.resolve_cap);
        }

        let resolved = self.resolver.resolve(&ids).await;
        let filtered = filter_records(resolved, criteria);
        let window = page_window(filtered.len(), criteria.page, self.settings.page_size);

        info!(
            listed = listing.total,
            matched = filtered.len(),
            page = window.page,
            total_pages = window.total_pages,
            "search complete"
        );

        let total_count = filtered.len();
        let records = filtered
            .into_iter()
            .skip(window.range.start)
            .take(window.range.len())
            .collect();

        Ok(ResultPage {
            records,
            query: criteria.term.clone(),
            department: criteria.department,
            era: criteria.era,
            current_page: window.page,
            total_pages: window.total_pages,
            total_count,
        })
    }
}

/// Keeps the records that pass `criteria`, preserving order.
#[must_use]
pub fn filter_records(records: Vec<Record>, criteria: &QueryCriteria) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

/// Rejects a term that cannot be sent as a listing request.
pub(crate) fn check_term(term: &str) -> Result<(), QueryError> {
    match validate_term(term) {
        Err(FetchError::InvalidQuery { term, reason }) => {
            Err(QueryError::InvalidQuery { term, reason })
        }
        _ => Ok(()),
    }
}
