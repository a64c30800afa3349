//! Reqwest-backed client for the remote collection API.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::http_client::{HttpSettings, build_http_client};
use super::model::{Department, DepartmentsResponse, Listing, Record, RecordId};
use super::{CollectionApi, FetchError, ListingQuery};
use crate::resolve::parse_retry_after;

/// Public collection API of the Metropolitan Museum of Art.
pub const DEFAULT_BASE_URL: &str = "https://collectionapi.metmuseum.org/public/collection/v1";

/// Client for the collection endpoints.
///
/// Performs exactly one request per call; retry and pacing policy belong to
/// the caller. Create once and share: the inner reqwest client pools
/// connections.
#[derive(Clone)]
pub struct CollectionClient {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for CollectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CollectionClient {
    /// Creates a client against the default public endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL, &HttpSettings::default())
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `base_url` is not an absolute
    /// http(s) URL or when the HTTP client cannot be built.
    #[instrument(skip(settings), fields(timeout_ms = settings.request_timeout.as_millis()))]
    pub fn with_base_url(base_url: &str, settings: &HttpSettings) -> Result<Self, FetchError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|_| FetchError::invalid_url(base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(base_url));
        }

        let client = build_http_client(settings).map_err(|reason| {
            warn!(%reason, "collection client construction failed");
            FetchError::invalid_url(base_url)
        })?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    /// Returns the normalized base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for a listing query.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidQuery`] for a blank or control-character
    /// search term.
    pub fn listing_url(&self, query: &ListingQuery) -> Result<String, FetchError> {
        match query {
            ListingQuery::Catalog => Ok(format!("{}/objects", self.base_url)),
            ListingQuery::Search { term, department } => {
                validate_term(term)?;
                let mut url = Url::parse(&format!("{}/search", self.base_url))
                    .map_err(|_| FetchError::invalid_url(&self.base_url))?;
                {
                    let mut pairs = url.query_pairs_mut();
                    pairs.append_pair("q", term.trim());
                    pairs.append_pair("hasImages", "true");
                    if let Some(department) = department.filter(|id| *id != 0) {
                        pairs.append_pair("departmentId", &department.to_string());
                    }
                }
                Ok(url.into())
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            let error = FetchError::from_status(url, status.as_u16(), retry_after);
            if matches!(error, FetchError::Throttled { .. }) {
                warn!(
                    url,
                    status = status.as_u16(),
                    retry_after = ?retry_after,
                    "upstream throttled request"
                );
            } else {
                debug!(url, status = status.as_u16(), "upstream returned error status");
            }
            return Err(error);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::decode(url, e))
    }
}

#[async_trait]
impl CollectionApi for CollectionClient {
    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError> {
        let url = format!("{}/objects/{id}", self.base_url);
        let record: Record = self.get_json(&url).await?;
        if record.id != id {
            return Err(FetchError::decode(
                url,
                format!("expected objectID {id}, got {}", record.id),
            ));
        }
        Ok(record)
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_listing(&self, query: &ListingQuery) -> Result<Listing, FetchError> {
        let url = self.listing_url(query)?;
        let listing: Listing = self.get_json(&url).await?;
        debug!(total = listing.total, ids = listing.ids.len(), "listing fetched");
        Ok(listing)
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_departments(&self) -> Result<Vec<Department>, FetchError> {
        let url = format!("{}/departments", self.base_url);
        let response: DepartmentsResponse = self.get_json(&url).await?;
        Ok(response.departments)
    }
}

/// Checks that `term` can be sent as a search query.
///
/// # Errors
///
/// Returns [`FetchError::InvalidQuery`] for a blank term or one containing
/// control characters.
pub fn validate_term(term: &str) -> Result<(), FetchError> {
    if term.trim().is_empty() {
        return Err(FetchError::invalid_query(term, "search term is empty"));
    }
    if term.chars().any(char::is_control) {
        return Err(FetchError::invalid_query(
            term,
            "search term contains control characters",
        ));
    }
    Ok(())
}
