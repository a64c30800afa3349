//! Remote collection API: wire types, error taxonomy and the HTTP client.
//!
//! # Architecture
//!
//! - [`CollectionApi`] - Async trait the resolver, pipeline and sampler depend on
//! - [`CollectionClient`] - Reqwest implementation against the upstream endpoints
//! - [`FetchError`] - Classified failures (network, upstream, throttled, decode)
//! - [`Record`], [`Listing`], [`Department`] - Decoded upstream documents
//!
//! The client never retries. Whoever calls it decides on pacing and backoff.
//!
//! # Example
//!
//! ```no_run
//! use gallery_core::collection::{CollectionApi, CollectionClient, ListingQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CollectionClient::new()?;
//! let listing = client
//!     .fetch_listing(&ListingQuery::search("sunflowers", None))
//!     .await?;
//! if let Some(first) = listing.ids.first() {
//!     let record = client.fetch_record(*first).await?;
//!     println!("{}: {}", record.id, record.title);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod http_client;
mod model;

pub use client::{CollectionClient, DEFAULT_BASE_URL, validate_term};
pub use error::{FailureKind, FetchError, is_throttle_status};
pub use http_client::{CONNECT_TIMEOUT_SECS, HttpSettings, REQUEST_TIMEOUT_SECS};
pub use model::{Department, Listing, Record, RecordId};

use async_trait::async_trait;

/// Which identifier listing to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingQuery {
    /// Free-text search restricted to depictable items, optionally within a department.
    Search {
        term: String,
        department: Option<u32>,
    },
    /// Full-catalog listing.
    Catalog,
}

impl ListingQuery {
    /// Convenience constructor for a search listing.
    #[must_use]
    pub fn search(term: impl Into<String>, department: Option<u32>) -> Self {
        Self::Search {
            term: term.into(),
            department,
        }
    }
}

/// Request/response contract of the upstream collection.
///
/// Uses `async_trait` so components can hold `Arc<dyn CollectionApi>`;
/// tests substitute in-memory implementations.
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// Fetches one record by identifier.
    async fn fetch_record(&self, id: RecordId) -> Result<Record, FetchError>;

    /// Fetches an identifier listing.
    async fn fetch_listing(&self, query: &ListingQuery) -> Result<Listing, FetchError>;

    /// Fetches the department list.
    async fn fetch_departments(&self) -> Result<Vec<Department>, FetchError>;
}
