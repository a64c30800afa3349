//! Gallery Core Library
//!
//! Resolves records from a remote museum collection behind a shared
//! in-process cache, and turns searches into filtered, paginated pages.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`collection`] - Upstream API client, wire types and error taxonomy
//! - [`cache`] - Write-once, concurrency-safe record cache
//! - [`resolve`] - Paced batch resolution of identifier lists
//! - [`query`] - Search pipeline: cap, resolve, era/department filter, paginate
//! - [`sample`] - Random distinct selection from a listing pool
//! - [`config`] - TOML configuration
//! - [`gallery`] - Facade wiring the above together
//!
//! Data flows `query`/`sample` -> `resolve` -> (`cache` | `collection`).

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod collection;
pub mod config;
pub mod gallery;
pub mod query;
pub mod resolve;
pub mod sample;
mod user_agent;

// Re-export commonly used types
pub use cache::{CacheStats, RecordCache};
pub use collection::{
    CollectionApi, CollectionClient, Department, FailureKind, FetchError, Listing, ListingQuery,
    Record, RecordId,
};
pub use config::{ConfigError, GalleryConfig};
pub use gallery::Gallery;
pub use query::{Era, QueryCriteria, QueryError, QueryPipeline, ResultPage};
pub use resolve::{BatchReport, BatchResolver, ResolveOutcome, ResolverSettings, ResultOrder};
pub use sample::{Sampler, pick_distinct};
