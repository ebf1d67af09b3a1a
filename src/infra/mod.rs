//! Async collaborators around the pure core: the upstream price client, a
//! short-TTL snapshot cache, and the advisory service facade.

pub mod cache;
pub mod market_api;
pub mod service;

pub use cache::{SnapshotCache, SNAPSHOT_CACHE_TTL};
pub use market_api::{CacheStatus, CachedPayload, MarketApiClient, MarketApiError};
pub use service::{AdvisoryError, AdvisoryService};
