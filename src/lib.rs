//! Market snapshots and sell-route recommendations for Albion Online traders.
//!
//! The crate splits along the same seam as the game data itself:
//!
//! - [`domain`] is the pure core. [`domain::build_snapshot`] folds raw
//!   per-city price samples into one statistic per city, and
//!   [`domain::TradeAdvisor`] ranks destination cities for a sale under a
//!   chosen mode, strategy, and scenario.
//! - [`infra`] supplies the async collaborators: a reqwest client for the
//!   upstream price feed, a short-TTL snapshot cache, and the
//!   [`infra::AdvisoryService`] facade a web layer embeds.
//!
//! The core takes already-fetched data, so it runs (and tests) without any
//! network access.

pub mod domain;
pub mod infra;

pub use domain::{
    build_snapshot, CityMarketStat, CityRecommendation, PriceSample, PriceStrategy, RiskModel,
    TradeAdvisor, TradeMode, TradeScenario, TransportContext,
};
pub use infra::{AdvisoryError, AdvisoryService, MarketApiClient, SnapshotCache};
