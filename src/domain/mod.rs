//! Pure market domain: snapshot aggregation and sell-route advice.
//!
//! Everything here is synchronous and side-effect free; the async plumbing
//! around it lives in `crate::infra`.

pub mod advisor;
pub mod entities;
pub mod snapshot;
pub mod zones;

pub use advisor::{AdvisorConfig, ModeWeights, TradeAdvisor};
pub use entities::{
    CityMarketStat, CityRecommendation, PriceSample, PriceStrategy, TradeMode, TradeScenario,
    TransportContext,
};
pub use snapshot::build_snapshot;
pub use zones::{RiskModel, Zone, ROYAL_CITIES};
