//! The advisory facade a boundary layer embeds: fetch, aggregate, advise.

use thiserror::Error;
use tracing::debug;

use crate::domain::{
    build_snapshot, CityMarketStat, CityRecommendation, TradeAdvisor, TransportContext,
};

use super::cache::SnapshotCache;
use super::market_api::{MarketApiClient, MarketApiError};

#[derive(Debug, Error)]
pub enum AdvisoryError {
    /// The upstream has no price samples at all for this item. Distinct from
    /// an `Ok` empty recommendation list, which means "nowhere profitable".
    #[error("no market data for item {0}")]
    NoMarketData(String),
    #[error("unknown item: {0}")]
    ItemNotFound(String),
    #[error("upstream market data error: {0}")]
    Upstream(MarketApiError),
}

impl From<MarketApiError> for AdvisoryError {
    fn from(error: MarketApiError) -> Self {
        match error {
            MarketApiError::ItemNotFound(item) => AdvisoryError::ItemNotFound(item),
            other => AdvisoryError::Upstream(other),
        }
    }
}

/// One constructed instance, shared by reference with whatever serves
/// requests. Holds no request state of its own.
pub struct AdvisoryService {
    client: MarketApiClient,
    cache: SnapshotCache,
    advisor: TradeAdvisor,
}

impl AdvisoryService {
    pub fn new(client: MarketApiClient, cache: SnapshotCache, advisor: TradeAdvisor) -> Self {
        Self {
            client,
            cache,
            advisor,
        }
    }

    pub fn advisor(&self) -> &TradeAdvisor {
        &self.advisor
    }

    /// Aggregated per-city stats for `item_id`, served from the snapshot
    /// cache within its TTL.
    pub async fn snapshot(&self, item_id: &str) -> Result<Vec<CityMarketStat>, AdvisoryError> {
        if let Some(stats) = self.cache.get(item_id).await {
            return Ok(stats);
        }

        let payload = self.client.get_prices(item_id, None).await?;
        let stats = build_snapshot(&payload.data);
        debug!(
            item_id,
            cities = stats.len(),
            samples = payload.data.len(),
            "built market snapshot"
        );
        self.cache.put(item_id, stats.clone()).await;
        Ok(stats)
    }

    /// Ranked sell destinations for `item_id` under `ctx`; `limit` truncates
    /// to the top N after ranking.
    pub async fn advise(
        &self,
        item_id: &str,
        ctx: &TransportContext,
        limit: Option<usize>,
    ) -> Result<Vec<CityRecommendation>, AdvisoryError> {
        let snapshot = self.snapshot(item_id).await?;
        if snapshot.is_empty() {
            return Err(AdvisoryError::NoMarketData(item_id.to_string()));
        }

        let mut recommendations = self.advisor.recommend(&snapshot, ctx);
        if let Some(limit) = limit {
            recommendations.truncate(limit);
        }
        Ok(recommendations)
    }
}
