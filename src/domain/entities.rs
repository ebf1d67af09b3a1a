use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One raw price observation for an item in one city, as reported by the
/// upstream market data feed. A sample with both prices at 0 carries no
/// quote but still counts as an observation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub city: String,
    /// Highest observed sell-order price; 0 means no quote.
    pub sell_price_max: u64,
    /// Highest observed buy-order price; 0 means no quote.
    pub buy_price_max: u64,
    /// Observation times of the four price extremes. Kept raw so a bad value
    /// degrades field-by-field during aggregation instead of at the edge.
    pub sell_price_max_date: Option<String>,
    pub sell_price_min_date: Option<String>,
    pub buy_price_max_date: Option<String>,
    pub buy_price_min_date: Option<String>,
}

impl PriceSample {
    pub(crate) fn date_fields(&self) -> [Option<&str>; 4] {
        [
            self.sell_price_max_date.as_deref(),
            self.sell_price_min_date.as_deref(),
            self.buy_price_max_date.as_deref(),
            self.buy_price_min_date.as_deref(),
        ]
    }
}

/// Aggregated market statistics for one city, derived from a batch of
/// samples. Rebuilt per request (or served from a short-TTL cache) and
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMarketStat {
    pub city: String,
    /// Rounded mean of the positive sell maxima; 0 when no sample quoted one.
    pub sell_price: u64,
    pub buy_price: u64,
    /// Count of merged samples, zero-price observations included.
    pub sample_size: u32,
    /// Most recent observation time across all merged samples.
    #[serde(serialize_with = "rfc3339_or_empty")]
    pub last_updated: Option<OffsetDateTime>,
}

fn rfc3339_or_empty<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value.and_then(|ts| ts.format(&Rfc3339).ok()) {
        Some(formatted) => serializer.serialize_str(&formatted),
        None => serializer.serialize_str(""),
    }
}

/// Ranking mode requested by the trader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    /// Net profit is all that counts.
    Profit,
    /// Royal cities only, safety-weighted ranking.
    Safe,
    /// Profit-leaning blend of both.
    Balanced,
}

/// Which observed price counts as the realizable unit price at a destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStrategy {
    /// Post a sell order at the listing price and wait.
    #[default]
    List,
    /// Dump into standing buy orders for an immediate sale.
    Quick,
}

/// Whether the trader already holds the goods or buys them at the origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeScenario {
    #[default]
    HaveStock,
    /// Acquisition at the origin's sell price is part of the cost basis.
    Arbitrage,
}

/// Parameters of one advisory request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportContext {
    pub from_city: String,
    /// Per-unit weight; floor-clamped to 0.01 when the transport cost is
    /// computed.
    #[serde(default = "default_item_weight")]
    pub item_weight: f64,
    pub quantity: u32,
    /// Sales tax as a fraction; clamped into [0, 0.5] by the advisor.
    #[serde(default)]
    pub tax_rate: f64,
    pub mode: TradeMode,
    #[serde(default)]
    pub strategy: PriceStrategy,
    #[serde(default)]
    pub scenario: TradeScenario,
}

fn default_item_weight() -> f64 {
    1.0
}

/// One ranked destination with its full financial breakdown.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRecommendation {
    pub city: String,
    pub gross: f64,
    pub tax: f64,
    pub transport: f64,
    pub risk_penalty: f64,
    pub net: f64,
    pub risk_score: f64,
    /// Composite ranking value; absent in profit mode where net alone ranks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}
