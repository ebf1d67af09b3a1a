//! Thin asynchronous client for the Albion Online Data Project price feed.
//!
//! - Typed access to per-city price samples for one item.
//! - Simple in-memory TTL cache with stale fallbacks when a refresh fails.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::PriceSample;

const DEFAULT_BASE_URL: &str = "https://west.albion-online-data.com/api/v2/";
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const USER_AGENT: &str = "albion-trade-advisor/0.1.0";

#[derive(Debug, Error)]
pub enum MarketApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unknown item: {0}")]
    ItemNotFound(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self {
            data,
            fetched_at,
            status,
        }
    }
}

#[derive(Clone)]
pub struct MarketApiClient {
    http: Client,
    base_url: Url,
    cache: Arc<Mutex<HashMap<String, Cached<Vec<PriceSample>>>>>,
    ttl: Duration,
}

impl MarketApiClient {
    pub fn new() -> Result<Self, MarketApiError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, MarketApiError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url,
            cache: Arc::new(Mutex::new(HashMap::new())),
            ttl: DEFAULT_TTL,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Fetch raw price samples for `item_id`, optionally narrowed to `cities`.
    ///
    /// A 200 payload that is not a sample array (the feed's "no data" marker
    /// object) yields an empty sample list — no data is not an error. An
    /// unknown item id surfaces as [`MarketApiError::ItemNotFound`]. When a
    /// refresh fails and an expired entry is still around, the stale data is
    /// served instead of the error.
    pub async fn get_prices(
        &self,
        item_id: &str,
        cities: Option<&[&str]>,
    ) -> Result<CachedPayload<Vec<PriceSample>>, MarketApiError> {
        let key = cache_key(item_id, cities);
        if let Some(payload) = self.cached_prices(&key).await {
            debug!(item_id, "serving cached market prices");
            return Ok(payload);
        }

        let mut url = self.url(&format!("stats/prices/{item_id}"))?;
        if let Some(cities) = cities.filter(|c| !c.is_empty()) {
            url.query_pairs_mut()
                .append_pair("locations", &cities.join(","));
        }

        debug!(%url, "requesting market prices");
        match self.fetch_samples(item_id, url).await {
            Ok(samples) => {
                debug!(item_id, count = samples.len(), "parsed market samples");
                Ok(self.store_prices(key, samples).await)
            }
            Err(error) => {
                if let Some(stale) = self.cached_prices_stale(&key).await {
                    warn!(item_id, %error, "price refresh failed, serving stale data");
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    async fn fetch_samples(
        &self,
        item_id: &str,
        url: Url,
    ) -> Result<Vec<PriceSample>, MarketApiError> {
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(MarketApiError::ItemNotFound(item_id.to_string()));
        }
        let response = response.error_for_status()?;
        let raw: serde_json::Value = response.json().await?;
        Ok(parse_price_samples(raw))
    }

    async fn cached_prices(&self, key: &str) -> Option<CachedPayload<Vec<PriceSample>>> {
        let cache = self.cache.lock().await;
        cache.get(key).and_then(|entry| entry.if_fresh(self.ttl))
    }

    async fn cached_prices_stale(&self, key: &str) -> Option<CachedPayload<Vec<PriceSample>>> {
        let cache = self.cache.lock().await;
        cache.get(key).map(Cached::stale)
    }

    async fn store_prices(
        &self,
        key: String,
        data: Vec<PriceSample>,
    ) -> CachedPayload<Vec<PriceSample>> {
        let fetched_at = SystemTime::now();
        let payload = CachedPayload::new(data.clone(), fetched_at, CacheStatus::Fresh);
        let mut cache = self.cache.lock().await;
        cache.insert(key, Cached::new(data, fetched_at));
        payload
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

fn cache_key(item_id: &str, cities: Option<&[&str]>) -> String {
    match cities.filter(|c| !c.is_empty()) {
        Some(cities) => format!("{item_id}?{}", cities.join(",")),
        None => item_id.to_string(),
    }
}

struct Cached<T> {
    value: T,
    fetched_at: SystemTime,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, fetched_at: SystemTime) -> Self {
        Self { value, fetched_at }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<CachedPayload<T>> {
        if self
            .fetched_at
            .elapsed()
            .map(|elapsed| elapsed <= ttl)
            .unwrap_or(false)
        {
            Some(CachedPayload::new(
                self.value.clone(),
                self.fetched_at,
                CacheStatus::Cached,
            ))
        } else {
            None
        }
    }

    fn stale(&self) -> CachedPayload<T> {
        CachedPayload::new(self.value.clone(), self.fetched_at, CacheStatus::Stale)
    }
}

/// The feed answers a plain array of price rows. Anything else (an error
/// marker object, an unexpected shape) is treated as "no data".
fn parse_price_samples(value: serde_json::Value) -> Vec<PriceSample> {
    serde_json::from_value::<Vec<PriceSampleDto>>(value)
        .map(|entries| entries.into_iter().map(PriceSample::from).collect())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct PriceSampleDto {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    sell_price_max: Option<u64>,
    #[serde(default)]
    buy_price_max: Option<u64>,
    #[serde(default)]
    sell_price_max_date: Option<String>,
    #[serde(default)]
    sell_price_min_date: Option<String>,
    #[serde(default)]
    buy_price_max_date: Option<String>,
    #[serde(default)]
    buy_price_min_date: Option<String>,
}

impl From<PriceSampleDto> for PriceSample {
    fn from(dto: PriceSampleDto) -> Self {
        Self {
            city: dto.city.unwrap_or_else(|| "Unknown".to_string()),
            sell_price_max: dto.sell_price_max.unwrap_or(0),
            buy_price_max: dto.buy_price_max.unwrap_or(0),
            sell_price_max_date: dto.sell_price_max_date,
            sell_price_min_date: dto.sell_price_min_date,
            buy_price_max_date: dto.buy_price_max_date,
            buy_price_min_date: dto.buy_price_min_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(server: &MockServer) -> MarketApiClient {
        MarketApiClient::with_base_url(&format!("{}/api/v2/", server.uri()))
            .expect("test client builds")
    }

    fn price_rows() -> serde_json::Value {
        json!([
            {
                "item_id": "T4_BAG",
                "city": "Martlock",
                "quality": 1,
                "sell_price_max": 150,
                "sell_price_max_date": "2026-08-05T14:22:00",
                "buy_price_max": 140
            },
            {
                "item_id": "T4_BAG",
                "sell_price_max": 90
            }
        ])
    }

    #[tokio::test]
    async fn parses_price_rows_and_defaults_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/stats/prices/T4_BAG"))
            .respond_with(ResponseTemplate::new(200).set_body_json(price_rows()))
            .mount(&server)
            .await;

        let payload = client_for(&server)
            .await
            .get_prices("T4_BAG", None)
            .await
            .expect("prices fetch");

        assert_eq!(payload.status, CacheStatus::Fresh);
        assert_eq!(payload.data.len(), 2);
        assert_eq!(payload.data[0].city, "Martlock");
        assert_eq!(payload.data[0].sell_price_max, 150);
        assert_eq!(payload.data[1].city, "Unknown");
        assert_eq!(payload.data[1].buy_price_max, 0);
    }

    #[tokio::test]
    async fn city_filter_is_forwarded_as_locations_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/stats/prices/T4_BAG"))
            .and(query_param("locations", "Martlock,Lymhurst"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client_for(&server)
            .await
            .get_prices("T4_BAG", Some(&["Martlock", "Lymhurst"]))
            .await
            .expect("filtered fetch");

        assert_eq!(payload.data, Vec::new());
    }

    #[tokio::test]
    async fn error_marker_payload_parses_as_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/stats/prices/T4_BAG"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "try again later"})),
            )
            .mount(&server)
            .await;

        let payload = client_for(&server)
            .await
            .get_prices("T4_BAG", None)
            .await
            .expect("marker payload is not an error");

        assert_eq!(payload.data, Vec::new());
    }

    #[tokio::test]
    async fn unknown_item_maps_to_item_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/stats/prices/T9_NOPE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .await
            .get_prices("T9_NOPE", None)
            .await
            .expect_err("404 is an error");

        assert!(matches!(error, MarketApiError::ItemNotFound(item) if item == "T9_NOPE"));
    }

    #[tokio::test]
    async fn second_request_within_ttl_hits_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/stats/prices/T4_BAG"))
            .respond_with(ResponseTemplate::new(200).set_body_json(price_rows()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let first = client.get_prices("T4_BAG", None).await.expect("first");
        let second = client.get_prices("T4_BAG", None).await.expect("second");

        assert_eq!(first.status, CacheStatus::Fresh);
        assert_eq!(second.status, CacheStatus::Cached);
        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn upstream_failure_falls_back_to_stale_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/stats/prices/T4_BAG"))
            .respond_with(ResponseTemplate::new(200).set_body_json(price_rows()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/stats/prices/T4_BAG"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server).await.with_ttl(Duration::ZERO);
        let fresh = client.get_prices("T4_BAG", None).await.expect("first");
        let stale = client
            .get_prices("T4_BAG", None)
            .await
            .expect("stale fallback");

        assert_eq!(stale.status, CacheStatus::Stale);
        assert_eq!(stale.data, fresh.data);
    }
}
