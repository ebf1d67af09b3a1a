//! Static world knowledge: safety zones, per-city risk, transport multiplier.

use std::collections::HashMap;

/// Safety classification of a market city.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    Royal,
    Outlands,
}

/// The five royal-continent trading hubs.
pub const ROYAL_CITIES: [&str; 5] = [
    "Martlock",
    "Bridgewatch",
    "Lymhurst",
    "Fort Sterling",
    "Thetford",
];

const CAPITAL_CITY: &str = "Caerleon";
const BLACK_MARKET: &str = "Black Market";

const ROYAL_RISK: f64 = 0.10;
const CAPITAL_RISK: f64 = 0.35;
const BLACK_MARKET_RISK: f64 = 0.55;
const UNKNOWN_RISK: f64 = 0.50;
const CROSS_ZONE_FACTOR: f64 = 1.2;

/// Immutable zone and risk tables. Built once at startup and passed by
/// reference into the advisor; lookups are pure and never fail — an
/// unlisted city gets the outlands default.
#[derive(Clone, Debug)]
pub struct RiskModel {
    risk_scores: HashMap<&'static str, f64>,
    default_risk: f64,
}

impl Default for RiskModel {
    fn default() -> Self {
        let mut risk_scores = HashMap::new();
        for city in ROYAL_CITIES {
            risk_scores.insert(city, ROYAL_RISK);
        }
        risk_scores.insert(CAPITAL_CITY, CAPITAL_RISK);
        risk_scores.insert(BLACK_MARKET, BLACK_MARKET_RISK);
        Self {
            risk_scores,
            default_risk: UNKNOWN_RISK,
        }
    }
}

impl RiskModel {
    pub fn is_royal(&self, city: &str) -> bool {
        ROYAL_CITIES.contains(&city)
    }

    pub fn zone(&self, city: &str) -> Zone {
        if self.is_royal(city) {
            Zone::Royal
        } else {
            Zone::Outlands
        }
    }

    /// Per-city risk in [0, 1].
    pub fn risk_score(&self, city: &str) -> f64 {
        self.risk_scores
            .get(city)
            .copied()
            .unwrap_or(self.default_risk)
    }

    /// Simulated transport-cost multiplier: 1.0 within a zone, 1.2 across.
    /// Deliberately coarse — this is not pathfinding.
    pub fn distance_factor(&self, from: &str, to: &str) -> f64 {
        if self.zone(from) == self.zone(to) {
            1.0
        } else {
            CROSS_ZONE_FACTOR
        }
    }
}
