//! Sell-route recommendation: candidate scoring, ranking, profit filtering.

use std::cmp::Ordering;

use super::entities::{
    CityMarketStat, CityRecommendation, PriceStrategy, TradeMode, TradeScenario, TransportContext,
};
use super::zones::RiskModel;

const MIN_ITEM_WEIGHT: f64 = 0.01;

/// Relative weight of profit vs. safety in the composite score.
#[derive(Clone, Copy, Debug)]
pub struct ModeWeights {
    pub profit: f64,
    pub safety: f64,
}

/// Advisor tunables, fixed at construction.
#[derive(Clone, Copy, Debug)]
pub struct AdvisorConfig {
    /// Base freight cost per unit weight per unit quantity.
    pub freight_rate: f64,
    /// Fraction of gross revenue forfeited per unit of risk score.
    pub risk_penalty_rate: f64,
    pub safe_weights: ModeWeights,
    pub balanced_weights: ModeWeights,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            freight_rate: 12.0,
            risk_penalty_rate: 0.15,
            safe_weights: ModeWeights {
                profit: 0.4,
                safety: 0.6,
            },
            balanced_weights: ModeWeights {
                profit: 0.6,
                safety: 0.4,
            },
        }
    }
}

/// Stateless recommendation engine. Construct one at startup and hand it to
/// whatever serves requests; `recommend` is a pure function of its inputs.
#[derive(Clone, Debug, Default)]
pub struct TradeAdvisor {
    risk: RiskModel,
    config: AdvisorConfig,
}

impl TradeAdvisor {
    pub fn new(risk: RiskModel, config: AdvisorConfig) -> Self {
        Self { risk, config }
    }

    pub fn risk_model(&self) -> &RiskModel {
        &self.risk
    }

    /// Rank candidate destination cities for selling under `ctx`.
    ///
    /// Soft-empty by design: an invalid request, an unknown or unpriced
    /// origin, and a market with no profitable route all answer with an
    /// empty list rather than an error. Only candidates with strictly
    /// positive net profit are returned.
    pub fn recommend(
        &self,
        snapshot: &[CityMarketStat],
        ctx: &TransportContext,
    ) -> Vec<CityRecommendation> {
        if ctx.from_city.trim().is_empty() || ctx.quantity == 0 {
            return Vec::new();
        }

        let Some(origin) = snapshot.iter().find(|stat| stat.city == ctx.from_city) else {
            return Vec::new();
        };
        if origin.sell_price == 0 {
            return Vec::new();
        }

        let quantity = f64::from(ctx.quantity);
        let weight = ctx.item_weight.max(MIN_ITEM_WEIGHT);
        let tax_rate = ctx.tax_rate.clamp(0.0, 0.5);
        let cost_basis = match ctx.scenario {
            TradeScenario::HaveStock => 0.0,
            TradeScenario::Arbitrage => origin.sell_price as f64 * quantity,
        };

        let mut candidates: Vec<CityRecommendation> = snapshot
            .iter()
            .filter(|stat| stat.city != ctx.from_city)
            .filter(|stat| ctx.mode != TradeMode::Safe || self.risk.is_royal(&stat.city))
            .filter_map(|stat| {
                let target_price = match ctx.strategy {
                    PriceStrategy::List => stat.sell_price,
                    PriceStrategy::Quick => stat.buy_price,
                };
                if target_price == 0 {
                    return None;
                }

                let gross = target_price as f64 * quantity;
                let tax = gross * tax_rate;
                let transport = self.config.freight_rate
                    * self.risk.distance_factor(&ctx.from_city, &stat.city)
                    * weight
                    * quantity;
                let risk_score = self.risk.risk_score(&stat.city);
                let risk_penalty = match ctx.mode {
                    TradeMode::Profit => 0.0,
                    TradeMode::Safe | TradeMode::Balanced => {
                        gross * risk_score * self.config.risk_penalty_rate
                    }
                };
                let net = gross - tax - transport - risk_penalty - cost_basis;

                Some(CityRecommendation {
                    city: stat.city.clone(),
                    gross,
                    tax,
                    transport,
                    risk_penalty,
                    net,
                    risk_score,
                    score: None,
                })
            })
            .collect();

        self.rank(&mut candidates, ctx.mode);
        candidates.retain(|candidate| candidate.net > 0.0);
        candidates
    }

    fn rank(&self, candidates: &mut [CityRecommendation], mode: TradeMode) {
        let weights = match mode {
            TradeMode::Profit => {
                candidates
                    .sort_by(|a, b| b.net.partial_cmp(&a.net).unwrap_or(Ordering::Equal));
                return;
            }
            TradeMode::Safe => self.config.safe_weights,
            TradeMode::Balanced => self.config.balanced_weights,
        };

        let max_net = candidates
            .iter()
            .map(|candidate| candidate.net)
            .fold(f64::NEG_INFINITY, f64::max);
        // Normalize by 1 unless some candidate nets out positive; a zero or
        // negative divisor would flip the profit term's sign.
        let divisor = if max_net > 0.0 { max_net } else { 1.0 };

        for candidate in candidates.iter_mut() {
            candidate.score = Some(
                weights.profit * (candidate.net / divisor)
                    + weights.safety * (1.0 - candidate.risk_score),
            );
        }
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    }
}
