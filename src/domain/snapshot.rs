//! Aggregates raw price samples into one market statistic per city.

use std::collections::HashMap;

use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::entities::{CityMarketStat, PriceSample};

const UNKNOWN_CITY: &str = "Unknown";

/// Build one `CityMarketStat` per distinct city seen in `samples`.
///
/// Output order is unspecified; callers must not rely on it. All-zero
/// samples still count toward `sample_size` — the counter reflects
/// observation density, not quote density. Samples without a usable city
/// name are pooled under `"Unknown"`.
pub fn build_snapshot(samples: &[PriceSample]) -> Vec<CityMarketStat> {
    let mut cities: HashMap<String, CityAccumulator> = HashMap::new();

    for sample in samples {
        cities
            .entry(normalize_city(&sample.city))
            .or_default()
            .merge(sample);
    }

    cities
        .into_iter()
        .map(|(city, acc)| acc.into_stat(city))
        .collect()
}

fn normalize_city(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_CITY.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Default)]
struct CityAccumulator {
    sell_sum: u64,
    sell_quotes: u32,
    buy_sum: u64,
    buy_quotes: u32,
    sample_size: u32,
    last_updated: Option<OffsetDateTime>,
}

impl CityAccumulator {
    fn merge(&mut self, sample: &PriceSample) {
        self.sample_size += 1;

        if sample.sell_price_max > 0 {
            self.sell_sum += sample.sell_price_max;
            self.sell_quotes += 1;
        }
        if sample.buy_price_max > 0 {
            self.buy_sum += sample.buy_price_max;
            self.buy_quotes += 1;
        }

        // Unparsable date fields are skipped; freshness tracking degrades
        // per field, never per sample.
        for field in sample.date_fields().into_iter().flatten() {
            if let Some(observed) = parse_observation_time(field) {
                if self.last_updated.map_or(true, |seen| observed > seen) {
                    self.last_updated = Some(observed);
                }
            }
        }
    }

    fn into_stat(self, city: String) -> CityMarketStat {
        CityMarketStat {
            city,
            sell_price: rounded_mean(self.sell_sum, self.sell_quotes),
            buy_price: rounded_mean(self.buy_sum, self.buy_quotes),
            sample_size: self.sample_size,
            last_updated: self.last_updated,
        }
    }
}

fn rounded_mean(sum: u64, count: u32) -> u64 {
    if count == 0 {
        return 0;
    }
    (sum as f64 / f64::from(count)).round() as u64
}

// The feed usually reports zone-less timestamps; those are taken as UTC.
static FEED_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

fn parse_observation_time(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(observed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(observed);
    }
    PrimitiveDateTime::parse(raw, FEED_TIMESTAMP)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use time::macros::datetime;

    use super::*;

    fn sample(city: &str, sell: u64, buy: u64) -> PriceSample {
        PriceSample {
            city: city.to_string(),
            sell_price_max: sell,
            buy_price_max: buy,
            ..PriceSample::default()
        }
    }

    fn stat_for<'a>(stats: &'a [CityMarketStat], city: &str) -> &'a CityMarketStat {
        stats
            .iter()
            .find(|s| s.city == city)
            .unwrap_or_else(|| panic!("no stat for {city}"))
    }

    #[test]
    fn empty_input_yields_empty_snapshot() {
        assert_eq!(build_snapshot(&[]), Vec::new());
    }

    #[rstest]
    #[case(&[100, 101], 101)] // 100.5 rounds up
    #[case(&[100, 102], 101)]
    #[case(&[99], 99)]
    #[case(&[10, 11, 11], 11)] // 10.67 rounds to nearest
    fn sell_price_is_rounded_mean_of_positive_maxima(
        #[case] prices: &[u64],
        #[case] expected: u64,
    ) {
        let samples: Vec<_> = prices.iter().map(|&p| sample("Martlock", p, 0)).collect();
        let stats = build_snapshot(&samples);
        assert_eq!(stat_for(&stats, "Martlock").sell_price, expected);
    }

    #[test]
    fn zero_price_samples_count_but_do_not_skew_the_mean() {
        let stats = build_snapshot(&[
            sample("Lymhurst", 200, 0),
            sample("Lymhurst", 0, 0),
            sample("Lymhurst", 100, 50),
        ]);

        let lymhurst = stat_for(&stats, "Lymhurst");
        assert_eq!(lymhurst.sell_price, 150);
        assert_eq!(lymhurst.buy_price, 50);
        assert_eq!(lymhurst.sample_size, 3);
    }

    #[test]
    fn city_with_no_quotes_reports_zero_prices() {
        let stats = build_snapshot(&[sample("Thetford", 0, 0)]);
        let thetford = stat_for(&stats, "Thetford");
        assert_eq!(thetford.sell_price, 0);
        assert_eq!(thetford.buy_price, 0);
        assert_eq!(thetford.sample_size, 1);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_city_normalizes_to_unknown(#[case] city: &str) {
        let stats = build_snapshot(&[sample(city, 10, 0)]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].city, "Unknown");
    }

    #[test]
    fn one_stat_per_distinct_city() {
        let stats = build_snapshot(&[
            sample("Martlock", 100, 0),
            sample("Bridgewatch", 90, 0),
            sample("Martlock", 110, 0),
        ]);

        assert_eq!(stats.len(), 2);
        assert_eq!(stat_for(&stats, "Martlock").sample_size, 2);
        assert_eq!(stat_for(&stats, "Bridgewatch").sample_size, 1);
    }

    #[test]
    fn freshness_is_the_maximum_across_all_four_date_fields() {
        let mut first = sample("Caerleon", 100, 90);
        first.sell_price_max_date = Some("2026-08-01T10:00:00".to_string());
        first.buy_price_min_date = Some("2026-08-03T09:30:00".to_string());

        let mut second = sample("Caerleon", 120, 0);
        second.sell_price_min_date = Some("2026-08-02T23:59:59".to_string());

        let stats = build_snapshot(&[first, second]);
        assert_eq!(
            stat_for(&stats, "Caerleon").last_updated,
            Some(datetime!(2026-08-03 09:30:00 UTC)),
        );
    }

    #[test]
    fn unparsable_dates_are_skipped_not_fatal() {
        let mut bad = sample("Martlock", 80, 0);
        bad.sell_price_max_date = Some("not-a-date".to_string());
        bad.buy_price_max_date = Some("2026-13-45T99:00:00".to_string());

        let stats = build_snapshot(&[bad]);
        let martlock = stat_for(&stats, "Martlock");
        assert_eq!(martlock.last_updated, None);
        assert_eq!(martlock.sell_price, 80);
    }

    #[test]
    fn rfc3339_timestamps_parse_too() {
        let mut offset = sample("Lymhurst", 50, 0);
        offset.sell_price_max_date = Some("2026-08-05T12:00:00Z".to_string());

        let stats = build_snapshot(&[offset]);
        assert_eq!(
            stat_for(&stats, "Lymhurst").last_updated,
            Some(datetime!(2026-08-05 12:00:00 UTC)),
        );
    }
}
