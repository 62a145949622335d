use std::collections::BTreeMap;

use chrono::TimeZone;

use crate::{
    core::{bucket::HourBucket, interval::floor_to_hour, session::Zone, tariff},
    prelude::*,
    quantity::{
        energy::{KilowattHours, WattHours},
        rate::KilowattHourRate,
    },
};

/// In-memory day-ahead spot rates, keyed by zone and top-of-hour timestamp.
///
/// Append-only: prefetching adds new `(zone, hour)` entries but never
/// rewrites existing ones.
#[must_use]
#[derive(Debug, Default)]
pub struct PriceBook {
    rates: BTreeMap<(Zone, i64), KilowattHourRate>,
}

impl PriceBook {
    pub fn insert(&mut self, zone: Zone, hour_start: i64, rate: KilowattHourRate) {
        self.rates.entry((zone, floor_to_hour(hour_start))).or_insert(rate);
    }

    #[must_use]
    pub fn get(&self, zone: Zone, hour_start: i64) -> Option<KilowattHourRate> {
        self.rates.get(&(zone, floor_to_hour(hour_start))).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zone, i64, KilowattHourRate)> + '_ {
        self.rates.iter().map(|(&(zone, hour_start), &rate)| (zone, hour_start, rate))
    }

    /// Spot rate for the hour, degrading to zero with a diagnostic when the
    /// hour is not known. Missing price data must never abort pricing.
    fn spot_rate(&self, zone: Zone, hour_start: i64) -> KilowattHourRate {
        self.get(zone, hour_start).unwrap_or_else(|| {
            warn!(%zone, hour_start, "no spot price for this hour, assuming zero");
            KilowattHourRate::ZERO
        })
    }
}

/// Attach tariff and spot costs to each hour bucket. The tariff rate is a
/// pure function of the bucket's local start time; the spot rate comes from
/// the price book. Buckets without energy are left untouched.
pub fn price_buckets<Tz: TimeZone>(
    tz: &Tz,
    buckets: &mut [HourBucket],
    zone: Zone,
    book: &PriceBook,
) {
    for bucket in buckets {
        if bucket.energy == WattHours::ZERO {
            continue;
        }
        let Some(local) = tz.timestamp_opt(bucket.period_start, 0).single() else {
            warn!(period_start = bucket.period_start, "ambiguous local time, skipping pricing");
            continue;
        };
        let kwh = KilowattHours::from(bucket.energy);
        bucket.tariff_price = kwh * tariff::rate_at(local.naive_local());
        bucket.spot_price = kwh * book.spot_rate(zone, bucket.period_start);
        bucket.price = bucket.tariff_price + bucket.spot_price;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::Utc;

    use super::*;
    use crate::quantity::cost::Cost;

    fn bucket(period_start: i64, energy: f64) -> HourBucket {
        HourBucket {
            period_start,
            energy: WattHours(energy),
            tariff_price: Cost::ZERO,
            spot_price: Cost::ZERO,
            price: Cost::ZERO,
        }
    }

    #[test]
    fn test_book_is_append_only() {
        let mut book = PriceBook::default();
        book.insert(Zone::Dk2, 3600, KilowattHourRate(1.0));
        book.insert(Zone::Dk2, 3600, KilowattHourRate(2.0));
        assert_eq!(book.get(Zone::Dk2, 3600), Some(KilowattHourRate(1.0)));
    }

    #[test]
    fn test_lookup_floors_to_hour() {
        let mut book = PriceBook::default();
        book.insert(Zone::Dk1, 7200, KilowattHourRate(0.5));
        assert_eq!(book.get(Zone::Dk1, 7201), Some(KilowattHourRate(0.5)));
        assert_eq!(book.get(Zone::Dk2, 7200), None);
    }

    /// A bucket whose hour is absent from the book gets a zero spot price
    /// but still gets its tariff price.
    #[test]
    fn test_missing_price_degrades_to_zero() {
        let mut buckets = vec![bucket(0, 2000.0)];
        price_buckets(&Utc, &mut buckets, Zone::Dk2, &PriceBook::default());
        assert_abs_diff_eq!(buckets[0].spot_price.0, 0.0);
        assert!(buckets[0].tariff_price > Cost::ZERO);
        assert_eq!(buckets[0].price, buckets[0].tariff_price);
    }

    #[test]
    fn test_priced_bucket() {
        let mut book = PriceBook::default();
        book.insert(Zone::Dk1, 0, KilowattHourRate(1.0));
        let mut buckets = vec![bucket(0, 2000.0)];
        price_buckets(&Utc, &mut buckets, Zone::Dk1, &book);
        // 1970-01-01 00:00 UTC: winter night slot.
        let expected_tariff = (0.72 + 0.061 + 0.074 + 0.05 + 0.0976) * 2.0;
        assert_abs_diff_eq!(buckets[0].tariff_price.0, expected_tariff);
        assert_abs_diff_eq!(buckets[0].spot_price.0, 2.0);
        assert_abs_diff_eq!(buckets[0].price.0, expected_tariff + 2.0);
    }

    #[test]
    fn test_zero_energy_bucket_is_skipped() {
        let mut book = PriceBook::default();
        book.insert(Zone::Dk2, 0, KilowattHourRate(10.0));
        let mut buckets = vec![bucket(0, 0.0)];
        price_buckets(&Utc, &mut buckets, Zone::Dk2, &book);
        assert_eq!(buckets[0].price, Cost::ZERO);
    }
}
