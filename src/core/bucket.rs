use crate::{
    core::{
        interpolate::SampleSlice,
        interval::{HOUR, TimeRange, floor_to_hour},
    },
    quantity::{cost::Cost, energy::WattHours},
};

/// One clock-hour-aligned slice of a session's lifetime, covering the
/// half-open range `[period_start, period_start + 3600)`.
#[must_use]
#[derive(Debug, Clone)]
pub struct HourBucket {
    pub period_start: i64,
    pub energy: WattHours,
    pub tariff_price: Cost,
    pub spot_price: Cost,
    pub price: Cost,
}

impl HourBucket {
    const fn empty(period_start: i64) -> Self {
        Self {
            period_start,
            energy: WattHours::ZERO,
            tariff_price: Cost::ZERO,
            spot_price: Cost::ZERO,
            price: Cost::ZERO,
        }
    }

    pub const fn range(&self) -> TimeRange {
        TimeRange::new(self.period_start, self.period_start + HOUR)
    }
}

/// Distribute per-sample energy into the fixed top-of-hour buckets covering
/// the session, by proportional time overlap.
///
/// The bucket timeline runs from `floor_to_hour(start_time)` through
/// `floor_to_hour(end_time)` inclusive; every bucket is an explicit
/// half-open hour, so there is no trailing sentinel to trim. If the
/// distributed total drifts more than one watt-hour from the meter reading,
/// the whole difference is injected into the first bucket.
pub fn bucketize(
    energy_meter: WattHours,
    start_time: i64,
    end_time: i64,
    slices: &[SampleSlice],
) -> Vec<HourBucket> {
    if slices.is_empty() {
        return Vec::new();
    }

    let first_hour = floor_to_hour(start_time);
    let last_hour = floor_to_hour(end_time.max(start_time));
    let mut buckets: Vec<HourBucket> = (first_hour..=last_hour)
        .step_by(HOUR.unsigned_abs() as usize)
        .map(HourBucket::empty)
        .collect();

    for slice in slices {
        // Same-second admin entries carry no energy.
        if slice.interval.is_empty() {
            continue;
        }
        #[expect(clippy::cast_precision_loss)]
        let interval_len = slice.interval.len() as f64;
        for bucket in &mut buckets {
            let overlap = slice.interval.overlap(bucket.range());
            if overlap > 0 {
                #[expect(clippy::cast_precision_loss)]
                let proportion = overlap as f64 / interval_len;
                bucket.energy += slice.energy * proportion;
            }
        }
    }

    let distributed: WattHours = buckets.iter().map(|bucket| bucket.energy).sum();
    let difference = energy_meter - distributed;
    if difference.abs() > WattHours::ONE {
        buckets[0].energy += difference;
    }

    buckets
}
