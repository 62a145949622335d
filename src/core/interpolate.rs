use crate::{
    core::{interval::TimeRange, session::Session},
    quantity::{current::Amperes, energy::WattHours},
};

/// One sample's interval together with the energy attributed to it.
#[must_use]
#[derive(Debug, Copy, Clone)]
pub struct SampleSlice {
    pub interval: TimeRange,
    pub energy: WattHours,
}

/// Convert a session's sparse current samples into per-sample energy.
///
/// Each sample holds until the next one (or until `end_time`, the already
/// resolved session end from [`Session::effective_end_time`]). The current
/// estimate prefers measured usage; the offered maximum is used as a
/// stand-in only until the first real usage value has been observed. The
/// raw ampere-hour figures are then scaled so that their sum matches the
/// meter reading. That single factor also absorbs the unmodelled voltage
/// (≈230 V) and phase count, and it applies to every sample, the last one
/// included.
pub fn interpolate(session: &Session, end_time: i64) -> Vec<SampleSlice> {
    let history = &session.charging_history;
    if history.is_empty() {
        return Vec::new();
    }

    let mut held: Option<Amperes> = None;
    let mut slices = Vec::with_capacity(history.len());
    for (index, sample) in history.iter().enumerate() {
        let end = match history.get(index + 1) {
            Some(next) => next.timestamp,
            None => end_time,
        };
        if sample.usage.is_some() {
            held = sample.usage;
        } else if held.is_none() {
            held = sample.offered;
        }
        let interval = TimeRange::new(sample.timestamp, end);
        #[expect(clippy::cast_precision_loss)]
        let energy =
            WattHours(held.unwrap_or(Amperes::ZERO).0 * interval.len() as f64 / 3600.0);
        slices.push(SampleSlice { interval, energy });
    }

    let total: WattHours = slices.iter().map(|slice| slice.energy).sum();
    if total != WattHours::ZERO {
        let factor = session.energy_meter.0 / total.0;
        for slice in &mut slices {
            slice.energy = slice.energy * factor;
        }
    }
    slices
}
