pub mod bucket;
pub mod interpolate;
pub mod interval;
pub mod pricing;
pub mod report;
pub mod session;
pub mod tariff;

use chrono::TimeZone;

use crate::{
    core::{
        bucket::{HourBucket, bucketize},
        interpolate::interpolate,
        pricing::{PriceBook, price_buckets},
        session::{Session, Zone},
    },
    quantity::{cost::Cost, energy::WattHours},
};

/// Immutable derived record for one session: the hourly energy/price
/// breakdown plus session-level rollups.
///
/// The raw [`Session`] is never mutated; deriving the breakdown twice from
/// the same inputs yields the same record.
#[must_use]
#[derive(Debug, Clone)]
pub struct SessionBreakdown {
    pub session_id: String,
    pub hourly: Vec<HourBucket>,
    pub energy: WattHours,
    pub tariff_price: Cost,
    pub spot_price: Cost,
    pub price: Cost,
}

/// Run the full pipeline for one session: interpolate the current samples
/// into per-sample energy, distribute it into hour buckets, and price each
/// bucket against the tariff tables and the spot price book.
///
/// Returns [`None`] for a session without any charging samples; such
/// sessions are skipped by all downstream stages.
pub fn derive_breakdown<Tz: TimeZone>(
    tz: &Tz,
    session: &Session,
    zone: Zone,
    book: &PriceBook,
    now: i64,
) -> Option<SessionBreakdown> {
    // Resolve the session end once; both stages share the same window.
    let end_time = session.effective_end_time(now);
    let slices = interpolate(session, end_time);
    if slices.is_empty() {
        return None;
    }
    let mut hourly = bucketize(session.energy_meter, session.start_time, end_time, &slices);
    price_buckets(tz, &mut hourly, zone, book);

    let priced = || hourly.iter().filter(|bucket| bucket.energy != WattHours::ZERO);
    Some(SessionBreakdown {
        session_id: session.session_id.clone(),
        energy: hourly.iter().map(|bucket| bucket.energy).sum(),
        tariff_price: priced().map(|bucket| bucket.tariff_price).sum(),
        spot_price: priced().map(|bucket| bucket.spot_price).sum(),
        price: priced().map(|bucket| bucket.price).sum(),
        hourly,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::Utc;

    use super::*;
    use crate::core::session::ChargingSample;

    fn session(start_time: i64, end_time: Option<i64>, energy_meter: f64) -> Session {
        Session {
            session_id: "S-1".to_string(),
            charger_id: "C-1".to_string(),
            charger_alias: String::new(),
            group_id: "G-1".to_string(),
            user_name: String::new(),
            start_time,
            end_time,
            energy_meter: WattHours(energy_meter),
            charging_history: Vec::new(),
        }
    }

    #[test]
    fn test_empty_history_yields_no_breakdown() {
        let session = session(0, Some(3600), 1000.0);
        assert!(derive_breakdown(&Utc, &session, Zone::Dk2, &PriceBook::default(), 7200).is_none());
    }

    /// An inverted end time is repaired up front, and the same synthetic
    /// window drives both interpolation and bucketization.
    #[test]
    fn test_repaired_session_uses_one_synthetic_window() {
        let mut session = session(1000, Some(900), 2000.0);
        session.charging_history = vec![ChargingSample::at(1000).with_usage(16.0)];
        let breakdown =
            derive_breakdown(&Utc, &session, Zone::Dk2, &PriceBook::default(), 9000).unwrap();
        // The repaired end is 1000 + 1800 = 2800, inside the hour [0, 3600).
        assert_eq!(breakdown.hourly.len(), 1);
        assert_eq!(breakdown.hourly[0].period_start, 0);
        assert_abs_diff_eq!(breakdown.energy.0, 2000.0);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let mut session = session(0, Some(5400), 4000.0);
        session.charging_history = vec![
            ChargingSample::at(0).with_usage(16.0),
            ChargingSample::at(1800).with_usage(8.0),
        ];
        let book = PriceBook::default();
        let first = derive_breakdown(&Utc, &session, Zone::Dk2, &book, 7200).unwrap();
        let second = derive_breakdown(&Utc, &session, Zone::Dk2, &book, 7200).unwrap();
        assert_eq!(first.hourly.len(), second.hourly.len());
        for (a, b) in first.hourly.iter().zip(&second.hourly) {
            assert_eq!(a.period_start, b.period_start);
            assert_eq!(a.energy, b.energy);
            assert_eq!(a.price, b.price);
        }
        assert_eq!(first.energy, second.energy);
        assert_eq!(first.price, second.price);
    }
}
