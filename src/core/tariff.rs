//! Danish time-of-use tariff, ex-VAT. The rates are country and grid-operator
//! specific and should be adjusted for other regions.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::quantity::rate::KilowattHourRate;

/// Elafgift.
const ENERGY_LEVY: f64 = 0.72;

/// Nettarif + systemtarif.
const NETWORK_SURCHARGES: f64 = 0.061 + 0.074;

/// Supplier surcharge, e.g. for guaranteed green energy.
const ADDON: f64 = 0.05;

/// Distribution rates per [`TimeSlot`]: night, day, peak.
const WINTER: [f64; 3] = [0.0976, 0.2929, 0.8788];
const SUMMER: [f64; 3] = [0.0976, 0.1465, 0.3808];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TimeSlot {
    Night,
    Day,
    Peak,
}

impl TimeSlot {
    fn from_hour(hour: u32) -> Self {
        match hour {
            0..6 => Self::Night,
            17..21 => Self::Peak,
            _ => Self::Day,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Night => 0,
            Self::Day => 1,
            Self::Peak => 2,
        }
    }
}

fn is_summer(month: u32) -> bool {
    // April through September.
    (4..=9).contains(&month)
}

/// Total tariff per kWh at the given local wall-clock time: the fixed
/// regulatory charges, the season- and hour-dependent distribution rate,
/// and the supplier addon.
#[must_use]
pub fn rate_at(local: NaiveDateTime) -> KilowattHourRate {
    let rates = if is_summer(local.month()) { &SUMMER } else { &WINTER };
    let distribution = rates[TimeSlot::from_hour(local.hour()).index()];
    KilowattHourRate(ENERGY_LEVY + NETWORK_SURCHARGES + distribution + ADDON)
}
