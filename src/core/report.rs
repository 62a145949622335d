use chrono::{DateTime, Datelike, Days, Months, TimeDelta, TimeZone, Timelike};
use itertools::Itertools;

use crate::{
    core::{SessionBreakdown, interval::TimeRange, session::Session},
    quantity::{cost::Cost, energy::WattHours},
};

/// Report window selector. The first two aggregate by hour, the monthly
/// views by day, the yearly view by month, and the overall view by year.
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum Period {
    /// The 48 hours up to now, hourly.
    #[value(name = "last-48-hours")]
    Last48Hours,
    /// 48 hours from an explicit start, hourly.
    #[value(name = "48-hours")]
    Hours48,
    /// The month up to now, daily.
    #[value(name = "last-month")]
    LastMonth,
    /// A calendar month, daily.
    #[value(name = "month")]
    Month,
    /// A calendar year, monthly.
    #[value(name = "year")]
    Year,
    /// Everything since the earliest session, yearly.
    #[value(name = "overall")]
    Overall,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Granularity {
    Hour,
    Day,
    Month,
    Year,
}

impl Period {
    const fn granularity(self) -> Granularity {
        match self {
            Self::Last48Hours | Self::Hours48 => Granularity::Hour,
            Self::LastMonth | Self::Month => Granularity::Day,
            Self::Year => Granularity::Month,
            Self::Overall => Granularity::Year,
        }
    }

    /// Default window start, mirroring the dashboard defaults: the previous
    /// 47 full hours, the current month, one month back, the current year,
    /// or the year of the earliest known session.
    pub fn default_start<Tz: TimeZone>(
        self,
        now: &DateTime<Tz>,
        earliest_session_start: Option<DateTime<Tz>>,
    ) -> DateTime<Tz> {
        match self {
            Self::Last48Hours => start_of_hour(now.clone() - TimeDelta::hours(47)),
            Self::Hours48 | Self::Month => start_of_month(now.clone()),
            Self::LastMonth => start_of_day(now.clone() - Months::new(1) + Days::new(1)),
            Self::Year => start_of_year(now.clone()),
            Self::Overall => {
                start_of_year(earliest_session_start.unwrap_or_else(|| now.clone()))
            }
        }
    }

    fn end_of<Tz: TimeZone>(self, start: &DateTime<Tz>, now: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Self::Last48Hours | Self::Hours48 => start.clone() + TimeDelta::hours(48),
            Self::LastMonth | Self::Month => start.clone() + Months::new(1),
            Self::Year => start.clone() + Months::new(12),
            Self::Overall => start_of_year(now.clone()) + Months::new(12),
        }
    }
}

// Each truncation keeps the previous value when the truncated local time
// does not exist (a DST gap can remove midnight or a top-of-hour).

fn start_of_hour<Tz: TimeZone>(at: DateTime<Tz>) -> DateTime<Tz> {
    at.with_minute(0)
        .and_then(|at| at.with_second(0))
        .and_then(|at| at.with_nanosecond(0))
        .unwrap_or(at)
}

fn start_of_day<Tz: TimeZone>(at: DateTime<Tz>) -> DateTime<Tz> {
    let at = start_of_hour(at);
    at.with_hour(0).unwrap_or(at)
}

fn start_of_month<Tz: TimeZone>(at: DateTime<Tz>) -> DateTime<Tz> {
    let at = start_of_day(at);
    at.with_day(1).unwrap_or(at)
}

fn start_of_year<Tz: TimeZone>(at: DateTime<Tz>) -> DateTime<Tz> {
    let at = start_of_month(at);
    at.with_month(1).unwrap_or(at)
}

/// One interval of an aggregated report, summed across sessions.
#[must_use]
#[derive(Debug, Clone)]
pub struct ReportBucket {
    pub label: String,
    pub range: TimeRange,
    pub energy: WattHours,
    pub tariff_price: Cost,
    pub spot_price: Cost,
    pub price: Cost,
}

#[must_use]
#[derive(Debug, Clone, Default)]
pub struct ReportTotals {
    pub energy: WattHours,
    pub tariff_price: Cost,
    pub spot_price: Cost,
    pub price: Cost,
}

#[must_use]
#[derive(Debug, Clone)]
pub struct Report {
    pub buckets: Vec<ReportBucket>,
}

impl Report {
    /// Summed total row for footer display.
    pub fn totals(&self) -> ReportTotals {
        ReportTotals {
            energy: self.buckets.iter().map(|bucket| bucket.energy).sum(),
            tariff_price: self.buckets.iter().map(|bucket| bucket.tariff_price).sum(),
            spot_price: self.buckets.iter().map(|bucket| bucket.spot_price).sum(),
            price: self.buckets.iter().map(|bucket| bucket.price).sum(),
        }
    }
}

#[must_use]
#[derive(Debug, Clone)]
pub struct ReportRequest<Tz: TimeZone> {
    pub period: Period,
    pub start: DateTime<Tz>,
    pub now: DateTime<Tz>,
    /// Group filter; [`None`] means all groups.
    pub group: Option<String>,
    /// Charger filter; [`None`] means all chargers.
    pub charger: Option<String>,
}

impl<Tz: TimeZone> ReportRequest<Tz> {
    fn accepts(&self, session: &Session, window: TimeRange) -> bool {
        if self.group.as_deref().is_some_and(|group| group != session.group_id) {
            return false;
        }
        if self.charger.as_deref().is_some_and(|charger| charger != session.charger_id) {
            return false;
        }
        // Lifetime must intersect the report window.
        if session.end_time.is_some_and(|end_time| end_time < window.start) {
            return false;
        }
        session.start_time <= window.end
    }
}

/// Re-bucket many sessions' hourly histories into the report intervals
/// implied by the requested period.
///
/// Each hour bucket is counted in the one report bucket that fully contains
/// it; an hour straddling a report boundary (only possible with a
/// misaligned hourly window) is not counted. All boundaries are half-open,
/// so no sentinel bucket exists to trim.
pub fn build_report<'a, Tz: TimeZone>(
    request: &ReportRequest<Tz>,
    sessions: impl IntoIterator<Item = (&'a Session, &'a SessionBreakdown)>,
) -> Report {
    let end = request.period.end_of(&request.start, &request.now);
    let granularity = request.period.granularity();

    let mut boundaries = vec![request.start.clone()];
    while *boundaries.last().unwrap() < end {
        let last = boundaries.last().unwrap().clone();
        boundaries.push(match granularity {
            Granularity::Hour => last + TimeDelta::hours(1),
            Granularity::Day => last + Days::new(1),
            Granularity::Month => last + Months::new(1),
            Granularity::Year => last + Months::new(12),
        });
    }

    let mut buckets: Vec<ReportBucket> = boundaries
        .iter()
        .tuple_windows()
        .map(|(from, till)| ReportBucket {
            label: label(granularity, from),
            range: TimeRange::new(from.timestamp(), till.timestamp()),
            energy: WattHours::ZERO,
            tariff_price: Cost::ZERO,
            spot_price: Cost::ZERO,
            price: Cost::ZERO,
        })
        .collect();
    let window = TimeRange::new(request.start.timestamp(), end.timestamp());

    for (session, breakdown) in sessions {
        if !request.accepts(session, window) {
            continue;
        }
        for hour in &breakdown.hourly {
            if let Some(bucket) =
                buckets.iter_mut().find(|bucket| bucket.range.contains_range(hour.range()))
            {
                bucket.energy += hour.energy;
                bucket.tariff_price += hour.tariff_price;
                bucket.spot_price += hour.spot_price;
                bucket.price += hour.price;
            }
        }
    }

    Report { buckets }
}

fn label<Tz: TimeZone>(granularity: Granularity, start: &DateTime<Tz>) -> String {
    let start = start.naive_local();
    match granularity {
        Granularity::Hour => start.format("%Y-%m-%d %H:00").to_string(),
        Granularity::Day => start.format("%Y-%m-%d").to_string(),
        Granularity::Month => start.format("%Y-%m").to_string(),
        Granularity::Year => start.format("%Y").to_string(),
    }
}
