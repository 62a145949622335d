use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveDate;

use crate::{api::elprisen::HourPrice, core::session::Zone, prelude::*};

const KEY_PREFIX: &str = "price-";

/// File-backed day-ahead price cache: one JSON file per `(zone, day)` under
/// keys shaped like `price-DK2-2024-01-31`, so repeated report renders do
/// not re-fetch already-known days.
///
/// The cache is bounded: on every insert, days older than the retention
/// horizon are evicted.
#[must_use]
pub struct PriceCache {
    directory: PathBuf,
    retention_days: i64,
}

impl PriceCache {
    pub fn new(directory: impl Into<PathBuf>, retention: Duration) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)
            .with_context(|| format!("failed to create the cache directory {directory:?}"))?;
        #[expect(clippy::cast_possible_wrap)]
        let retention_days = (retention.as_secs() / 86_400) as i64;
        Ok(Self { directory, retention_days })
    }

    fn path_for(&self, zone: Zone, date: NaiveDate) -> PathBuf {
        self.directory.join(format!("{KEY_PREFIX}{zone}-{date}.json"))
    }

    /// Cached prices for the day, or [`None`] on a miss. Absent, empty, and
    /// unreadable entries all count as misses.
    pub fn get(&self, zone: Zone, date: NaiveDate) -> Option<Vec<HourPrice>> {
        let path = self.path_for(zone, date);
        let contents = fs::read_to_string(&path).ok()?;
        if contents.is_empty() {
            return None;
        }
        match serde_json::from_str(&contents) {
            Ok(prices) => Some(prices),
            Err(error) => {
                warn!(?path, "discarding an unreadable cache entry: {error:#}");
                None
            }
        }
    }

    pub fn put(
        &self,
        zone: Zone,
        date: NaiveDate,
        prices: &[HourPrice],
        today: NaiveDate,
    ) -> Result {
        let path = self.path_for(zone, date);
        fs::write(&path, serde_json::to_string(prices)?)
            .with_context(|| format!("failed to write the cache entry {path:?}"))?;
        self.evict(today);
        Ok(())
    }

    /// Remove entries older than the retention horizon. Best-effort: an
    /// entry that cannot be removed is only logged.
    fn evict(&self, today: NaiveDate) {
        let Ok(entries) = fs::read_dir(&self.directory) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(date) = entry_date(&path) else {
                continue;
            };
            if (today - date).num_days() > self.retention_days {
                debug!(?path, "evicting an expired cache entry");
                if let Err(error) = fs::remove_file(&path) {
                    warn!(?path, "failed to evict the cache entry: {error:#}");
                }
            }
        }
    }
}

/// Parse the day out of a `price-<ZONE>-<YYYY-MM-DD>.json` file name.
fn entry_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    if !stem.starts_with(KEY_PREFIX) || stem.len() < 10 {
        return None;
    }
    NaiveDate::parse_from_str(stem.get(stem.len() - 10..)?, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Days};

    use super::*;

    fn price(time_start: &str, rate: f64) -> HourPrice {
        HourPrice {
            dkk_per_kwh: rate,
            eur_per_kwh: None,
            exchange_rate: None,
            time_start: DateTime::parse_from_rfc3339(time_start).unwrap(),
            time_end: None,
        }
    }

    #[test]
    fn test_miss_on_empty_directory() {
        let directory = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(directory.path(), Duration::from_secs(86_400)).unwrap();
        assert!(cache.get(Zone::Dk2, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()).is_none());
    }

    #[test]
    fn test_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(directory.path(), Duration::from_secs(400 * 86_400)).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let prices = vec![price("2024-01-31T00:00:00+01:00", 0.42)];

        cache.put(Zone::Dk1, date, &prices, date).unwrap();
        let cached = cache.get(Zone::Dk1, date).unwrap();
        assert_eq!(cached.len(), 1);
        assert!((cached[0].dkk_per_kwh - 0.42).abs() < f64::EPSILON);
        // The key format is byte-compatible with the reference dashboard.
        assert!(directory.path().join("price-DK1-2024-01-31.json").is_file());
        // The other zone is a separate key.
        assert!(cache.get(Zone::Dk2, date).is_none());
    }

    #[test]
    fn test_empty_entry_is_a_miss() {
        let directory = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(directory.path(), Duration::from_secs(86_400)).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        fs::write(directory.path().join("price-DK2-2024-01-31.json"), "").unwrap();
        assert!(cache.get(Zone::Dk2, date).is_none());
    }

    #[test]
    fn test_eviction_keeps_recent_days() {
        let directory = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(directory.path(), Duration::from_secs(2 * 86_400)).unwrap();
        let old_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = old_date + Days::new(10);

        cache.put(Zone::Dk1, old_date, &[price("2024-01-01T00:00:00+01:00", 0.1)], old_date).unwrap();
        assert!(cache.get(Zone::Dk1, old_date).is_some());

        cache.put(Zone::Dk1, today, &[price("2024-01-11T00:00:00+01:00", 0.2)], today).unwrap();
        assert!(cache.get(Zone::Dk1, old_date).is_none(), "expired entry must be evicted");
        assert!(cache.get(Zone::Dk1, today).is_some());
    }
}
