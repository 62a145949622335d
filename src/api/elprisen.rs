//! Day-ahead spot prices from <https://www.elprisenligenu.dk>, one request
//! per zone and calendar day.

use std::time::Duration;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    cache::PriceCache,
    core::{pricing::PriceBook, session::Zone},
    prelude::*,
    quantity::rate::KilowattHourRate,
};

/// One hourly record of the feed. The serialized shape matches the feed
/// itself, so cache entries stay byte-compatible with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourPrice {
    #[serde(rename = "DKK_per_kWh")]
    pub dkk_per_kwh: f64,

    #[serde(rename = "EUR_per_kWh", default, skip_serializing_if = "Option::is_none")]
    pub eur_per_kwh: Option<f64>,

    #[serde(rename = "EXR", default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,

    pub time_start: DateTime<FixedOffset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<DateTime<FixedOffset>>,
}

impl HourPrice {
    #[must_use]
    pub const fn rate(&self) -> KilowattHourRate {
        KilowattHourRate(self.dkk_per_kwh)
    }
}

pub struct Api {
    client: reqwest::Client,
}

impl Api {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client })
    }

    #[instrument(skip_all, fields(zone = %zone, on = %on))]
    pub async fn get_day(&self, zone: Zone, on: NaiveDate) -> Result<Vec<HourPrice>> {
        info!("fetching…");
        Ok(self
            .client
            .get(day_url(zone, on))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Populate a price book for all zones over `from..=until`, preferring
    /// cached days. A day that fails to fetch is skipped with a diagnostic;
    /// the other days still populate.
    pub async fn load_price_book(
        &self,
        cache: &PriceCache,
        from: NaiveDate,
        until: NaiveDate,
        today: NaiveDate,
    ) -> PriceBook {
        let mut book = PriceBook::default();
        for zone in Zone::ALL {
            let mut date = from;
            while date <= until {
                let prices = match cache.get(zone, date) {
                    Some(prices) => prices,
                    None => match self.get_day(zone, date).await {
                        Ok(prices) => {
                            if let Err(error) = cache.put(zone, date, &prices, today) {
                                warn!(%zone, %date, "failed to cache the prices: {error:#}");
                            }
                            prices
                        }
                        Err(error) => {
                            warn!(%zone, %date, "failed to fetch the prices: {error:#}");
                            Vec::new()
                        }
                    },
                };
                for price in &prices {
                    book.insert(zone, price.time_start.timestamp(), price.rate());
                }
                date = date + Days::new(1);
            }
        }
        info!(n_rates = book.len(), "price book loaded");
        book
    }
}

fn day_url(zone: Zone, on: NaiveDate) -> String {
    format!("https://www.elprisenligenu.dk/api/v1/prices/{}_{zone}.json", on.format("%Y/%m-%d"))
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;

    #[test]
    fn test_day_url() {
        let on = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            day_url(Zone::Dk1, on),
            "https://www.elprisenligenu.dk/api/v1/prices/2024/01-31_DK1.json",
        );
    }

    #[test]
    fn test_feed_record_shape() {
        let record: HourPrice = serde_json::from_str(
            r#"{
                "DKK_per_kWh": 0.59507,
                "EUR_per_kWh": 0.0798,
                "EXR": 7.457486,
                "time_start": "2024-01-31T00:00:00+01:00",
                "time_end": "2024-01-31T01:00:00+01:00"
            }"#,
        )
        .unwrap();
        assert!((record.dkk_per_kwh - 0.59507).abs() < f64::EPSILON);
        assert_eq!(record.time_start.timestamp() % 3600, 0);
    }

    #[tokio::test]
    #[ignore = "makes the API request"]
    async fn test_get_day_ok() -> Result {
        let prices = Api::new()?.get_day(Zone::Dk2, Local::now().date_naive()).await?;
        assert!(!prices.is_empty());
        assert!(prices.len() <= 24);
        Ok(())
    }
}
