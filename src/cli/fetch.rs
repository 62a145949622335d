use std::collections::HashMap;

use chrono::{DateTime, Local, TimeZone};

use crate::{
    api::{balanz, elprisen},
    cli::cache::CacheArgs,
    core::{
        SessionBreakdown, derive_breakdown,
        pricing::PriceBook,
        session::{Session, Zone},
    },
    prelude::*,
};

pub struct PricedSessions {
    pub sessions: Vec<Session>,
    /// Derived records keyed by session id.
    pub breakdowns: HashMap<String, SessionBreakdown>,
    pub earliest_start: Option<DateTime<Local>>,
}

impl PricedSessions {
    pub fn rows(&self) -> Vec<(&Session, Option<&SessionBreakdown>)> {
        self.sessions
            .iter()
            .map(|session| (session, self.breakdowns.get(&session.session_id)))
            .collect()
    }
}

/// Fetch sessions and chargers from the backend, load spot prices covering
/// the sessions' lifetimes, and derive every session's breakdown.
#[instrument(skip_all)]
pub async fn load(
    client: &balanz::Client,
    cache: &CacheArgs,
    include_live: bool,
    now: &DateTime<Local>,
) -> Result<PricedSessions> {
    let sessions = client.get_sessions(include_live).await?;
    info!(n_sessions = sessions.len(), "fetched sessions");
    let chargers = client.get_chargers().await?;
    info!(n_chargers = chargers.len(), "fetched chargers");

    let zones: HashMap<String, Zone> =
        chargers.iter().map(|charger| (charger.charger_id.clone(), charger.zone())).collect();

    let earliest_start = sessions
        .iter()
        .map(|session| session.start_time)
        .min()
        .and_then(|start_time| Local.timestamp_opt(start_time, 0).single());
    let today = now.date_naive();
    let book = match earliest_start {
        Some(earliest) => {
            elprisen::Api::new()?
                .load_price_book(&cache.open()?, earliest.date_naive(), today, today)
                .await
        }
        None => PriceBook::default(),
    };

    let breakdowns = sessions
        .iter()
        .filter_map(|session| {
            let zone = zones.get(&session.charger_id).copied().unwrap_or(Zone::Dk2);
            derive_breakdown(&Local, session, zone, &book, now.timestamp())
                .map(|breakdown| (session.session_id.clone(), breakdown))
        })
        .collect();

    Ok(PricedSessions { sessions, breakdowns, earliest_start })
}
