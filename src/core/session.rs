use serde::Deserialize;

use crate::{
    prelude::*,
    quantity::{current::Amperes, energy::WattHours},
};

/// Synthetic duration substituted when a session reports `end_time` at or
/// before `start_time` (a known upstream data-quality defect).
pub const REPAIRED_DURATION: i64 = 1800;

/// One raw telemetry point within a session: the maximum current offered to
/// the vehicle and the current it actually drew, either of which may be
/// missing.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargingSample {
    pub timestamp: i64,

    #[serde(default)]
    pub offered: Option<Amperes>,

    #[serde(default)]
    pub usage: Option<Amperes>,
}

#[cfg(test)]
impl ChargingSample {
    pub const fn at(timestamp: i64) -> Self {
        Self { timestamp, offered: None, usage: None }
    }

    pub fn with_usage(mut self, amperes: f64) -> Self {
        self.usage = Some(Amperes(amperes));
        self
    }

    pub fn with_offered(mut self, amperes: f64) -> Self {
        self.offered = Some(Amperes(amperes));
        self
    }
}

/// One charging event as reported by the backend. Read-mostly: the pipeline
/// never writes back into it.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub charger_id: String,

    #[serde(default)]
    pub charger_alias: String,

    #[serde(default)]
    pub group_id: String,

    #[serde(default)]
    pub user_name: String,

    pub start_time: i64,

    /// [`None`] while the session is still in progress.
    #[serde(default)]
    pub end_time: Option<i64>,

    /// Ground-truth total energy reported by the charger's meter.
    #[serde(default)]
    pub energy_meter: WattHours,

    #[serde(default)]
    pub charging_history: Vec<ChargingSample>,
}

impl Session {
    /// Resolve the session end: `now` while in progress, and a synthetic
    /// 30-minute duration when the reported end precedes the start.
    #[must_use]
    pub fn effective_end_time(&self, now: i64) -> i64 {
        match self.end_time {
            Some(end_time) if end_time <= self.start_time => {
                warn!(
                    session_id = %self.session_id,
                    start_time = self.start_time,
                    end_time,
                    "end time precedes start time, repairing",
                );
                self.start_time + REPAIRED_DURATION
            }
            Some(end_time) => end_time,
            None => now,
        }
    }
}

/// Electricity pricing zone of a charger.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display, Deserialize,
)]
pub enum Zone {
    #[display("DK1")]
    Dk1,

    #[display("DK2")]
    Dk2,
}

impl Zone {
    pub const ALL: [Self; 2] = [Self::Dk1, Self::Dk2];

    /// Detect the zone from a charger's free-text description, defaulting
    /// to [`Zone::Dk2`].
    #[must_use]
    pub fn detect(description: &str) -> Self {
        if description.contains("DK1") { Self::Dk1 } else { Self::Dk2 }
    }
}

/// One charge point as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct Charger {
    pub charger_id: String,

    #[serde(default)]
    pub alias: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub group_id: String,
}

impl Charger {
    /// Structured pricing zone, resolved once from the free-text description.
    #[must_use]
    pub fn zone(&self) -> Zone {
        Zone::detect(&self.description)
    }
}

/// One charger group as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub group_id: String,

    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(start_time: i64, end_time: Option<i64>) -> Session {
        Session {
            session_id: "S-1".to_string(),
            charger_id: "C-1".to_string(),
            charger_alias: String::new(),
            group_id: String::new(),
            user_name: String::new(),
            start_time,
            end_time,
            energy_meter: WattHours(500.0),
            charging_history: Vec::new(),
        }
    }

    #[test]
    fn test_effective_end_time_passthrough() {
        assert_eq!(session(1000, Some(2000)).effective_end_time(9000), 2000);
    }

    #[test]
    fn test_effective_end_time_in_progress() {
        assert_eq!(session(1000, None).effective_end_time(9000), 9000);
    }

    #[test]
    fn test_effective_end_time_repairs_inverted_session() {
        assert_eq!(session(1000, Some(900)).effective_end_time(9000), 2800);
        assert_eq!(session(1000, Some(1000)).effective_end_time(9000), 2800);
    }

    #[test]
    fn test_zone_detection() {
        assert_eq!(Zone::detect("garage, west coast DK1 rate"), Zone::Dk1);
        assert_eq!(Zone::detect("no zone here"), Zone::Dk2);
        assert_eq!(Zone::detect(""), Zone::Dk2);
    }
}
