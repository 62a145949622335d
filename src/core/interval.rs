use std::fmt::{Debug, Formatter};

pub const HOUR: i64 = 3600;

/// Floor a unix timestamp to the top of its hour.
#[must_use]
pub const fn floor_to_hour(timestamp: i64) -> i64 {
    timestamp - timestamp.rem_euclid(HOUR)
}

/// Half-open `[start, end)` range over unix seconds.
#[must_use]
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl Debug for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl TimeRange {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(self) -> i64 {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() <= 0
    }

    /// Overlap length with the other range in seconds, possibly negative
    /// when the ranges are disjoint.
    #[must_use]
    pub fn overlap(self, other: Self) -> i64 {
        self.end.min(other.end) - self.start.max(other.start)
    }

    #[must_use]
    pub const fn contains_range(self, other: Self) -> bool {
        (self.start <= other.start) && (other.end <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_to_hour() {
        assert_eq!(floor_to_hour(0), 0);
        assert_eq!(floor_to_hour(3599), 0);
        assert_eq!(floor_to_hour(3600), 3600);
        assert_eq!(floor_to_hour(5401), 3600);
        assert_eq!(floor_to_hour(-1), -3600);
    }

    #[test]
    fn test_overlap() {
        let hour = TimeRange::new(3600, 7200);
        assert_eq!(hour.overlap(TimeRange::new(0, 5400)), 1800);
        assert_eq!(hour.overlap(TimeRange::new(4000, 5000)), 1000);
        assert!(hour.overlap(TimeRange::new(0, 3600)) <= 0);
    }

    #[test]
    fn test_contains_range() {
        let day = TimeRange::new(0, 86400);
        assert!(day.contains_range(TimeRange::new(3600, 7200)));
        assert!(day.contains_range(TimeRange::new(82800, 86400)));
        assert!(!day.contains_range(TimeRange::new(82800, 86401)));
    }
}
