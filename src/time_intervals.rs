//! UTC request windows aligned to quarter-hour boundaries.

use crate::error::IntervalError;
use chrono::{DateTime, Duration, DurationRound, Utc};
use serde_derive::{Deserialize, Serialize};

/// Default collection cadence in minutes.
pub const DEFAULT_WINDOW_MINUTES: i64 = 15;

/// Floors a timestamp to the previous quarter hour, e.g. 10:49:12 -> 10:45:00.
pub fn fifteen_minute_mark(dtm: DateTime<Utc>) -> DateTime<Utc> {
    // duration_trunc only fails for out-of-range timestamps
    dtm.duration_trunc(Duration::minutes(15)).unwrap_or(dtm)
}

/// Start/end pair in UTC with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct UtcInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for UtcInterval {
    type Error = IntervalError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        UtcInterval::new(raw.start, raw.end)
    }
}

impl UtcInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, IntervalError> {
        if end < start {
            return Err(IntervalError::EndBeforeStart {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Window of `minutes` ending at the quarter-hour mark at or before `dtm`.
    pub fn previous_interval(dtm: DateTime<Utc>, minutes: i64) -> Self {
        let end = fifteen_minute_mark(dtm);
        Self {
            start: end - Duration::minutes(minutes.max(0)),
            end,
        }
    }

    /// Inclusive 15 minute window, e.g. 03:10 -> (02:45, 03:00).
    ///
    /// Successive calls every 15 minutes overlap on their boundaries.
    pub fn previous_fifteen_minutes(dtm: DateTime<Utc>) -> Self {
        Self::previous_interval(dtm, 15)
    }

    /// Non-overlapping 14 minute window, e.g. 03:10 -> (02:46, 03:00).
    pub fn previous_fourteen_minutes(dtm: DateTime<Utc>) -> Self {
        Self::previous_interval(dtm, 14)
    }

    /// Window of `minutes` beginning exactly at `start`.
    pub fn starting_at(start: DateTime<Utc>, minutes: i64) -> Self {
        Self {
            start,
            end: start + Duration::minutes(minutes.max(0)),
        }
    }

    pub fn with_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start,
            end: start + duration.max(Duration::zero()),
        }
    }

    /// Same as [`UtcInterval::previous_interval`], named for the one-bound case.
    pub fn ending_at(end: DateTime<Utc>, minutes: i64) -> Self {
        Self::previous_interval(end, minutes)
    }
}

impl std::fmt::Display for UtcInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, s).unwrap()
    }

    mod succeeds {
        use super::*;

        #[test]
        fn test_fifteen_minute_mark() {
            assert_eq!(fifteen_minute_mark(at(10, 49, 12)), at(10, 45, 0));
            assert_eq!(fifteen_minute_mark(at(10, 45, 0)), at(10, 45, 0));
            assert_eq!(fifteen_minute_mark(at(0, 14, 59)), at(0, 0, 0));
        }

        #[test]
        fn test_previous_fifteen_minutes() {
            let interval = UtcInterval::previous_fifteen_minutes(at(3, 10, 15));
            assert_eq!(interval.start(), at(2, 45, 0));
            assert_eq!(interval.end(), at(3, 0, 0));
        }

        #[test]
        fn test_previous_fourteen_minutes() {
            let interval = UtcInterval::previous_fourteen_minutes(at(3, 10, 15));
            assert_eq!(interval.start(), at(2, 46, 0));
            assert_eq!(interval.end(), at(3, 0, 0));
        }

        #[test]
        fn test_starting_at() {
            let interval = UtcInterval::starting_at(at(1, 7, 0), 15);
            assert_eq!(interval.start(), at(1, 7, 0));
            assert_eq!(interval.end(), at(1, 22, 0));
        }

        #[test]
        fn test_equal_bounds_allowed() {
            let interval = UtcInterval::new(at(1, 0, 0), at(1, 0, 0)).unwrap();
            assert_eq!(interval.duration(), Duration::zero());
        }

        #[test]
        fn test_serde_round_trip() {
            let interval = UtcInterval::new(at(1, 0, 0), at(1, 15, 0)).unwrap();
            let json = serde_json::to_string(&interval).unwrap();
            assert_eq!(
                json,
                r#"{"start":"2024-03-10T01:00:00Z","end":"2024-03-10T01:15:00Z"}"#
            );
            let back: UtcInterval = serde_json::from_str(&json).unwrap();
            assert_eq!(back, interval);
        }
    }

    mod fails {
        use super::*;

        #[test]
        fn test_end_before_start() {
            let result = UtcInterval::new(at(2, 0, 0), at(1, 0, 0));
            assert!(matches!(result, Err(IntervalError::EndBeforeStart { .. })));
        }

        #[test]
        fn test_deserialize_rejects_reversed_bounds() {
            let json = r#"{"start":"2024-03-10T02:00:00Z","end":"2024-03-10T01:00:00Z"}"#;
            assert!(serde_json::from_str::<UtcInterval>(json).is_err());
        }
    }
}
