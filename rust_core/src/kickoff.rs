//! Kickoff time normalization.
//!
//! Crown lists kickoffs as `MM-DD HH:MMa` / `MM-DD HH:MMp`: no year, 12-hour
//! clock, site-local time. The year is inferred from the batch generation
//! time, moving to the adjacent year when that lands closer.

use crate::config::MatcherConfig;
use crate::error::{LinkError, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;

/// Parser for Crown kickoff tokens.
#[derive(Debug, Clone)]
pub struct KickoffParser {
    pattern: Regex,
    offset: FixedOffset,
    year_shift: Duration,
}

impl KickoffParser {
    pub fn new(utc_offset_minutes: i32, year_shift_days: i64) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            LinkError::Config(format!("invalid UTC offset: {} minutes", utc_offset_minutes))
        })?;
        let pattern = Regex::new(
            r"^([0-9]{1,2})-([0-9]{1,2})[ \t]+([0-9]{1,2}):([0-9]{2})[ \t]*([aApP])[mM]?$",
        )
        .map_err(|e| LinkError::Config(format!("kickoff pattern: {}", e)))?;
        Ok(Self {
            pattern,
            offset,
            year_shift: Duration::days(year_shift_days.max(0)),
        })
    }

    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        Self::new(config.crown_utc_offset_minutes, config.year_shift_days)
    }

    /// Parse a Crown token against the batch reference instant.
    ///
    /// Returns `None` for anything unparsable or out of range.
    pub fn parse_crown(&self, token: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let caps = self.pattern.captures(token.trim())?;
        let month: u32 = caps.get(1)?.as_str().parse().ok()?;
        let day: u32 = caps.get(2)?.as_str().parse().ok()?;
        let hour12: u32 = caps.get(3)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(4)?.as_str().parse().ok()?;
        let pm = caps.get(5)?.as_str().eq_ignore_ascii_case("p");

        if !(1..=12).contains(&hour12) || minute > 59 {
            return None;
        }
        let hour = match (hour12, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };

        let reference_year = reference.with_timezone(&self.offset).year();
        let at_year = |year: i32| -> Option<DateTime<Utc>> {
            let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
            self.offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        };
        let gap = |dt: &DateTime<Utc>| (*dt - reference).num_seconds().abs();

        if let Some(candidate) = at_year(reference_year) {
            if gap(&candidate) <= self.year_shift.num_seconds() {
                return Some(candidate);
            }
        }

        // Outside the window (or no such date this year): take the closest of
        // the adjacent years.
        [reference_year, reference_year - 1, reference_year + 1]
            .into_iter()
            .filter_map(at_year)
            .min_by_key(gap)
    }
}

/// Absolute difference between two instants in whole minutes.
pub fn minutes_apart(a: DateTime<Utc>, b: DateTime<Utc>) -> u32 {
    u32::try_from((a - b).num_minutes().unsigned_abs()).unwrap_or(u32::MAX)
}

/// Instant from epoch milliseconds, `None` when out of range.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> KickoffParser {
        KickoffParser::from_config(&MatcherConfig::default()).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    // -------------------------------------------------------------------------
    // Clock handling
    // -------------------------------------------------------------------------

    #[test]
    fn test_afternoon_in_site_offset() {
        let kickoff = parser().parse_crown("10-05 03:30p", utc("2025-10-05T12:00:00Z"));
        assert_eq!(kickoff, Some(utc("2025-10-05T19:30:00Z")));
    }

    #[test]
    fn test_midnight_and_noon() {
        let reference = utc("2025-10-05T12:00:00Z");
        assert_eq!(
            parser().parse_crown("10-05 12:15a", reference),
            Some(utc("2025-10-05T04:15:00Z"))
        );
        assert_eq!(
            parser().parse_crown("10-05 12:45p", reference),
            Some(utc("2025-10-05T16:45:00Z"))
        );
    }

    #[test]
    fn test_case_and_suffix_tolerated() {
        let reference = utc("2025-10-05T12:00:00Z");
        let expected = Some(utc("2025-10-05T19:30:00Z"));
        assert_eq!(parser().parse_crown("10-05 03:30P", reference), expected);
        assert_eq!(parser().parse_crown(" 10-05 3:30pm ", reference), expected);
    }

    #[test]
    fn test_custom_offset() {
        let utc_parser = KickoffParser::new(0, 183).unwrap();
        let kickoff = utc_parser.parse_crown("10-05 03:30p", utc("2025-10-05T12:00:00Z"));
        assert_eq!(kickoff, Some(utc("2025-10-05T15:30:00Z")));
        assert!(KickoffParser::new(24 * 60, 183).is_err());
    }

    // -------------------------------------------------------------------------
    // Year inference
    // -------------------------------------------------------------------------

    #[test]
    fn test_december_batch_january_fixture() {
        let kickoff = parser().parse_crown("01-02 07:00p", utc("2025-12-30T00:00:00Z"));
        assert_eq!(kickoff, Some(utc("2026-01-02T23:00:00Z")));
    }

    #[test]
    fn test_january_batch_december_fixture() {
        let kickoff = parser().parse_crown("12-30 08:00p", utc("2026-01-02T12:00:00Z"));
        assert_eq!(kickoff, Some(utc("2025-12-31T00:00:00Z")));
    }

    #[test]
    fn test_leap_day() {
        let kickoff = parser().parse_crown("02-29 03:00p", utc("2024-02-20T00:00:00Z"));
        assert_eq!(kickoff, Some(utc("2024-02-29T19:00:00Z")));
    }

    // -------------------------------------------------------------------------
    // Rejections
    // -------------------------------------------------------------------------

    #[test]
    fn test_unparsable_tokens() {
        let reference = utc("2025-10-05T12:00:00Z");
        for token in [
            "",
            "TBD",
            "13-40 03:30p",
            "10-05 13:30p",
            "10-05 00:30a",
            "10-05 03:75p",
            "2025-10-05T15:30",
        ] {
            assert_eq!(parser().parse_crown(token, reference), None, "{:?}", token);
        }
    }

    #[test]
    fn test_minutes_apart() {
        let a = utc("2025-10-05T19:30:00Z");
        let b = utc("2025-10-05T19:38:00Z");
        assert_eq!(minutes_apart(a, b), 8);
        assert_eq!(minutes_apart(b, a), 8);
    }

    #[test]
    fn test_from_epoch_millis() {
        assert_eq!(from_epoch_millis(0), Some(utc("1970-01-01T00:00:00Z")));
        assert_eq!(from_epoch_millis(i64::MAX), None);
    }
}
