use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

use crate::errors::{Result, ValidationError};

/// Default timezone for valuation dates.
/// Ledger dates and market closes are US-market dates, so "today" is taken in New York.
pub const DEFAULT_VALUATION_TZ: Tz = chrono_tz::America::New_York;

/// Date format used by ledgers, settings and cache files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts a UTC instant to a valuation date in the given timezone.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Convenience function that uses the default valuation timezone.
pub fn valuation_date_today() -> NaiveDate {
    valuation_date_from_utc(Utc::now(), DEFAULT_VALUATION_TZ)
}

/// Parse a `YYYY-MM-DD` string. A malformed string is a caller bug and is
/// reported as a validation error.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        ValidationError::InvalidInput(format!("invalid date '{}': {}", value, e)).into()
    })
}

/// Every calendar day from `start` to `end`, inclusive.
pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_between_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let days = get_days_between(start, end);
        assert_eq!(days.len(), 5); // leap year: 27, 28, 29, 1, 2
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(get_days_between(end, start).is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(parse_date("01/05/2024").is_err());
    }

    #[test]
    fn test_is_weekday() {
        assert!(is_weekday(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())); // Friday
        assert!(!is_weekday(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()));
    }
}
