use crate::errors::SleepError;
use chrono::{Duration, NaiveDate, NaiveTime};

const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

pub fn parse_time_of_day(field: &str, value: &str) -> Result<NaiveTime, SleepError> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| SleepError::validation(field, format!("'{value}' is not a time of day")))
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, SleepError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SleepError::validation(field, format!("'{value}' is not a YYYY-MM-DD date")))
}

/// Hours between bedtime and wake time. A wake time not after bedtime
/// belongs to the following day, so equal times give a full 24 hours.
pub fn hours_between(bedtime: NaiveTime, waketime: NaiveTime) -> f64 {
    let mut elapsed = waketime - bedtime;
    if elapsed <= Duration::zero() {
        elapsed += Duration::days(1);
    }
    elapsed.num_seconds() as f64 / 3600.0
}

pub fn sleep_duration(bedtime: &str, waketime: &str) -> Result<f64, SleepError> {
    let bed = parse_time_of_day("bedtime", bedtime)?;
    let wake = parse_time_of_day("waketime", waketime)?;
    Ok(hours_between(bed, wake))
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_day_duration_is_exact() {
        assert_eq!(sleep_duration("13:00", "15:30").unwrap(), 2.5);
        assert_eq!(sleep_duration("00:15", "07:45").unwrap(), 7.5);
    }

    #[test]
    fn overnight_duration_wraps_to_next_day() {
        assert_eq!(sleep_duration("23:00", "07:00").unwrap(), 8.0);
        assert_eq!(sleep_duration("23:30", "06:30").unwrap(), 7.0);
        assert_eq!(sleep_duration("22:45", "00:00").unwrap(), 1.25);
    }

    #[test]
    fn equal_times_are_a_full_day() {
        assert_eq!(sleep_duration("07:00", "07:00").unwrap(), 24.0);
    }

    #[test]
    fn seconds_are_accepted() {
        assert_eq!(sleep_duration("23:00:00", "06:30:00").unwrap(), 7.5);
    }

    #[test]
    fn malformed_time_names_the_field() {
        let err = sleep_duration("23:00", "seven").unwrap_err();
        assert!(matches!(err, SleepError::Validation { ref field, .. } if field == "waketime"));

        let err = sleep_duration("25:00", "07:00").unwrap_err();
        assert!(matches!(err, SleepError::Validation { ref field, .. } if field == "bedtime"));
    }

    #[test]
    fn rounding_call_sites_differ() {
        let hours = sleep_duration("23:10", "06:30").unwrap();
        assert_eq!(round1(hours), 7.3);
        assert_eq!(round2(hours), 7.33);
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date("date", "2024-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(parse_date("date", "01/01/2024").is_err());
    }
}
