//! Time helpers
//!
//! Calendar dates (`YYYY-MM-DD`) are used for subscription scheduling;
//! instants are stored as RFC3339 UTC strings via chrono serde.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::{AppError, AppResult};

/// Current instant
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today as a calendar date (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Parse a run time ("HH:MM"), falling back to 02:00 on malformed input
pub fn parse_run_time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M")
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default())
}

/// Duration until the next daily occurrence of `run_time` (UTC)
pub fn duration_until_next_run(run_time: NaiveTime) -> std::time::Duration {
    let now = Utc::now();
    let today = now.date_naive();

    let target_date = if now.time() >= run_time {
        today + chrono::Duration::days(1)
    } else {
        today
    };

    let target = target_date.and_time(run_time).and_utc();
    let until = target.signed_duration_since(now);
    if until.num_seconds() <= 0 {
        // Safety net: never return a zero sleep
        std::time::Duration::from_secs(60)
    } else {
        until.to_std().unwrap_or(std::time::Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso() {
        assert_eq!(
            parse_date("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date("01/03/2026").is_err());
    }

    #[test]
    fn run_time_falls_back_on_garbage() {
        assert_eq!(parse_run_time("05:30"), NaiveTime::from_hms_opt(5, 30, 0).unwrap());
        assert_eq!(parse_run_time("not-a-time"), NaiveTime::from_hms_opt(2, 0, 0).unwrap());
    }

    #[test]
    fn next_run_is_in_the_future() {
        let duration = duration_until_next_run(NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        assert!(duration.as_secs() > 0);
        assert!(duration.as_secs() <= 24 * 3600);
    }
}
