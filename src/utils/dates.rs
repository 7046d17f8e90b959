use chrono::{DateTime, NaiveDate, Utc};

pub const DATE_FORMAT: &str = "%Y/%m/%d";
pub const DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M";
/// Used by transaction and submission views
pub const COMPACT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(ts: DateTime<Utc>) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

pub fn format_compact_datetime(ts: DateTime<Utc>) -> String {
    ts.format(COMPACT_DATETIME_FORMAT).to_string()
}

/// Whole days from `today` until `due`; negative when overdue.
pub fn days_remaining(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_remaining() {
        assert_eq!(days_remaining(d(2025, 3, 10), d(2025, 3, 1)), 9);
        assert_eq!(days_remaining(d(2025, 3, 1), d(2025, 3, 1)), 0);
        assert_eq!(days_remaining(d(2025, 2, 27), d(2025, 3, 1)), -2);
        assert_eq!(days_remaining(d(2025, 1, 1), d(2024, 12, 31)), 1);
    }

    #[test]
    fn test_formats() {
        assert_eq!(format_date(d(2025, 9, 1)), "2025/09/01");
        let ts = Utc.with_ymd_and_hms(2025, 9, 1, 14, 5, 0).unwrap();
        assert_eq!(format_datetime(ts), "2025/09/01 14:05");
        assert_eq!(format_compact_datetime(ts), "2025-09-01 14:05");
    }
}
