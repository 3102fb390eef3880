//! Hub timestamp format.
//!
//! The hub expects ISO 8601 with seven fractional digits and no zone
//! designator, e.g. `2020-05-28T09:02:49.5754586`. The same shape is used for
//! request expirations (UTC) and for the `s-m-lt` local event time.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

/// Format a wall-clock time as `YYYY-MM-DDTHH:MM:SS.fffffff`.
pub fn format_hub_timestamp(time: NaiveDateTime) -> String {
    // Leap seconds are reported as nanos >= 1e9.
    let ticks = (time.nanosecond() % 1_000_000_000) / 100;
    format!("{}.{:07}", time.format("%Y-%m-%dT%H:%M:%S"), ticks)
}

/// Format a UTC instant, dropping the trailing `Z`.
pub fn format_utc(time: DateTime<Utc>) -> String {
    format_hub_timestamp(time.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_seven_fraction_digits() {
        let t = NaiveDate::from_ymd_opt(2020, 5, 28)
            .unwrap()
            .and_hms_nano_opt(9, 2, 49, 575_458_600)
            .unwrap();
        assert_eq!(format_hub_timestamp(t), "2020-05-28T09:02:49.5754586");
    }

    #[test]
    fn test_zero_fraction_is_padded() {
        let t = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(format_hub_timestamp(t), "2024-01-02T03:04:05.0000000");
    }

    #[test]
    fn test_utc_has_no_zone_suffix() {
        let t = Utc.with_ymd_and_hms(2021, 12, 31, 23, 59, 59).unwrap();
        let s = format_utc(t);
        assert_eq!(s, "2021-12-31T23:59:59.0000000");
        assert!(!s.ends_with('Z'));
    }
}
