//! Tweet timestamp conversions
//!
//! The API reports `created_at` as `Thu Jun 04 01:00:01 +0000 2020`; sinks
//! also want Unix seconds, an Excel serial date and Japan Standard Time.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::{Error, Result};

/// `created_at` layout used by the API
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

const SECONDS_PER_DAY: f64 = 86_400.0;
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Parse an API `created_at` string
pub fn parse_created_at(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| Error::InvalidDate {
            value: value.to_string(),
            source,
        })
}

pub fn to_epoch(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp()
}

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Days since 1899-12-30 plus the elapsed fraction of the day
pub fn to_excel_serial(dt: &DateTime<Utc>) -> f64 {
    let delta = dt.naive_utc() - excel_epoch();
    let days = delta.num_days();
    let secs = (delta - Duration::days(days)).num_seconds();
    let micros = dt.timestamp_subsec_micros();
    days as f64 + secs as f64 / 3600.0 / 24.0 + f64::from(micros) / 1_000_000.0 / SECONDS_PER_DAY
}

/// Inverse of [`to_excel_serial`], rounded to the second
pub fn from_excel_serial(serial: f64) -> DateTime<Utc> {
    let days = serial.floor();
    let secs = ((serial - days) * SECONDS_PER_DAY).round() as i64;
    let naive = excel_epoch() + Duration::days(days as i64) + Duration::seconds(secs);
    Utc.from_utc_datetime(&naive)
}

/// `2020-06-04 10:00:01 JST`
pub fn to_jst_string(dt: &DateTime<Utc>) -> String {
    match FixedOffset::east_opt(JST_OFFSET_SECS) {
        Some(jst) => dt.with_timezone(&jst).format("%Y-%m-%d %H:%M:%S JST").to_string(),
        None => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}

/// Unix seconds as local `%Y-%m-%d %H:%M:%S`
pub fn epoch_to_local_string(epoch: i64) -> String {
    match Local.timestamp_opt(epoch, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => epoch.to_string(),
    }
}

/// Calendar date used by resume markers
pub fn to_date_string(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATED_AT: &str = "Thu Jun 04 01:00:01 +0000 2020";

    #[test]
    fn test_parse_created_at() {
        let dt = parse_created_at(CREATED_AT).unwrap();
        assert_eq!(to_epoch(&dt), 1591232401);
        assert_eq!(to_date_string(&dt), "2020-06-04");
    }

    #[test]
    fn test_parse_rejects_other_layouts() {
        let err = parse_created_at("2020-06-04T01:00:01Z").unwrap_err();
        assert!(matches!(err, Error::InvalidDate { ref value, .. } if value == "2020-06-04T01:00:01Z"));
    }

    #[test]
    fn test_excel_serial() {
        let dt = parse_created_at(CREATED_AT).unwrap();
        assert_eq!(to_excel_serial(&dt).to_string(), "43986.04167824074");

        let other = parse_created_at("Fri Feb 28 10:49:20 +0000 2020").unwrap();
        assert_eq!(to_excel_serial(&other).to_string(), "43889.45092592593");
    }

    #[test]
    fn test_excel_serial_inverse() {
        let dt = parse_created_at(CREATED_AT).unwrap();
        assert_eq!(from_excel_serial(to_excel_serial(&dt)), dt);
    }

    #[test]
    fn test_jst_string() {
        let dt = parse_created_at(CREATED_AT).unwrap();
        assert_eq!(to_jst_string(&dt), "2020-06-04 10:00:01 JST");

        let late = parse_created_at("Sun Dec 31 20:30:00 +0000 2023").unwrap();
        assert_eq!(to_jst_string(&late), "2024-01-01 05:30:00 JST");
    }

    #[test]
    fn test_epoch_to_local_string_shape() {
        let formatted = epoch_to_local_string(1591232401);
        assert_eq!(formatted.len(), "2020-06-04 01:00:01".len());
        assert!(formatted.starts_with("2020-06-0"));
    }
}
