//! Text encodings for the date and time columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with fixed microsecond
//! precision and a `Z` suffix, so lexical order in SQL equals chronological
//! order. Calendar dates are stored as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let b = a + Duration::microseconds(1);
    let c = a + Duration::days(400);
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(c));
    assert_eq!(encode_dt(a), "2024-01-01T09:00:00.000000Z");
  }

  #[test]
  fn timestamps_round_trip() {
    let t = Utc.with_ymd_and_hms(2023, 6, 30, 23, 59, 59).unwrap() + Duration::microseconds(42);
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
