//! Coercion of loosely-typed JSON scalars into record fields.
//!
//! EDGAR payloads are produced by many filers over many years; the same field
//! may arrive as a string, a number, `null`, or be absent entirely. Every
//! conversion here is total: a value that cannot be coerced yields `None`
//! rather than an error, and the caller decides whether that is fatal for
//! the enclosing record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use edgar_core::xbrl::FactValue;
use serde_json::Value;

/// Literal tokens that denote non-finite numbers in EDGAR payloads.
pub(crate) const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

// ─── Text ────────────────────────────────────────────────────────────────────

/// Stringify a scalar. Empty strings, `null`, arrays and objects yield `None`.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// A non-empty JSON string; numbers and other types are rejected.
pub(crate) fn strict_text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
    _ => None,
  }
}

// ─── Numbers and flags ───────────────────────────────────────────────────────

/// A non-negative integer, from a JSON integer or a digit string.
pub(crate) fn non_negative_int(value: Option<&Value>) -> Option<i64> {
  match value? {
    Value::Number(n) => n.as_u64().and_then(|u| i64::try_from(u).ok()),
    Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
      s.parse().ok()
    }
    _ => None,
  }
}

/// A fiscal year, from an integral number or a digit string.
pub(crate) fn fiscal_year(value: Option<&Value>) -> Option<i32> {
  match value? {
    Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        return i32::try_from(i).ok();
      }
      let f = n.as_f64()?;
      (f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64).then_some(f as i32)
    }
    Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
      s.parse().ok()
    }
    _ => None,
  }
}

/// A flag encoded as a JSON boolean or as `0`/`1`.
pub(crate) fn flag(value: Option<&Value>) -> Option<bool> {
  match value? {
    Value::Bool(b) => Some(*b),
    Value::Number(n) => match n.as_i64()? {
      0 => Some(false),
      1 => Some(true),
      _ => None,
    },
    _ => None,
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` calendar date.
pub(crate) fn date(value: Option<&Value>) -> Option<NaiveDate> {
  let Value::String(s) = value? else {
    return None;
  };
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// Accepts RFC 3339 (with `Z` or an explicit offset), offset-less datetimes
/// (taken as UTC) with or without fractional seconds, and bare dates
/// (midnight UTC).
pub(crate) fn datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
  let Value::String(s) = value? else {
    return None;
  };
  let s = s.trim();
  if s.is_empty() {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

// ─── Fact values ─────────────────────────────────────────────────────────────

/// Decide how a raw `val` payload is stored.
///
/// Precedence is fixed: strict numeric coercion first; a payload that
/// coerces to a non-finite number (`NaN`, `Infinity`, `-Infinity`) is kept
/// as its literal text; anything else non-numeric is kept as text. `null`
/// and a missing payload yield `None`.
pub fn coerce_fact_value(raw: Option<&Value>) -> Option<FactValue> {
  match raw? {
    Value::Null => None,
    Value::Number(n) => Some(match n.as_f64() {
      Some(f) if f.is_finite() => FactValue::Numeric(f),
      _ => FactValue::Text(n.to_string()),
    }),
    Value::String(s) => Some(coerce_str(s)),
    Value::Bool(b) => Some(FactValue::Text(b.to_string())),
    other => Some(FactValue::Text(other.to_string())),
  }
}

fn coerce_str(s: &str) -> FactValue {
  match s.trim().parse::<f64>() {
    Ok(f) if f.is_finite() => FactValue::Numeric(f),
    // Non-finite literal: keep the token exactly as it was encountered.
    Ok(_) => FactValue::Text(s.to_string()),
    Err(_) => FactValue::Text(s.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Timelike};
  use serde_json::json;

  use super::*;

  #[test]
  fn numeric_payloads() {
    assert_eq!(
      coerce_fact_value(Some(&json!(1250000))),
      Some(FactValue::Numeric(1_250_000.0))
    );
    assert_eq!(
      coerce_fact_value(Some(&json!("-3.5"))),
      Some(FactValue::Numeric(-3.5))
    );
    assert_eq!(
      coerce_fact_value(Some(&json!(" 42 "))),
      Some(FactValue::Numeric(42.0))
    );
  }

  #[test]
  fn non_finite_tokens_are_kept_verbatim() {
    for token in NON_FINITE_TOKENS {
      assert_eq!(
        coerce_fact_value(Some(&json!(token))),
        Some(FactValue::Text(token.to_string()))
      );
    }
  }

  #[test]
  fn overflowing_literal_is_text() {
    assert_eq!(
      coerce_fact_value(Some(&json!("1e400"))),
      Some(FactValue::Text("1e400".into()))
    );
  }

  #[test]
  fn other_payloads_are_text() {
    assert_eq!(
      coerce_fact_value(Some(&json!("Yes"))),
      Some(FactValue::Text("Yes".into()))
    );
    assert_eq!(
      coerce_fact_value(Some(&json!(true))),
      Some(FactValue::Text("true".into()))
    );
  }

  #[test]
  fn null_and_missing_have_no_value() {
    assert_eq!(coerce_fact_value(Some(&json!(null))), None);
    assert_eq!(coerce_fact_value(None), None);
  }

  #[test]
  fn datetime_variants() {
    let zulu = datetime(Some(&json!("2021-10-29T18:04:01.000Z"))).unwrap();
    assert_eq!((zulu.hour(), zulu.minute(), zulu.second()), (18, 4, 1));

    let naive = datetime(Some(&json!("2021-10-29T18:04:01"))).unwrap();
    assert_eq!(naive, zulu);

    let offset = datetime(Some(&json!("2021-10-29T14:04:01-04:00"))).unwrap();
    assert_eq!(offset, zulu);

    let date_only = datetime(Some(&json!("2005-06-01"))).unwrap();
    assert_eq!((date_only.year(), date_only.hour()), (2005, 0));

    assert!(datetime(Some(&json!("yesterday"))).is_none());
    assert!(datetime(Some(&json!(20211029))).is_none());
  }

  #[test]
  fn date_requires_iso_format() {
    assert!(date(Some(&json!("2020-01-31"))).is_some());
    assert!(date(Some(&json!("01/31/2020"))).is_none());
    assert!(date(Some(&json!(null))).is_none());
  }

  #[test]
  fn integer_helpers() {
    assert_eq!(non_negative_int(Some(&json!(1024))), Some(1024));
    assert_eq!(non_negative_int(Some(&json!("77"))), Some(77));
    assert_eq!(non_negative_int(Some(&json!(-1))), None);
    assert_eq!(fiscal_year(Some(&json!(2020))), Some(2020));
    assert_eq!(fiscal_year(Some(&json!("2019"))), Some(2019));
    assert_eq!(fiscal_year(Some(&json!("FY19"))), None);
    assert_eq!(flag(Some(&json!(1))), Some(true));
    assert_eq!(flag(Some(&json!(false))), Some(false));
    assert_eq!(flag(Some(&json!("yes"))), None);
  }
}
