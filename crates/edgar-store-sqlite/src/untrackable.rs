//! The untrackable registry: tickers whose upstream fetch fails permanently,
//! remembered with a cooldown so they can be retried later.
//!
//! Tickers are case-insensitive. The key column uses `COLLATE NOCASE` and
//! every ticker is canonicalized with [`canonical_ticker`] before it is
//! written or compared, so `brk.b` and `BRK.B` share one row.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use edgar_core::untrackable::{UntrackableEntry, canonical_ticker};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Error, Result,
  encode::{decode_dt, encode_dt},
  schema::{UNTRACKABLE_SCHEMA, is_missing_table, table_exists},
};

/// Name of the registry table.
pub const UNTRACKABLE_TABLE: &str = "untrackable_tickers";

/// Create the registry table if it does not exist.
pub fn ensure_untrackable_table(conn: &Connection) -> Result<()> {
  conn
    .execute_batch(UNTRACKABLE_SCHEMA)
    .inspect_err(|e| tracing::error!(table = UNTRACKABLE_TABLE, "failed to create table: {e}"))?;
  Ok(())
}

/// Record `ticker` as untrackable now.
pub fn mark_untrackable(conn: &Connection, ticker: &str, reason: Option<&str>) -> Result<()> {
  mark_untrackable_at(conn, ticker, reason, Utc::now())
}

/// Record `ticker` as untrackable at `at`.
///
/// Re-marking an existing ticker replaces its reason and timestamp.
pub fn mark_untrackable_at(
  conn: &Connection,
  ticker: &str,
  reason: Option<&str>,
  at: DateTime<Utc>,
) -> Result<()> {
  let ticker = canonical_ticker(ticker);
  if ticker.is_empty() {
    return Err(Error::EmptyTicker);
  }
  ensure_untrackable_table(conn)?;

  conn
    .execute(
      "INSERT INTO untrackable_tickers (ticker, reason, last_failed_timestamp)
       VALUES (?1, ?2, ?3)
       ON CONFLICT (ticker) DO UPDATE SET
         reason                = excluded.reason,
         last_failed_timestamp = excluded.last_failed_timestamp",
      rusqlite::params![ticker, reason, encode_dt(at)],
    )
    .inspect_err(|e| tracing::error!(%ticker, "failed to mark ticker untrackable: {e}"))?;

  tracing::info!(%ticker, ?reason, "marked ticker untrackable");
  Ok(())
}

/// Tickers that failed within the last `expiry_days` days.
///
/// Never fails: a missing table or a failed query yields an empty set, so a
/// fetcher consulting the registry simply skips nothing.
pub fn list_untrackable(conn: &Connection, expiry_days: u32) -> HashSet<String> {
  list_untrackable_as_of(conn, expiry_days, Utc::now())
}

/// Tickers whose last failure lies within `expiry_days` days before `now`.
pub fn list_untrackable_as_of(
  conn: &Connection,
  expiry_days: u32,
  now: DateTime<Utc>,
) -> HashSet<String> {
  let cutoff = now
    .checked_sub_signed(Duration::days(i64::from(expiry_days)))
    .unwrap_or(DateTime::<Utc>::MIN_UTC);
  match query_since(conn, cutoff) {
    Ok(tickers) => {
      tracing::debug!(count = tickers.len(), expiry_days, "loaded untrackable tickers");
      tickers
    }
    Err(e) => {
      tracing::error!(table = UNTRACKABLE_TABLE, "failed to list untrackable tickers: {e}");
      HashSet::new()
    }
  }
}

fn query_since(conn: &Connection, cutoff: DateTime<Utc>) -> rusqlite::Result<HashSet<String>> {
  if !table_exists(conn, UNTRACKABLE_TABLE)? {
    return Ok(HashSet::new());
  }
  let mut stmt =
    conn.prepare("SELECT ticker FROM untrackable_tickers WHERE last_failed_timestamp >= ?1")?;
  let rows = stmt.query_map([encode_dt(cutoff)], |r| r.get::<_, String>(0))?;
  rows.map(|t| t.map(|t| canonical_ticker(&t))).collect()
}

/// Look up one registry entry. A missing table reads as an empty registry.
pub fn get_untrackable_entry(conn: &Connection, ticker: &str) -> Result<Option<UntrackableEntry>> {
  let ticker = canonical_ticker(ticker);
  let raw = conn
    .query_row(
      "SELECT ticker, reason, last_failed_timestamp
       FROM untrackable_tickers WHERE ticker = ?1",
      [&ticker],
      |r| {
        Ok((
          r.get::<_, String>(0)?,
          r.get::<_, Option<String>>(1)?,
          r.get::<_, String>(2)?,
        ))
      },
    )
    .optional();

  match raw {
    Ok(Some((ticker, reason, at))) => Ok(Some(UntrackableEntry {
      ticker,
      reason,
      last_failed_timestamp: decode_dt(&at)?,
    })),
    Ok(None) => Ok(None),
    Err(e) if is_missing_table(&e) => Ok(None),
    Err(e) => {
      tracing::error!(%ticker, "failed to read untrackable entry: {e}");
      Err(e.into())
    }
  }
}
