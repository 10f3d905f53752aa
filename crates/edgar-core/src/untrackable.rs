//! Tickers permanently rejected by an upstream source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the untrackable registry.
///
/// `ticker` is compared case-insensitively; see [`canonical_ticker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntrackableEntry {
  pub ticker:                String,
  pub reason:                Option<String>,
  pub last_failed_timestamp: DateTime<Utc>,
}

/// The stored form of a ticker symbol: trimmed and uppercased.
pub fn canonical_ticker(ticker: &str) -> String { ticker.trim().to_uppercase() }
