//! Error type for `edgar-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A ticker that is blank once trimmed.
  #[error("ticker is empty")]
  EmptyTicker,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
