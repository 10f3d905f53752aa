//! Error types for `edgar-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid CIK: {0:?}")]
  InvalidCik(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
