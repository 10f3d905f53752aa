//! Error types for the EDGAR JSON normalizer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("document is empty")]
  EmptyDocument,

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  /// The document parsed but is not shaped like the expected EDGAR payload.
  #[error("invalid document structure: {0}")]
  InvalidStructure(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
