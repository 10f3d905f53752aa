//! Metadata about downloaded bulk archives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the archive inventory, keyed by `file_path`.
///
/// Upserting a record whose `file_path` already exists overwrites every other
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
  pub file_path:               String,
  pub file_name:               Option<String>,
  pub url:                     Option<String>,
  pub size_bytes:              Option<i64>,
  pub local_last_modified_utc: Option<DateTime<Utc>>,
  pub download_timestamp_utc:  Option<DateTime<Utc>>,
  pub status:                  Option<String>,
}

impl ArchiveRecord {
  /// A record with only the key populated.
  pub fn new(file_path: impl Into<String>) -> Self {
    Self {
      file_path:               file_path.into(),
      file_name:               None,
      url:                     None,
      size_bytes:              None,
      local_last_modified_utc: None,
      download_timestamp_utc:  None,
      status:                  None,
    }
  }
}
