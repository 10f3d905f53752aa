//! Inventory records describing archives on disk.

use std::path::Path;

use chrono::{DateTime, Utc};
use edgar_core::archive::ArchiveRecord;

/// Build an inventory record from an archive's filesystem metadata.
///
/// `url` and `download_timestamp_utc` are left for the caller; they are not
/// recoverable from the file itself.
pub fn inventory_record(
  path: impl AsRef<Path>,
  status: impl Into<String>,
) -> std::io::Result<ArchiveRecord> {
  let path = path.as_ref();
  let meta = std::fs::metadata(path)?;

  let mut record = ArchiveRecord::new(path.to_string_lossy());
  record.file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
  record.size_bytes = i64::try_from(meta.len()).ok();
  record.local_last_modified_utc = meta.modified().ok().map(DateTime::<Utc>::from);
  record.status = Some(status.into());
  Ok(record)
}
