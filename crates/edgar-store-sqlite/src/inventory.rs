//! The archive inventory: one row per downloaded bulk archive, keyed by its
//! local path.

use edgar_core::archive::ArchiveRecord;
use rusqlite::{Connection, OptionalExtension as _, Row};

use crate::{
  Result,
  encode::{decode_dt, encode_dt},
  schema::{ARCHIVE_SCHEMA, is_missing_table},
};

/// Name of the inventory table.
pub const ARCHIVE_TABLE: &str = "downloaded_archives";

/// Create the inventory table if it does not exist.
pub fn ensure_archive_table(conn: &Connection) -> Result<()> {
  conn
    .execute_batch(ARCHIVE_SCHEMA)
    .inspect_err(|e| tracing::error!(table = ARCHIVE_TABLE, "failed to create table: {e}"))?;
  Ok(())
}

/// Insert or replace inventory rows.
///
/// A record whose `file_path` is already present overwrites every other
/// column of that row. All records are written in one transaction. An empty
/// slice does not touch the database. Returns the number of rows written.
pub fn upsert_archive_records(conn: &Connection, records: &[ArchiveRecord]) -> Result<usize> {
  if records.is_empty() {
    tracing::debug!("no archive records to upsert");
    return Ok(0);
  }
  ensure_archive_table(conn)?;

  let written = match write_records(conn, records) {
    Err(e) if is_missing_table(&e) => {
      tracing::warn!(table = ARCHIVE_TABLE, "table vanished before write; recreating: {e}");
      ensure_archive_table(conn)?;
      write_records(conn, records)
    }
    other => other,
  }
  .inspect_err(|e| tracing::error!(table = ARCHIVE_TABLE, "failed to upsert archive records: {e}"))?;

  tracing::info!(rows = written, "upserted archive records");
  Ok(written)
}

fn write_records(conn: &Connection, records: &[ArchiveRecord]) -> rusqlite::Result<usize> {
  let tx = conn.unchecked_transaction()?;
  {
    let mut stmt = tx.prepare(
      "INSERT OR REPLACE INTO downloaded_archives (
         file_path, file_name, url, size_bytes,
         local_last_modified_utc, download_timestamp_utc, status
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for r in records {
      stmt.execute(rusqlite::params![
        r.file_path,
        r.file_name,
        r.url,
        r.size_bytes,
        r.local_last_modified_utc.map(encode_dt),
        r.download_timestamp_utc.map(encode_dt),
        r.status,
      ])?;
    }
  }
  tx.commit()?;
  Ok(records.len())
}

/// Look up one inventory row. A missing table reads as an empty inventory.
pub fn get_archive_record(conn: &Connection, file_path: &str) -> Result<Option<ArchiveRecord>> {
  let raw = conn
    .query_row(
      "SELECT file_path, file_name, url, size_bytes,
              local_last_modified_utc, download_timestamp_utc, status
       FROM downloaded_archives WHERE file_path = ?1",
      [file_path],
      RawArchiveRecord::from_row,
    )
    .optional();

  match raw {
    Ok(Some(raw)) => Ok(Some(raw.into_record()?)),
    Ok(None) => Ok(None),
    Err(e) if is_missing_table(&e) => Ok(None),
    Err(e) => {
      tracing::error!(table = ARCHIVE_TABLE, "failed to read archive record: {e}");
      Err(e.into())
    }
  }
}

/// Raw column values of a `downloaded_archives` row.
struct RawArchiveRecord {
  file_path:               String,
  file_name:               Option<String>,
  url:                     Option<String>,
  size_bytes:              Option<i64>,
  local_last_modified_utc: Option<String>,
  download_timestamp_utc:  Option<String>,
  status:                  Option<String>,
}

impl RawArchiveRecord {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file_path:               row.get(0)?,
      file_name:               row.get(1)?,
      url:                     row.get(2)?,
      size_bytes:              row.get(3)?,
      local_last_modified_utc: row.get(4)?,
      download_timestamp_utc:  row.get(5)?,
      status:                  row.get(6)?,
    })
  }

  fn into_record(self) -> Result<ArchiveRecord> {
    Ok(ArchiveRecord {
      file_path:               self.file_path,
      file_name:               self.file_name,
      url:                     self.url,
      size_bytes:              self.size_bytes,
      local_last_modified_utc: self.local_last_modified_utc.as_deref().map(decode_dt).transpose()?,
      download_timestamp_utc:  self.download_timestamp_utc.as_deref().map(decode_dt).transpose()?,
      status:                  self.status,
    })
  }
}
