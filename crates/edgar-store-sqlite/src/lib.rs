//! SQLite persistence for EDGAR ingestion.
//!
//! Every function borrows a caller-owned [`rusqlite::Connection`]; opening,
//! closing and pragma configuration are the caller's business. Tables are
//! created on demand before the first write, and read paths treat a missing
//! table as empty.
//!
//! Database failures on write paths are logged and returned. Callers running
//! inside an async runtime can drive these functions through
//! `tokio_rusqlite::Connection::call`.

mod encode;
mod inventory;
mod loader;
mod schema;
mod untrackable;

pub mod error;

pub use error::{Error, Result};
pub use inventory::{ARCHIVE_TABLE, ensure_archive_table, get_archive_record, upsert_archive_records};
pub use loader::{LoadStats, ensure_edgar_schema, load_company_facts, load_submission};
pub use schema::table_exists;
pub use untrackable::{
  UNTRACKABLE_TABLE, ensure_untrackable_table, get_untrackable_entry, list_untrackable,
  list_untrackable_as_of, mark_untrackable, mark_untrackable_at,
};
