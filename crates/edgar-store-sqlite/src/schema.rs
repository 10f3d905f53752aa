//! SQL schema for the EDGAR store.
//!
//! Every statement is idempotent (`CREATE ... IF NOT EXISTS`), so each
//! component runs its own DDL before first use instead of relying on a
//! migration step.

use rusqlite::{Connection, OptionalExtension as _};

/// Inventory of downloaded bulk archives.
pub const ARCHIVE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS downloaded_archives (
    file_path               TEXT PRIMARY KEY,
    file_name               TEXT,
    url                     TEXT,
    size_bytes              INTEGER,
    local_last_modified_utc TEXT,      -- RFC 3339 UTC
    download_timestamp_utc  TEXT,      -- RFC 3339 UTC
    status                  TEXT
);
";

/// Tickers whose upstream fetch fails permanently.
pub const UNTRACKABLE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS untrackable_tickers (
    ticker                TEXT PRIMARY KEY COLLATE NOCASE,
    reason                TEXT,
    last_failed_timestamp TEXT NOT NULL   -- RFC 3339 UTC, fixed width
);
";

/// Normalized submission and company-facts records.
///
/// No foreign keys: facts may legitimately arrive before their filing, and
/// orphan detection is a reporting concern.
pub const EDGAR_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS companies (
    cik                        TEXT PRIMARY KEY,
    primary_name               TEXT,
    entity_name_cf             TEXT,   -- entity name from company facts
    entity_type                TEXT,
    sic                        TEXT,
    sic_description            TEXT,
    ein                        TEXT,
    description                TEXT,
    category                   TEXT,
    fiscal_year_end            TEXT,
    state_of_incorporation     TEXT,
    phone                      TEXT,
    flags                      TEXT,
    mailing_street1            TEXT,
    mailing_street2            TEXT,
    mailing_city               TEXT,
    mailing_state_or_country   TEXT,
    mailing_zip_code           TEXT,
    business_street1           TEXT,
    business_street2           TEXT,
    business_city              TEXT,
    business_state_or_country  TEXT,
    business_zip_code          TEXT,
    last_parsed_timestamp      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tickers (
    cik      TEXT NOT NULL,
    ticker   TEXT NOT NULL,
    exchange TEXT NOT NULL,
    source   TEXT,
    PRIMARY KEY (cik, ticker, exchange)
);

-- Replaced wholesale per company on every load.
CREATE TABLE IF NOT EXISTS former_names (
    cik         TEXT NOT NULL,
    former_name TEXT NOT NULL,
    date_from   TEXT,
    date_to     TEXT
);

CREATE TABLE IF NOT EXISTS filings (
    accession_number        TEXT PRIMARY KEY,
    cik                     TEXT NOT NULL,
    form                    TEXT NOT NULL,
    filing_date             TEXT NOT NULL,
    report_date             TEXT,
    acceptance_datetime     TEXT,
    act                     TEXT,
    file_number             TEXT,
    film_number             TEXT,
    items                   TEXT,
    size                    INTEGER,
    is_xbrl                 INTEGER,
    is_inline_xbrl          INTEGER,
    primary_document        TEXT,
    primary_doc_description TEXT
);

CREATE TABLE IF NOT EXISTS xbrl_tags (
    taxonomy    TEXT NOT NULL,
    tag_name    TEXT NOT NULL,
    label       TEXT,
    description TEXT,
    PRIMARY KEY (taxonomy, tag_name)
);

CREATE TABLE IF NOT EXISTS xbrl_facts (
    fact_id           INTEGER PRIMARY KEY,
    cik               TEXT NOT NULL,
    accession_number  TEXT NOT NULL,
    taxonomy          TEXT NOT NULL,
    tag_name          TEXT NOT NULL,
    unit              TEXT NOT NULL,
    period_start_date TEXT,
    period_end_date   TEXT,
    value_numeric     REAL,
    value_text        TEXT,
    fy                INTEGER,
    fp                TEXT,
    form              TEXT NOT NULL,
    filed_date        TEXT,
    frame             TEXT,
    CHECK ((value_numeric IS NULL) <> (value_text IS NULL))
);

CREATE INDEX IF NOT EXISTS former_names_cik_idx ON former_names(cik);
CREATE INDEX IF NOT EXISTS filings_cik_idx      ON filings(cik);
CREATE INDEX IF NOT EXISTS xbrl_facts_cik_idx   ON xbrl_facts(cik);
CREATE INDEX IF NOT EXISTS xbrl_facts_accn_idx  ON xbrl_facts(accession_number);
";

/// Whether a table named `name` exists.
pub fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Whether an error means a statement referenced a table that does not exist.
pub(crate) fn is_missing_table(e: &rusqlite::Error) -> bool {
  matches!(e, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table"))
}
