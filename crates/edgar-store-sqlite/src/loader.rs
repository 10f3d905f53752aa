//! Persistence for normalized record sets.
//!
//! Each load runs in a single transaction, so a document is either fully
//! stored or not at all. Rows are keyed on their natural identifiers and
//! replaced on reload.

use edgar_core::{
  submission::{Address, SubmissionRecords},
  xbrl::CompanyFactsRecords,
};
use rusqlite::Connection;

use crate::{
  Result,
  encode::{encode_date, encode_dt},
  schema::EDGAR_SCHEMA,
};

/// Create the record tables if they do not exist.
pub fn ensure_edgar_schema(conn: &Connection) -> Result<()> {
  conn
    .execute_batch(EDGAR_SCHEMA)
    .inspect_err(|e| tracing::error!("failed to create record tables: {e}"))?;
  Ok(())
}

/// Rows written by one load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
  pub companies:    usize,
  pub tickers:      usize,
  pub former_names: usize,
  pub filings:      usize,
  pub xbrl_tags:    usize,
  pub xbrl_facts:   usize,
}

/// Store a normalized submission document.
///
/// The company, its tickers and its filings are inserted or replaced; the
/// company's former names are replaced as a set.
#[tracing::instrument(skip_all, fields(cik = %records.company.cik))]
pub fn load_submission(conn: &Connection, records: &SubmissionRecords) -> Result<LoadStats> {
  ensure_edgar_schema(conn)?;
  let stats = write_submission(conn, records)
    .inspect_err(|e| tracing::error!("failed to load submission: {e}"))?;
  tracing::info!(?stats, "loaded submission");
  Ok(stats)
}

fn write_submission(conn: &Connection, records: &SubmissionRecords) -> rusqlite::Result<LoadStats> {
  let tx = conn.unchecked_transaction()?;
  let c = &records.company;
  let cik = c.cik.as_str();
  let [m1, m2, m3, m4, m5] = address_params(&c.mailing_address);
  let [b1, b2, b3, b4, b5] = address_params(&c.business_address);

  // Upsert rather than REPLACE so `entity_name_cf` from an earlier facts
  // load survives.
  tx.execute(
    "INSERT INTO companies (
       cik, primary_name, entity_type, sic, sic_description, ein, description,
       category, fiscal_year_end, state_of_incorporation, phone, flags,
       mailing_street1, mailing_street2, mailing_city, mailing_state_or_country, mailing_zip_code,
       business_street1, business_street2, business_city, business_state_or_country, business_zip_code,
       last_parsed_timestamp
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
               ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)
     ON CONFLICT (cik) DO UPDATE SET
       primary_name              = excluded.primary_name,
       entity_type               = excluded.entity_type,
       sic                       = excluded.sic,
       sic_description           = excluded.sic_description,
       ein                       = excluded.ein,
       description               = excluded.description,
       category                  = excluded.category,
       fiscal_year_end           = excluded.fiscal_year_end,
       state_of_incorporation    = excluded.state_of_incorporation,
       phone                     = excluded.phone,
       flags                     = excluded.flags,
       mailing_street1           = excluded.mailing_street1,
       mailing_street2           = excluded.mailing_street2,
       mailing_city              = excluded.mailing_city,
       mailing_state_or_country  = excluded.mailing_state_or_country,
       mailing_zip_code          = excluded.mailing_zip_code,
       business_street1          = excluded.business_street1,
       business_street2          = excluded.business_street2,
       business_city             = excluded.business_city,
       business_state_or_country = excluded.business_state_or_country,
       business_zip_code         = excluded.business_zip_code,
       last_parsed_timestamp     = excluded.last_parsed_timestamp",
    rusqlite::params![
      cik,
      c.primary_name,
      c.entity_type,
      c.sic,
      c.sic_description,
      c.ein,
      c.description,
      c.category,
      c.fiscal_year_end,
      c.state_of_incorporation,
      c.phone,
      c.flags,
      m1,
      m2,
      m3,
      m4,
      m5,
      b1,
      b2,
      b3,
      b4,
      b5,
      encode_dt(c.last_parsed_timestamp),
    ],
  )?;

  {
    let mut stmt = tx.prepare(
      "INSERT OR REPLACE INTO tickers (cik, ticker, exchange, source) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for t in &records.tickers {
      stmt.execute(rusqlite::params![t.cik.as_str(), t.ticker, t.exchange, t.source])?;
    }
  }

  tx.execute("DELETE FROM former_names WHERE cik = ?1", [cik])?;
  {
    let mut stmt = tx.prepare(
      "INSERT INTO former_names (cik, former_name, date_from, date_to) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for f in &records.former_names {
      stmt.execute(rusqlite::params![
        f.cik.as_str(),
        f.former_name,
        f.date_from.map(encode_dt),
        f.date_to.map(encode_dt),
      ])?;
    }
  }

  {
    let mut stmt = tx.prepare(
      "INSERT OR REPLACE INTO filings (
         accession_number, cik, form, filing_date, report_date, acceptance_datetime,
         act, file_number, film_number, items, size, is_xbrl, is_inline_xbrl,
         primary_document, primary_doc_description
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )?;
    for f in &records.filings {
      stmt.execute(rusqlite::params![
        f.accession_number,
        f.cik.as_str(),
        f.form,
        encode_date(f.filing_date),
        f.report_date.map(encode_date),
        f.acceptance_datetime.map(encode_dt),
        f.act,
        f.file_number,
        f.film_number,
        f.items,
        f.size,
        f.is_xbrl,
        f.is_inline_xbrl,
        f.primary_document,
        f.primary_doc_description,
      ])?;
    }
  }

  tx.commit()?;
  Ok(LoadStats {
    companies: 1,
    tickers: records.tickers.len(),
    former_names: records.former_names.len(),
    filings: records.filings.len(),
    ..LoadStats::default()
  })
}

fn address_params(a: &Address) -> [&Option<String>; 5] {
  [&a.street1, &a.street2, &a.city, &a.state_or_country, &a.zip_code]
}

/// Store a normalized company-facts document.
///
/// Tags are inserted or replaced. The company's facts are replaced as a set,
/// so reloading a document does not duplicate them. When the company row
/// exists, its `entity_name_cf` is set from the document's entity name.
#[tracing::instrument(skip_all, fields(cik = %records.cik))]
pub fn load_company_facts(conn: &Connection, records: &CompanyFactsRecords) -> Result<LoadStats> {
  ensure_edgar_schema(conn)?;
  let stats = write_company_facts(conn, records)
    .inspect_err(|e| tracing::error!("failed to load company facts: {e}"))?;
  tracing::info!(?stats, "loaded company facts");
  Ok(stats)
}

fn write_company_facts(
  conn: &Connection,
  records: &CompanyFactsRecords,
) -> rusqlite::Result<LoadStats> {
  let tx = conn.unchecked_transaction()?;
  let cik = records.cik.as_str();

  if let Some(name) = &records.company_entity_name {
    tx.execute("UPDATE companies SET entity_name_cf = ?1 WHERE cik = ?2", [name.as_str(), cik])?;
  }

  {
    let mut stmt = tx.prepare(
      "INSERT OR REPLACE INTO xbrl_tags (taxonomy, tag_name, label, description)
       VALUES (?1, ?2, ?3, ?4)",
    )?;
    for t in &records.xbrl_tags {
      stmt.execute(rusqlite::params![t.taxonomy, t.tag_name, t.label, t.description])?;
    }
  }

  tx.execute("DELETE FROM xbrl_facts WHERE cik = ?1", [cik])?;
  {
    let mut stmt = tx.prepare(
      "INSERT INTO xbrl_facts (
         cik, accession_number, taxonomy, tag_name, unit,
         period_start_date, period_end_date, value_numeric, value_text,
         fy, fp, form, filed_date, frame
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )?;
    for f in &records.xbrl_facts {
      stmt.execute(rusqlite::params![
        f.cik.as_str(),
        f.accession_number,
        f.taxonomy,
        f.tag_name,
        f.unit,
        f.period_start_date.map(encode_date),
        f.period_end_date.map(encode_date),
        f.value_numeric(),
        f.value_text(),
        f.fy,
        f.fp,
        f.form,
        f.filed_date.map(encode_date),
        f.frame,
      ])?;
    }
  }

  tx.commit()?;
  Ok(LoadStats {
    xbrl_tags: records.xbrl_tags.len(),
    xbrl_facts: records.xbrl_facts.len(),
    ..LoadStats::default()
  })
}
