//! JSON-to-record normalizer for EDGAR bulk data.
//!
//! Converts per-entity submission documents and XBRL company-facts documents
//! into the record sets of [`edgar_core`]. Pure synchronous; reads one file
//! per call and persists nothing.
//!
//! Data-quality problems inside a document never abort it: malformed filings
//! and facts are dropped, and non-finite numbers are kept as text. Only a
//! document that cannot be read or decoded at all yields `None`.
//!
//! # Quick start
//!
//! ```no_run
//! use edgar_json::{parse_company_facts, parse_submission};
//!
//! let submission = parse_submission("CIK0000320193.json").expect("readable");
//! let relevant = submission.accession_numbers();
//! let facts = parse_company_facts("facts/CIK0000320193.json", Some(&relevant));
//! println!("{} filings, {:?}", submission.filings.len(), facts.map(|f| f.xbrl_facts.len()));
//! ```

pub mod error;
mod facts;
mod index;
mod lenient;
mod scalar;
mod submission;

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use edgar_core::{Cik, submission::SubmissionRecords, xbrl::CompanyFactsRecords};
pub use error::{Error, Result};
pub use scalar::coerce_fact_value;
use serde_json::Value;

// ─── Submissions ─────────────────────────────────────────────────────────────

/// Normalize one submission document.
///
/// Returns `None` when the file is missing, empty, not valid JSON, or not
/// shaped like a submission document; the reason is logged.
pub fn parse_submission(path: impl AsRef<Path>) -> Option<SubmissionRecords> {
  let path = path.as_ref();
  try_parse_submission(path)
    .inspect_err(|e| tracing::error!(file = %path.display(), "failed to parse submission: {e}"))
    .ok()
}

/// Like [`parse_submission`], but reports why the document was rejected.
#[tracing::instrument(skip_all, fields(file = %path.as_ref().display()))]
pub fn try_parse_submission(path: impl AsRef<Path>) -> Result<SubmissionRecords> {
  let input = read_document(path.as_ref())?;
  let records = parse_submission_str(&input)?;
  tracing::info!(
    cik = %records.company.cik,
    tickers = records.tickers.len(),
    former_names = records.former_names.len(),
    filings = records.filings.len(),
    "structured submission"
  );
  Ok(records)
}

/// Normalize a submission document held in memory.
pub fn parse_submission_str(input: &str) -> Result<SubmissionRecords> {
  let doc = decode(input)?;
  submission::normalize(&doc, Utc::now())
}

// ─── Company facts ───────────────────────────────────────────────────────────

/// Normalize one company-facts document.
///
/// When `relevant` is a non-empty set, only facts whose accession number is
/// a member are emitted. Returns `None` under the same conditions as
/// [`parse_submission`].
pub fn parse_company_facts(
  path: impl AsRef<Path>,
  relevant: Option<&HashSet<String>>,
) -> Option<CompanyFactsRecords> {
  let path = path.as_ref();
  try_parse_company_facts(path, relevant)
    .inspect_err(|e| tracing::error!(file = %path.display(), "failed to parse company facts: {e}"))
    .ok()
}

/// Like [`parse_company_facts`], but reports why the document was rejected.
#[tracing::instrument(skip_all, fields(file = %path.as_ref().display()))]
pub fn try_parse_company_facts(
  path: impl AsRef<Path>,
  relevant: Option<&HashSet<String>>,
) -> Result<CompanyFactsRecords> {
  let input = read_document(path.as_ref())?;
  parse_company_facts_str(&input, relevant)
}

/// Normalize a company-facts document held in memory.
pub fn parse_company_facts_str(
  input: &str,
  relevant: Option<&HashSet<String>>,
) -> Result<CompanyFactsRecords> {
  let doc = decode(input)?;
  facts::normalize(&doc, relevant)
}

// ─── Ticker index ────────────────────────────────────────────────────────────

/// Load the `company_tickers.json` index.
pub fn load_ticker_index(path: impl AsRef<Path>) -> Result<Value> {
  let input = read_document(path.as_ref())?;
  decode(&input)
}

/// Canonical CIKs listed in a ticker index, sorted and de-duplicated.
pub fn extract_formatted_ciks(index: &Value) -> Vec<Cik> { index::formatted_ciks(index) }

// ─── Shared helpers ──────────────────────────────────────────────────────────

fn read_document(path: &Path) -> Result<String> {
  let bytes = std::fs::read(path)?;
  if bytes.iter().all(u8::is_ascii_whitespace) {
    return Err(Error::EmptyDocument);
  }
  Ok(String::from_utf8(bytes).unwrap_or_else(|e| {
    tracing::warn!(file = %path.display(), "document is not valid UTF-8; decoding lossily");
    String::from_utf8_lossy(e.as_bytes()).into_owned()
  }))
}

fn decode(input: &str) -> Result<Value> {
  if input.trim().is_empty() {
    return Err(Error::EmptyDocument);
  }
  Ok(serde_json::from_str(&lenient::quote_non_finite(input))?)
}

// ─── Document-level tests ────────────────────────────────────────────────────
