//! Record types produced from a per-entity submission document.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Cik;

// ─── Company ─────────────────────────────────────────────────────────────────

/// A postal address as it appears under `addresses.mailing` or
/// `addresses.business`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub street1:          Option<String>,
  pub street2:          Option<String>,
  pub city:             Option<String>,
  pub state_or_country: Option<String>,
  pub zip_code:         Option<String>,
}

/// One filer entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
  pub cik:                    Cik,
  pub primary_name:           Option<String>,
  pub entity_type:            Option<String>,
  pub sic:                    Option<String>,
  pub sic_description:        Option<String>,
  pub ein:                    Option<String>,
  pub description:            Option<String>,
  pub category:               Option<String>,
  pub fiscal_year_end:        Option<String>,
  pub state_of_incorporation: Option<String>,
  pub phone:                  Option<String>,
  pub flags:                  Option<String>,
  pub mailing_address:        Address,
  pub business_address:       Address,
  /// When this record was produced by the normalizer.
  pub last_parsed_timestamp:  DateTime<Utc>,
}

// ─── Tickers and former names ────────────────────────────────────────────────

/// Value of [`Ticker::source`] for symbols read from a submission document.
pub const SUBMISSIONS_TICKER_SOURCE: &str = "submissions.json";

/// A trading symbol associated with a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
  pub cik:      Cik,
  pub ticker:   String,
  pub exchange: String,
  pub source:   String,
}

/// A historical name for a company.
///
/// When both bounds are present `date_from <= date_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormerName {
  pub cik:         Cik,
  pub former_name: String,
  pub date_from:   Option<DateTime<Utc>>,
  pub date_to:     Option<DateTime<Utc>>,
}

// ─── Filings ─────────────────────────────────────────────────────────────────

/// One regulatory filing. `accession_number` is globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
  pub accession_number:        String,
  pub cik:                     Cik,
  pub form:                    String,
  pub filing_date:             NaiveDate,
  pub report_date:             Option<NaiveDate>,
  pub acceptance_datetime:     Option<DateTime<Utc>>,
  pub act:                     Option<String>,
  pub file_number:             Option<String>,
  pub film_number:             Option<String>,
  pub items:                   Option<String>,
  pub size:                    Option<i64>,
  pub is_xbrl:                 Option<bool>,
  pub is_inline_xbrl:          Option<bool>,
  pub primary_document:        Option<String>,
  pub primary_doc_description: Option<String>,
}

// ─── Record set ──────────────────────────────────────────────────────────────

/// Everything the normalizer extracts from one submission document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecords {
  #[serde(rename = "companies")]
  pub company:      Company,
  pub tickers:      Vec<Ticker>,
  pub former_names: Vec<FormerName>,
  pub filings:      Vec<Filing>,
}

impl SubmissionRecords {
  /// Accession numbers of every retained filing, for use as the relevance
  /// filter when normalizing the matching company-facts document.
  pub fn accession_numbers(&self) -> std::collections::HashSet<String> {
    self
      .filings
      .iter()
      .map(|f| f.accession_number.clone())
      .collect()
  }
}
