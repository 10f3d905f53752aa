//! Submission document normalizer.
//!
//! Pipeline:
//!   serde_json::Value
//!     ├─ company fields + addresses      → Company
//!     ├─ tickers × exchanges (pairwise)  → Vec<Ticker>
//!     ├─ formerNames                     → Vec<FormerName>
//!     └─ filings.recent (columnar)
//!          └─ validate_row(i)            → FilingRow::{Valid, Skipped}
//!               └─ keep Valid            → Vec<Filing>

use chrono::{DateTime, Utc};
use edgar_core::{
  Cik,
  submission::{
    Address, Company, Filing, FormerName, SUBMISSIONS_TICKER_SOURCE,
    SubmissionRecords, Ticker,
  },
};
use serde_json::{Map, Value};

use crate::{
  error::{Error, Result},
  scalar::{date, datetime, flag, non_negative_int, strict_text, text},
};

// ─── Entry point ─────────────────────────────────────────────────────────────

pub(crate) fn normalize(doc: &Value, now: DateTime<Utc>) -> Result<SubmissionRecords> {
  let obj = doc
    .as_object()
    .ok_or(Error::InvalidStructure("top-level value is not an object"))?;
  let cik = Cik::from_json(obj.get("cik").unwrap_or(&Value::Null))
    .ok_or(Error::InvalidStructure("missing or invalid cik"))?;

  let company = company(obj, &cik, now);
  let tickers = tickers(obj, &cik);
  let former_names = former_names(obj, &cik);
  let filings = filings(obj, &cik);

  Ok(SubmissionRecords {
    company,
    tickers,
    former_names,
    filings,
  })
}

// ─── Company ─────────────────────────────────────────────────────────────────

fn company(obj: &Map<String, Value>, cik: &Cik, now: DateTime<Utc>) -> Company {
  let field = |key: &str| text(obj.get(key));
  let addresses = obj.get("addresses").and_then(Value::as_object);
  let address = |kind: &str| {
    addresses
      .and_then(|a| a.get(kind))
      .and_then(Value::as_object)
      .map(parse_address)
      .unwrap_or_default()
  };

  Company {
    cik:                    cik.clone(),
    primary_name:           field("name"),
    entity_type:            field("entityType"),
    sic:                    field("sic"),
    sic_description:        field("sicDescription"),
    ein:                    field("ein"),
    description:            field("description"),
    category:               field("category"),
    fiscal_year_end:        field("fiscalYearEnd"),
    state_of_incorporation: field("stateOfIncorporation"),
    phone:                  field("phone"),
    flags:                  field("flags"),
    mailing_address:        address("mailing"),
    business_address:       address("business"),
    last_parsed_timestamp:  now,
  }
}

fn parse_address(a: &Map<String, Value>) -> Address {
  Address {
    street1:          text(a.get("street1")),
    street2:          text(a.get("street2")),
    city:             text(a.get("city")),
    state_or_country: text(a.get("stateOrCountry")),
    zip_code:         text(a.get("zipCode")),
  }
}

// ─── Tickers and former names ────────────────────────────────────────────────

fn tickers(obj: &Map<String, Value>, cik: &Cik) -> Vec<Ticker> {
  let (Some(symbols), Some(exchanges)) = (
    obj.get("tickers").and_then(Value::as_array),
    obj.get("exchanges").and_then(Value::as_array),
  ) else {
    return Vec::new();
  };

  symbols
    .iter()
    .zip(exchanges)
    .filter_map(|(symbol, exchange)| {
      match (strict_text(Some(symbol)), strict_text(Some(exchange))) {
        (Some(ticker), Some(exchange)) => Some(Ticker {
          cik: cik.clone(),
          ticker,
          exchange,
          source: SUBMISSIONS_TICKER_SOURCE.to_string(),
        }),
        _ => {
          tracing::debug!(%cik, ?symbol, ?exchange, "skipping incomplete ticker entry");
          None
        }
      }
    })
    .collect()
}

fn former_names(obj: &Map<String, Value>, cik: &Cik) -> Vec<FormerName> {
  let Some(entries) = obj.get("formerNames").and_then(Value::as_array) else {
    return Vec::new();
  };

  entries
    .iter()
    .filter_map(Value::as_object)
    .filter_map(|entry| {
      let former_name = text(entry.get("name"))?;
      let date_from = datetime(entry.get("from"));
      let date_to = datetime(entry.get("to"));
      if let (Some(from), Some(to)) = (date_from, date_to)
        && from > to
      {
        tracing::debug!(%cik, %former_name, "skipping former name with inverted date range");
        return None;
      }
      Some(FormerName {
        cik: cik.clone(),
        former_name,
        date_from,
        date_to,
      })
    })
    .collect()
}

// ─── Filings ─────────────────────────────────────────────────────────────────

/// Why a filing index was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
  Missing(&'static str),
  Malformed(&'static str),
}

/// Outcome of validating one index of the columnar filings table.
#[derive(Debug)]
pub(crate) enum FilingRow {
  Valid(Box<Filing>),
  Skipped(SkipReason),
}

/// The `filings.recent` table: one array per field, index `i` across all
/// arrays describing filing `i`.
struct Columns<'a> {
  table: &'a Map<String, Value>,
  len:   usize,
}

impl<'a> Columns<'a> {
  fn new(table: &'a Map<String, Value>) -> Self {
    let len = table
      .values()
      .filter_map(Value::as_array)
      .map(Vec::len)
      .max()
      .unwrap_or(0);
    Self { table, len }
  }

  /// The cell for `field` at `index`. Short columns, non-array columns and
  /// explicit `null`s all read as absent.
  fn cell(&self, field: &str, index: usize) -> Option<&'a Value> {
    self
      .table
      .get(field)?
      .as_array()?
      .get(index)
      .filter(|v| !v.is_null())
  }

  fn required_text(
    &self,
    field: &'static str,
    index: usize,
  ) -> std::result::Result<String, SkipReason> {
    let cell = self.cell(field, index).ok_or(SkipReason::Missing(field))?;
    strict_text(Some(cell)).ok_or(SkipReason::Malformed(field))
  }

  fn validate_row(&self, cik: &Cik, i: usize) -> FilingRow {
    match self.build_filing(cik, i) {
      Ok(filing) => FilingRow::Valid(Box::new(filing)),
      Err(reason) => FilingRow::Skipped(reason),
    }
  }

  fn build_filing(&self, cik: &Cik, i: usize) -> std::result::Result<Filing, SkipReason> {
    let accession_number = self.required_text("accessionNumber", i)?;
    let form = self.required_text("form", i)?;
    let filing_date = date(Some(
      self
        .cell("filingDate", i)
        .ok_or(SkipReason::Missing("filingDate"))?,
    ))
    .ok_or(SkipReason::Malformed("filingDate"))?;

    let opt = |field: &str| text(self.cell(field, i));

    Ok(Filing {
      accession_number,
      cik: cik.clone(),
      form,
      filing_date,
      report_date: date(self.cell("reportDate", i)),
      acceptance_datetime: datetime(self.cell("acceptanceDateTime", i)),
      act: opt("act"),
      file_number: opt("fileNumber"),
      film_number: opt("filmNumber"),
      items: opt("items"),
      size: non_negative_int(self.cell("size", i)),
      is_xbrl: flag(self.cell("isXBRL", i)),
      is_inline_xbrl: flag(self.cell("isInlineXBRL", i)),
      primary_document: opt("primaryDocument"),
      primary_doc_description: opt("primaryDocDescription"),
    })
  }
}

fn filings(obj: &Map<String, Value>, cik: &Cik) -> Vec<Filing> {
  let Some(recent) = obj
    .get("filings")
    .and_then(|f| f.get("recent"))
    .and_then(Value::as_object)
  else {
    tracing::warn!(%cik, "no filings.recent table in submission");
    return Vec::new();
  };

  let columns = Columns::new(recent);
  let mut skipped = 0usize;
  let filings: Vec<Filing> = (0..columns.len)
    .map(|i| (i, columns.validate_row(cik, i)))
    .filter_map(|(i, row)| match row {
      FilingRow::Valid(filing) => Some(*filing),
      FilingRow::Skipped(reason) => {
        tracing::debug!(%cik, index = i, ?reason, "skipping filing");
        skipped += 1;
        None
      }
    })
    .collect();

  if skipped > 0 {
    tracing::warn!(%cik, skipped, kept = filings.len(), "dropped malformed filings");
  }
  filings
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};
  use serde_json::json;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() }

  fn doc_with_filings(recent: Value) -> Value {
    json!({
      "cik": "320193",
      "name": "Apple Inc.",
      "entityType": "operating",
      "filings": { "recent": recent }
    })
  }

  #[test]
  fn company_fields_and_addresses() {
    let doc = json!({
      "cik": 320193,
      "name": "Apple Inc.",
      "entityType": "operating",
      "sic": "3571",
      "ein": 942404110,
      "fiscalYearEnd": "0926",
      "stateOfIncorporation": "CA",
      "addresses": {
        "mailing":  { "street1": "One Apple Park Way", "city": "Cupertino", "zipCode": "95014" },
        "business": { "street1": "One Apple Park Way", "stateOrCountry": "CA" }
      }
    });

    let records = normalize(&doc, now()).unwrap();
    let c = &records.company;
    assert_eq!(c.cik.as_str(), "0000320193");
    assert_eq!(c.primary_name.as_deref(), Some("Apple Inc."));
    assert_eq!(c.ein.as_deref(), Some("942404110"));
    assert_eq!(c.fiscal_year_end.as_deref(), Some("0926"));
    assert_eq!(c.mailing_address.city.as_deref(), Some("Cupertino"));
    assert_eq!(c.business_address.state_or_country.as_deref(), Some("CA"));
    assert_eq!(c.last_parsed_timestamp, now());
    assert!(records.tickers.is_empty());
    assert!(records.former_names.is_empty());
    assert!(records.filings.is_empty());
  }

  #[test]
  fn missing_cik_is_invalid() {
    let r = normalize(&json!({ "name": "Nobody" }), now());
    assert!(matches!(r, Err(Error::InvalidStructure(_))));
  }

  #[test]
  fn tickers_pair_with_exchanges() {
    let doc = json!({
      "cik": 1,
      "tickers": ["AAA", "BBB", "", "DDD"],
      "exchanges": ["NYSE", null, "Nasdaq"]
    });
    let records = normalize(&doc, now()).unwrap();
    assert_eq!(records.tickers.len(), 1);
    assert_eq!(records.tickers[0].ticker, "AAA");
    assert_eq!(records.tickers[0].exchange, "NYSE");
    assert_eq!(records.tickers[0].source, "submissions.json");
  }

  #[test]
  fn former_names_keep_valid_ranges() {
    let doc = json!({
      "cik": 1,
      "formerNames": [
        { "name": "OLD CO", "from": "2001-01-01T00:00:00.000Z", "to": "2005-06-30T00:00:00.000Z" },
        { "name": "BACKWARDS", "from": "2010-01-01T00:00:00.000Z", "to": "2009-01-01T00:00:00.000Z" },
        { "from": "2001-01-01T00:00:00.000Z" },
        { "name": "OPEN ENDED", "from": "2006-01-01T00:00:00.000Z" },
        "not an object"
      ]
    });
    let records = normalize(&doc, now()).unwrap();
    let names: Vec<_> = records
      .former_names
      .iter()
      .map(|f| f.former_name.as_str())
      .collect();
    assert_eq!(names, ["OLD CO", "OPEN ENDED"]);
    assert!(records.former_names[1].date_to.is_none());
  }

  #[test]
  fn columnar_filings_become_rows() {
    let doc = doc_with_filings(json!({
      "accessionNumber":    ["0000320193-24-000001", "0000320193-24-000002"],
      "form":               ["10-K", "8-K"],
      "filingDate":         ["2024-01-05", "2024-02-06"],
      "reportDate":         ["2023-12-30", ""],
      "acceptanceDateTime": ["2024-01-05T16:30:12.000Z", null],
      "act":                ["34", "34"],
      "size":               [123456, "789"],
      "isXBRL":             [1, 0],
      "isInlineXBRL":       [true, false],
      "primaryDocument":    ["aapl-10k.htm", "aapl-8k.htm"]
    }));

    let records = normalize(&doc, now()).unwrap();
    assert_eq!(records.filings.len(), 2);

    let first = &records.filings[0];
    assert_eq!(first.accession_number, "0000320193-24-000001");
    assert_eq!(first.cik.as_str(), "0000320193");
    assert_eq!(first.filing_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(first.report_date, NaiveDate::from_ymd_opt(2023, 12, 30));
    assert!(first.acceptance_datetime.is_some());
    assert_eq!(first.size, Some(123456));
    assert_eq!(first.is_xbrl, Some(true));

    let second = &records.filings[1];
    assert_eq!(second.form, "8-K");
    assert_eq!(second.report_date, None);
    assert_eq!(second.acceptance_datetime, None);
    assert_eq!(second.size, Some(789));
    assert_eq!(second.is_inline_xbrl, Some(false));
    assert_eq!(second.items, None);
  }

  #[test]
  fn malformed_filings_are_dropped_wherever_they_are() {
    // Indices 0, 2 and 4 are valid; 1 lacks a form, 3 has a numeric
    // accession number, 5 has an unparseable date, 6 is past the end of
    // the shorter `form` column.
    let doc = doc_with_filings(json!({
      "accessionNumber": ["a-0", "a-1", "a-2", 3, "a-4", "a-5", "a-6"],
      "form":            ["10-Q", null, "10-K", "8-K", "4", "S-1"],
      "filingDate":      ["2020-01-01", "2020-01-02", "2020-01-03", "2020-01-04",
                          "2020-01-05", "next tuesday", "2020-01-07"]
    }));

    let records = normalize(&doc, now()).unwrap();
    let accns: Vec<_> = records
      .filings
      .iter()
      .map(|f| f.accession_number.as_str())
      .collect();
    assert_eq!(accns, ["a-0", "a-2", "a-4"]);
  }

  #[test]
  fn skip_reasons_name_the_field() {
    let table = json!({
      "accessionNumber": ["a-0", 7],
      "form":            ["10-K", "10-K"]
    });
    let columns = Columns::new(table.as_object().unwrap());
    let cik = Cik::from_number(1).unwrap();

    assert!(matches!(
      columns.validate_row(&cik, 0),
      FilingRow::Skipped(SkipReason::Missing("filingDate"))
    ));
    assert!(matches!(
      columns.validate_row(&cik, 1),
      FilingRow::Skipped(SkipReason::Malformed("accessionNumber"))
    ));
  }

  #[test]
  fn non_object_filings_table_yields_no_filings() {
    let doc = doc_with_filings(json!(["not", "columnar"]));
    let records = normalize(&doc, now()).unwrap();
    assert!(records.filings.is_empty());
  }
}
