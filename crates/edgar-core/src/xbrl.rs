//! Record types produced from a company-facts document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Cik;

// ─── Values ──────────────────────────────────────────────────────────────────

/// The payload of one reported fact.
///
/// Exactly one of the two storage columns is populated: finite numbers go to
/// `value_numeric`, everything else (including the literal tokens `NaN`,
/// `Infinity` and `-Infinity`) is kept verbatim in `value_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactValue {
  #[serde(rename = "value_numeric")]
  Numeric(f64),
  #[serde(rename = "value_text")]
  Text(String),
}

impl FactValue {
  pub fn numeric(&self) -> Option<f64> {
    match self {
      FactValue::Numeric(n) => Some(*n),
      FactValue::Text(_) => None,
    }
  }

  pub fn text(&self) -> Option<&str> {
    match self {
      FactValue::Numeric(_) => None,
      FactValue::Text(t) => Some(t),
    }
  }
}

// ─── Tags and facts ──────────────────────────────────────────────────────────

/// A taxonomy tag definition, unique per `(taxonomy, tag_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlTag {
  pub taxonomy:    String,
  pub tag_name:    String,
  pub label:       Option<String>,
  pub description: Option<String>,
}

/// One reported datapoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XbrlFact {
  pub cik:               Cik,
  pub accession_number:  String,
  pub taxonomy:          String,
  pub tag_name:          String,
  pub unit:              String,
  pub period_start_date: Option<NaiveDate>,
  pub period_end_date:   Option<NaiveDate>,
  #[serde(flatten)]
  pub value:             FactValue,
  pub fy:                Option<i32>,
  pub fp:                Option<String>,
  pub form:              String,
  pub filed_date:        Option<NaiveDate>,
  pub frame:             Option<String>,
}

impl XbrlFact {
  pub fn value_numeric(&self) -> Option<f64> { self.value.numeric() }

  pub fn value_text(&self) -> Option<&str> { self.value.text() }
}

// ─── Record set ──────────────────────────────────────────────────────────────

/// Everything the normalizer extracts from one company-facts document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFactsRecords {
  pub cik:                 Cik,
  pub company_entity_name: Option<String>,
  pub xbrl_tags:           Vec<XbrlTag>,
  pub xbrl_facts:          Vec<XbrlFact>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fact(value: FactValue) -> XbrlFact {
    XbrlFact {
      cik: Cik::from_number(320193).unwrap(),
      accession_number: "0000320193-20-000096".into(),
      taxonomy: "us-gaap".into(),
      tag_name: "Revenues".into(),
      unit: "USD".into(),
      period_start_date: None,
      period_end_date: None,
      value,
      fy: Some(2020),
      fp: Some("FY".into()),
      form: "10-K".into(),
      filed_date: None,
      frame: None,
    }
  }

  #[test]
  fn numeric_value_serializes_to_numeric_column() {
    let json = serde_json::to_value(fact(FactValue::Numeric(12.5))).unwrap();
    assert_eq!(json["value_numeric"], 12.5);
    assert!(json.get("value_text").is_none());
  }

  #[test]
  fn text_value_serializes_to_text_column() {
    let f = fact(FactValue::Text("NaN".into()));
    assert_eq!(f.value_numeric(), None);
    assert_eq!(f.value_text(), Some("NaN"));

    let json = serde_json::to_value(&f).unwrap();
    assert_eq!(json["value_text"], "NaN");
    assert!(json.get("value_numeric").is_none());
  }
}
