//! Company-facts document normalizer.
//!
//! The document nests observations as
//! `facts → taxonomy → tag → units → unit → [observation]`. Tags are emitted
//! once per `(taxonomy, tag_name)`; observations become facts, optionally
//! restricted to a set of relevant accession numbers.

use std::collections::HashSet;

use edgar_core::{
  Cik,
  xbrl::{CompanyFactsRecords, XbrlFact, XbrlTag},
};
use serde_json::{Map, Value};

use crate::{
  error::{Error, Result},
  scalar::{coerce_fact_value, date, fiscal_year, text},
};

/// Counters reported once per document.
#[derive(Debug, Default)]
struct Tally {
  no_value:     usize,
  no_accession: usize,
  no_form:      usize,
  irrelevant:   usize,
}

pub(crate) fn normalize(
  doc: &Value,
  relevant: Option<&HashSet<String>>,
) -> Result<CompanyFactsRecords> {
  let obj = doc
    .as_object()
    .ok_or(Error::InvalidStructure("top-level value is not an object"))?;
  let cik = Cik::from_json(obj.get("cik").unwrap_or(&Value::Null))
    .ok_or(Error::InvalidStructure("missing or invalid cik"))?;
  let facts = obj
    .get("facts")
    .ok_or(Error::InvalidStructure("missing facts object"))?;

  // An empty filter means "no filter".
  let relevant = relevant.filter(|set| !set.is_empty());

  let mut records = CompanyFactsRecords {
    cik:                 cik.clone(),
    company_entity_name: text(obj.get("entityName")),
    xbrl_tags:           Vec::new(),
    xbrl_facts:          Vec::new(),
  };

  let Some(taxonomies) = facts.as_object() else {
    tracing::warn!(%cik, "facts payload is not an object");
    return Ok(records);
  };

  let mut seen_tags: HashSet<(String, String)> = HashSet::new();
  let mut tally = Tally::default();

  for (taxonomy, tags) in taxonomies {
    let Some(tags) = tags.as_object() else {
      continue;
    };
    for (tag_name, details) in tags {
      let Some(details) = details.as_object() else {
        continue;
      };

      if seen_tags.insert((taxonomy.clone(), tag_name.clone())) {
        records.xbrl_tags.push(XbrlTag {
          taxonomy:    taxonomy.clone(),
          tag_name:    tag_name.clone(),
          label:       text(details.get("label")),
          description: text(details.get("description")),
        });
      }

      let Some(units) = details.get("units").and_then(Value::as_object) else {
        continue;
      };
      for (unit, observations) in units {
        let Some(observations) = observations.as_array() else {
          continue;
        };
        let scope = Scope {
          cik: &cik,
          taxonomy,
          tag_name,
          unit,
        };
        records.xbrl_facts.extend(
          observations
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|o| scope.fact(o, relevant, &mut tally)),
        );
      }
    }
  }

  tracing::info!(
    %cik,
    tags = records.xbrl_tags.len(),
    facts = records.xbrl_facts.len(),
    ?tally,
    "structured company facts"
  );
  Ok(records)
}

/// The position of an observation within the document.
struct Scope<'a> {
  cik:      &'a Cik,
  taxonomy: &'a str,
  tag_name: &'a str,
  unit:     &'a str,
}

impl Scope<'_> {
  fn fact(
    &self,
    o: &Map<String, Value>,
    relevant: Option<&HashSet<String>>,
    tally: &mut Tally,
  ) -> Option<XbrlFact> {
    let Some(accession_number) = text(o.get("accn")) else {
      tally.no_accession += 1;
      return None;
    };
    if let Some(set) = relevant
      && !set.contains(&accession_number)
    {
      tally.irrelevant += 1;
      return None;
    }
    let Some(form) = text(o.get("form")) else {
      tally.no_form += 1;
      return None;
    };
    let Some(value) = coerce_fact_value(o.get("val")) else {
      tracing::debug!(
        cik = %self.cik,
        taxonomy = self.taxonomy,
        tag = self.tag_name,
        accn = %accession_number,
        "skipping fact without a value"
      );
      tally.no_value += 1;
      return None;
    };

    Some(XbrlFact {
      cik: self.cik.clone(),
      accession_number,
      taxonomy: self.taxonomy.to_string(),
      tag_name: self.tag_name.to_string(),
      unit: self.unit.to_string(),
      period_start_date: date(o.get("start")),
      period_end_date: date(o.get("end")),
      value,
      fy: fiscal_year(o.get("fy")),
      fp: text(o.get("fp")),
      form,
      filed_date: date(o.get("filed")),
      frame: text(o.get("frame")),
    })
  }
}
