//! The `company_tickers.json` index: an object of objects, each carrying a
//! `cik_str`.

use edgar_core::Cik;
use serde_json::Value;

/// Collect every CIK in the index, canonicalized, sorted and de-duplicated.
pub(crate) fn formatted_ciks(index: &Value) -> Vec<Cik> {
  let Some(entries) = index.as_object() else {
    tracing::warn!("ticker index is not an object");
    return Vec::new();
  };

  let mut total = 0usize;
  let mut ciks: Vec<Cik> = entries
    .iter()
    .filter_map(|(key, entry)| {
      let raw = entry.get("cik_str")?;
      total += 1;
      let cik = Cik::from_json(raw);
      if cik.is_none() {
        tracing::warn!(%key, ?raw, "unusable cik_str in ticker index");
      }
      cik
    })
    .collect();

  ciks.sort();
  ciks.dedup();
  tracing::info!(total, unique = ciks.len(), "extracted CIKs from ticker index");
  ciks
}
