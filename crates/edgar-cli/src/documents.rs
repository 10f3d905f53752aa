//! Discovery of per-entity documents in extracted bulk directories.

use std::{
  io,
  path::{Path, PathBuf},
};

use edgar_core::Cik;

/// A submission document and, when present, the company-facts document for
/// the same entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
  pub cik:        Cik,
  pub submission: PathBuf,
  pub facts:      Option<PathBuf>,
}

/// The CIK named by a per-entity document file name such as
/// `CIK0000320193.json`. Supplementary pages like
/// `CIK0000320193-submissions-001.json` do not match.
pub fn document_cik(path: &Path) -> Option<Cik> {
  let name = path.file_name()?.to_str()?;
  let stem = name.strip_suffix(".json")?;
  let digits = stem.strip_prefix("CIK")?;
  if digits.len() != edgar_core::cik::CIK_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  stem.parse().ok()
}

/// Pair every submission document in `submissions_dir` with its facts
/// document in `facts_dir`, sorted by CIK.
pub fn pair_documents(submissions_dir: &Path, facts_dir: &Path) -> io::Result<Vec<DocumentPair>> {
  let mut pairs = Vec::new();
  for entry in std::fs::read_dir(submissions_dir)? {
    let path = entry?.path();
    let Some(cik) = document_cik(&path) else {
      continue;
    };
    let facts = path
      .file_name()
      .map(|name| facts_dir.join(name))
      .filter(|p| p.is_file());
    pairs.push(DocumentPair {
      cik,
      submission: path,
      facts,
    });
  }
  pairs.sort_by(|a, b| a.cik.cmp(&b.cik));
  Ok(pairs)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn only_per_entity_documents_match() {
    assert!(document_cik(Path::new("CIK0000320193.json")).is_some());
    assert!(document_cik(Path::new("CIK0000320193-submissions-001.json")).is_none());
    assert!(document_cik(Path::new("CIK320193.json")).is_none());
    assert!(document_cik(Path::new("CIK0000320193.txt")).is_none());
    assert!(document_cik(Path::new("company_tickers.json")).is_none());
  }

  #[test]
  fn documents_are_paired_by_file_name() {
    let dir = TempDir::new().unwrap();
    let subs = dir.path().join("submissions");
    let facts = dir.path().join("companyfacts");
    fs::create_dir_all(&subs).unwrap();
    fs::create_dir_all(&facts).unwrap();
    for name in ["CIK0000000002.json", "CIK0000000001.json", "CIK0000000001-submissions-001.json"] {
      fs::write(subs.join(name), "{}").unwrap();
    }
    fs::write(facts.join("CIK0000000001.json"), "{}").unwrap();

    let pairs = pair_documents(&subs, &facts).unwrap();

    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].cik.as_str(), "0000000001");
    assert_eq!(pairs[0].facts, Some(facts.join("CIK0000000001.json")));
    assert_eq!(pairs[1].cik.as_str(), "0000000002");
    assert_eq!(pairs[1].facts, None);
  }
}
