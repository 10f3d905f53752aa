//! Bulk-archive extraction for EDGAR downloads.
//!
//! The bulk ZIPs hold one JSON document per entity, often hundreds of
//! thousands of them. [`extract_json_members`] writes every `.json` member
//! into a flat destination directory using a bounded pool of blocking
//! workers; [`extract_and_sample`] wraps it with a status verdict and a short
//! text preview of the first extracted file for the download inventory.

pub mod error;
mod record;
mod sample;

use std::{
  fs::File,
  io::{self, BufReader, BufWriter},
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

pub use error::{Error, Result};
pub use record::inventory_record;
pub use sample::{DEFAULT_SAMPLE_CHARS, EMPTY_FILE_SAMPLE, sample_json, try_sample_json};
use serde::Deserialize;
use tokio::task::JoinSet;
use zip::ZipArchive;

/// Pool size used when none is configured.
pub const DEFAULT_WORKERS: usize = 8;

/// Tuning for one extraction run.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractOptions {
  /// Upper bound on concurrently running extraction workers.
  pub workers:      usize,
  /// Preview length, in characters.
  pub sample_chars: usize,
}

impl Default for ExtractOptions {
  fn default() -> Self {
    Self {
      workers:      DEFAULT_WORKERS,
      sample_chars: DEFAULT_SAMPLE_CHARS,
    }
  }
}

/// Verdict recorded in the inventory after an extraction attempt.
#[derive(
  Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
pub enum ExtractionStatus {
  #[strum(serialize = "Extracted")]
  Extracted,
  #[strum(serialize = "Extracted (Sample Failed)")]
  SampleFailed,
  #[strum(serialize = "No JSON Found")]
  NoJsonFound,
  #[strum(serialize = "Extraction Failed (ZIP Missing)")]
  ArchiveMissing,
}

/// Result of [`extract_and_sample`].
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionOutcome {
  pub status: ExtractionStatus,
  pub sample: Option<String>,
  /// Every JSON file now present in the destination, sorted.
  pub files:  Vec<PathBuf>,
}

// ─── Extraction ──────────────────────────────────────────────────────────────

/// A JSON member scheduled for extraction.
#[derive(Debug)]
struct Member {
  index: usize,
  name:  String,
  /// Destination path: the member's base name under the output directory.
  target: PathBuf,
}

/// Extract every `.json` member of `archive` into `dest`, flattening any
/// directory structure inside the archive.
///
/// At most `workers` members are extracted at once. A member that fails to
/// extract is logged and left out of the result; the others are unaffected.
/// Members already present in `dest` with non-zero size are not rewritten
/// but are still reported, so re-running an extraction is cheap.
///
/// Fails only when the archive itself cannot be opened or read.
#[tracing::instrument(skip_all, fields(archive = %archive.as_ref().display()))]
pub async fn extract_json_members(
  archive: impl AsRef<Path>,
  dest: impl AsRef<Path>,
  workers: usize,
) -> Result<Vec<PathBuf>> {
  let archive = archive.as_ref().to_path_buf();
  let dest = dest.as_ref().to_path_buf();

  let members = {
    let (archive, dest) = (archive.clone(), dest.clone());
    tokio::task::spawn_blocking(move || list_json_members(&archive, &dest)).await??
  };
  tokio::fs::create_dir_all(&dest).await?;
  if members.is_empty() {
    tracing::warn!("archive contains no JSON members");
    return Ok(Vec::new());
  }

  let total = members.len();
  let members: Arc<[Member]> = members.into();
  let cursor = Arc::new(AtomicUsize::new(0));
  let pool = workers.clamp(1, total);
  tracing::info!(members = total, workers = pool, "extracting JSON members");

  let mut set = JoinSet::new();
  for _ in 0..pool {
    let archive = archive.clone();
    let members = Arc::clone(&members);
    let cursor = Arc::clone(&cursor);
    set.spawn_blocking(move || drain(&archive, &members, &cursor));
  }

  let mut extracted = Vec::with_capacity(total);
  while let Some(joined) = set.join_next().await {
    match joined {
      Ok(paths) => extracted.extend(paths),
      Err(e) => tracing::error!("extraction worker failed: {e}"),
    }
  }
  extracted.sort();

  let failed = total - extracted.len();
  if failed > 0 {
    tracing::warn!(extracted = extracted.len(), failed, "extraction finished with failures");
  } else {
    tracing::info!(extracted = extracted.len(), "extraction finished");
  }
  Ok(extracted)
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
  Ok(ZipArchive::new(BufReader::new(File::open(path)?))?)
}

fn is_json_member(name: &str) -> bool {
  !name.ends_with('/')
    && !name.starts_with("__MACOSX/")
    && name.to_ascii_lowercase().ends_with(".json")
}

/// Enumerate JSON members from the central directory without decompressing
/// anything. Members whose base name repeats an earlier one are skipped.
fn list_json_members(archive: &Path, dest: &Path) -> Result<Vec<Member>> {
  let zip = open_archive(archive)?;
  let mut seen = std::collections::HashSet::new();
  let mut members = Vec::new();

  for index in 0..zip.len() {
    let Some(name) = zip.name_for_index(index) else {
      continue;
    };
    if !is_json_member(name) {
      continue;
    }
    let Some(base) = Path::new(name).file_name() else {
      continue;
    };
    if !seen.insert(base.to_owned()) {
      tracing::warn!(member = name, "duplicate base name in archive; keeping the first");
      continue;
    }
    members.push(Member {
      index,
      name: name.to_string(),
      target: dest.join(base),
    });
  }
  Ok(members)
}

/// Worker loop: claim members off the shared cursor until none remain.
fn drain(archive: &Path, members: &[Member], cursor: &AtomicUsize) -> Vec<PathBuf> {
  let mut zip = match open_archive(archive) {
    Ok(zip) => zip,
    Err(e) => {
      tracing::error!("worker could not open archive: {e}");
      return Vec::new();
    }
  };

  let mut done = Vec::new();
  loop {
    let next = cursor.fetch_add(1, Ordering::Relaxed);
    let Some(member) = members.get(next) else {
      break;
    };
    match extract_member(&mut zip, member) {
      Ok(()) => done.push(member.target.clone()),
      Err(e) => tracing::error!(member = %member.name, "failed to extract member: {e}"),
    }
  }
  done
}

fn extract_member(zip: &mut ZipArchive<BufReader<File>>, member: &Member) -> Result<()> {
  if let Ok(meta) = std::fs::metadata(&member.target)
    && meta.is_file()
    && meta.len() > 0
  {
    tracing::debug!(path = %member.target.display(), "already extracted");
    return Ok(());
  }

  // Written under a temporary name so a failed member never leaves a
  // truncated file that a later run would mistake for a finished one.
  let partial = member.target.with_extension("json.part");
  let written = (|| -> Result<()> {
    let mut entry = zip.by_index(member.index)?;
    let mut out = BufWriter::new(File::create(&partial)?);
    io::copy(&mut entry, &mut out)?;
    out.into_inner().map_err(io::IntoInnerError::into_error)?;
    std::fs::rename(&partial, &member.target)?;
    Ok(())
  })();

  if written.is_err() {
    let _ = std::fs::remove_file(&partial);
  }
  written
}

// ─── Extraction + sampling ───────────────────────────────────────────────────

/// Extract an archive and preview the first JSON file it produced.
///
/// A missing archive and an archive without JSON members are reported
/// through [`ExtractionStatus`] rather than as errors. A sampling failure
/// still counts as a successful extraction.
pub async fn extract_and_sample(
  archive: impl AsRef<Path>,
  dest: impl AsRef<Path>,
  options: &ExtractOptions,
) -> Result<ExtractionOutcome> {
  let archive = archive.as_ref();
  if !tokio::fs::try_exists(archive).await.unwrap_or(false) {
    tracing::error!(archive = %archive.display(), "archive not found");
    return Ok(ExtractionOutcome {
      status: ExtractionStatus::ArchiveMissing,
      sample: None,
      files:  Vec::new(),
    });
  }

  let files = extract_json_members(archive, dest, options.workers).await?;
  let Some(first) = files.first().cloned() else {
    return Ok(ExtractionOutcome {
      status: ExtractionStatus::NoJsonFound,
      sample: None,
      files,
    });
  };

  let max_chars = options.sample_chars;
  let sample = tokio::task::spawn_blocking(move || sample_json(first, max_chars)).await?;
  let status = match sample {
    Some(_) => ExtractionStatus::Extracted,
    None => ExtractionStatus::SampleFailed,
  };
  Ok(ExtractionOutcome {
    status,
    sample,
    files,
  })
}

#[cfg(test)]
mod tests {
  use std::{fs, io::Write, str::FromStr};

  use tempfile::TempDir;
  use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

  use super::*;

  fn build_zip(dir: &TempDir, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    build_zip_with(dir, name, entries, CompressionMethod::Deflated)
  }

  fn build_zip_with(
    dir: &TempDir,
    name: &str,
    entries: &[(&str, &str)],
    method: CompressionMethod,
  ) -> PathBuf {
    let path = dir.path().join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default().compression_method(method);
    for (entry, body) in entries {
      if entry.ends_with('/') {
        zip.add_directory(*entry, options).unwrap();
      } else {
        zip.start_file(*entry, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
      }
    }
    zip.finish().unwrap();
    path
  }

  fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect()
  }

  #[test]
  fn status_strings() {
    assert_eq!(ExtractionStatus::Extracted.to_string(), "Extracted");
    assert_eq!(ExtractionStatus::NoJsonFound.to_string(), "No JSON Found");
    assert_eq!(
      ExtractionStatus::from_str("Extraction Failed (ZIP Missing)").unwrap(),
      ExtractionStatus::ArchiveMissing
    );
    let s: &'static str = ExtractionStatus::SampleFailed.into();
    assert_eq!(s, "Extracted (Sample Failed)");
  }

  #[tokio::test]
  async fn extracts_json_members_and_samples() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip(&dir, "bulk.zip", &[
      ("CIK0000000002.json", r#"{"cik": 2, "name": "SECOND REGISTRANT INC"}"#),
      ("README.txt", "not json"),
      ("CIK0000000001.json", r#"{"cik": 1, "name": "FIRST REGISTRANT INC"}"#),
    ]);
    let dest = dir.path().join("out");

    let outcome = extract_and_sample(&archive, &dest, &ExtractOptions::default())
      .await
      .unwrap();

    assert_eq!(outcome.status, ExtractionStatus::Extracted);
    assert_eq!(names(&outcome.files), ["CIK0000000001.json", "CIK0000000002.json"]);
    for file in &outcome.files {
      let doc: String = fs::read_to_string(file).unwrap();
      assert!(doc.contains("REGISTRANT"));
    }
    assert!(!dest.join("README.txt").exists());
    let sample = outcome.sample.unwrap();
    assert!(sample.contains("FIRST REGISTRANT"));
  }

  #[tokio::test]
  async fn nested_members_are_flattened_and_noise_skipped() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip(&dir, "nested.zip", &[
      ("companyfacts/", ""),
      ("companyfacts/CIK0000000003.JSON", "{}"),
      ("__MACOSX/companyfacts/._CIK0000000003.json", "junk"),
      ("deep/er/CIK0000000004.json", "{}"),
    ]);
    let dest = dir.path().join("flat");

    let files = extract_json_members(&archive, &dest, 2).await.unwrap();

    assert_eq!(names(&files), ["CIK0000000003.JSON", "CIK0000000004.json"]);
    assert!(files.iter().all(|p| p.parent() == Some(dest.as_path())));
    assert!(!dest.join("companyfacts").exists());
  }

  #[tokio::test]
  async fn archive_without_json_is_reported() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip(&dir, "plain.zip", &[("a.txt", "a"), ("b.csv", "b")]);

    let dest = dir.path().join("out");
    let outcome = extract_and_sample(&archive, &dest, &ExtractOptions::default())
      .await
      .unwrap();

    assert_eq!(outcome.status, ExtractionStatus::NoJsonFound);
    assert_eq!(outcome.sample, None);
    assert!(outcome.files.is_empty());
    assert!(dest.is_dir());
  }

  #[tokio::test]
  async fn missing_archive_is_reported() {
    let dir = TempDir::new().unwrap();
    let outcome = extract_and_sample(
      dir.path().join("absent.zip"),
      dir.path().join("out"),
      &ExtractOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.status, ExtractionStatus::ArchiveMissing);
    assert_eq!(outcome.sample, None);
  }

  #[tokio::test]
  async fn corrupt_archive_is_an_error() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("garbage.zip");
    fs::write(&archive, b"this is not a zip file").unwrap();
    let r = extract_json_members(&archive, dir.path().join("out"), 4).await;
    assert!(matches!(r, Err(Error::Zip(_))));
  }

  #[tokio::test]
  async fn every_member_extracted_exactly_once() {
    let dir = TempDir::new().unwrap();
    let bodies: Vec<(String, String)> = (0..40)
      .map(|i| (format!("CIK{i:010}.json"), format!("{{\"cik\": {i}}}")))
      .collect();
    let entries: Vec<(&str, &str)> = bodies
      .iter()
      .map(|(n, b)| (n.as_str(), b.as_str()))
      .collect();
    let archive = build_zip(&dir, "many.zip", &entries);

    for workers in [1, 3, 64] {
      let dest = dir.path().join(format!("out-{workers}"));
      let files = extract_json_members(&archive, &dest, workers).await.unwrap();
      assert_eq!(files.len(), 40, "workers = {workers}");
      let mut unique = files.clone();
      unique.dedup();
      assert_eq!(unique.len(), 40);
      assert_eq!(fs::read_dir(&dest).unwrap().count(), 40);
    }
  }

  #[tokio::test]
  async fn zero_workers_still_extracts() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip(&dir, "one.zip", &[("x.json", "{}")]);
    let files = extract_json_members(&archive, dir.path().join("out"), 0)
      .await
      .unwrap();
    assert_eq!(files.len(), 1);
  }

  #[tokio::test]
  async fn re_extraction_keeps_existing_files() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip(&dir, "again.zip", &[("a.json", "{\"v\": 1}"), ("b.json", "{}")]);
    let dest = dir.path().join("out");

    let first = extract_json_members(&archive, &dest, 2).await.unwrap();
    fs::write(dest.join("a.json"), "{\"v\": \"local edit\"}").unwrap();
    let second = extract_json_members(&archive, &dest, 2).await.unwrap();

    assert_eq!(first, second);
    let kept = fs::read_to_string(dest.join("a.json")).unwrap();
    assert!(kept.contains("local edit"));
  }

  #[tokio::test]
  async fn empty_existing_file_is_rewritten() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip(&dir, "redo.zip", &[("a.json", "{\"v\": 1}")]);
    let dest = dir.path().join("out");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("a.json"), "").unwrap();

    extract_json_members(&archive, &dest, 1).await.unwrap();

    assert_eq!(fs::read_to_string(dest.join("a.json")).unwrap(), "{\"v\": 1}");
  }

  #[tokio::test]
  async fn corrupt_member_does_not_stop_the_others() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip_with(
      &dir,
      "damaged.zip",
      &[
        ("good.json", "{\"ok\": true}"),
        ("bad.json", "{\"payload\": \"CORRUPT-ME-PLEASE\"}"),
      ],
      CompressionMethod::Stored,
    );

    // Stored members sit verbatim in the file; flipping their bytes breaks
    // the CRC without touching the central directory.
    let mut bytes = fs::read(&archive).unwrap();
    let needle = b"CORRUPT-ME-PLEASE";
    let at = bytes
      .windows(needle.len())
      .position(|w| w == needle)
      .unwrap();
    bytes[at..at + needle.len()].copy_from_slice(b"XXXXXXXXXXXXXXXXX");
    fs::write(&archive, bytes).unwrap();

    let dest = dir.path().join("out");
    let files = extract_json_members(&archive, &dest, 2).await.unwrap();

    assert_eq!(names(&files), ["good.json"]);
    assert!(!dest.join("bad.json").exists());
    assert!(!dest.join("bad.json.part").exists());
  }
}
