//! Short text previews of extracted documents.

use std::{
  fs::File,
  io::{self, Read},
  path::Path,
};

/// Preview length used when none is configured.
pub const DEFAULT_SAMPLE_CHARS: usize = 500;

/// Preview recorded for a zero-length file.
pub const EMPTY_FILE_SAMPLE: &str = "[Empty File]";

/// First lines at most this long are too short to be representative, so the
/// preview falls back to the head of the file.
const MIN_FIRST_LINE_CHARS: usize = 20;

/// Preview a file, logging and returning `None` when it cannot be read.
pub fn sample_json(path: impl AsRef<Path>, max_chars: usize) -> Option<String> {
  let path = path.as_ref();
  try_sample_json(path, max_chars)
    .inspect_err(|e| tracing::error!(file = %path.display(), "failed to sample file: {e}"))
    .ok()
}

/// Preview a file.
///
/// The preview is the first line when that line is longer than 20
/// characters, otherwise the first `max_chars` characters. Anything longer
/// than `max_chars` is cut and suffixed with `...`. Line breaks are replaced
/// by spaces and invalid UTF-8 is decoded lossily.
pub fn try_sample_json(path: impl AsRef<Path>, max_chars: usize) -> io::Result<String> {
  // Bulk documents are usually a single multi-megabyte line; a UTF-8
  // character is at most four bytes, so this prefix always covers
  // `max_chars + 1` characters.
  let budget = (max_chars as u64).saturating_add(1).saturating_mul(4);
  let mut head = Vec::new();
  File::open(path)?.take(budget).read_to_end(&mut head)?;
  Ok(preview(&String::from_utf8_lossy(&head), max_chars))
}

fn preview(head: &str, max_chars: usize) -> String {
  if head.is_empty() {
    return EMPTY_FILE_SAMPLE.to_string();
  }

  let first_line = head.lines().next().unwrap_or_default().trim();
  let source = if first_line.chars().count() > MIN_FIRST_LINE_CHARS {
    first_line
  } else {
    head
  };

  let mut sample: String = source.chars().take(max_chars).collect();
  if source.chars().nth(max_chars).is_some() {
    sample.push_str("...");
  }
  sample.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn long_first_line_is_truncated() {
    let line = format!("{{\"cik\": 1, \"payload\": \"{}\"}}", "x".repeat(1000));
    let out = preview(&line, 500);
    assert_eq!(out.chars().count(), 503);
    assert!(out.ends_with("..."));
    assert!(out.starts_with("{\"cik\": 1"));
  }

  #[test]
  fn long_first_line_is_used_alone() {
    let head = "{\"cik\": 1, \"name\": \"FIRST\"}\n{\"second\": true}";
    assert_eq!(preview(head, 500), "{\"cik\": 1, \"name\": \"FIRST\"}");
  }

  #[test]
  fn short_first_line_falls_back_to_head() {
    let head = "{\n  \"cik\": 1\n}\n";
    assert_eq!(preview(head, 500), "{   \"cik\": 1 } ");
  }

  #[test]
  fn short_file_is_not_suffixed() {
    assert_eq!(preview("{}", 500), "{}");
  }

  #[test]
  fn empty_file_has_placeholder() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, "").unwrap();
    assert_eq!(sample_json(&path, 500).as_deref(), Some(EMPTY_FILE_SAMPLE));
  }

  #[test]
  fn multibyte_characters_are_counted_as_characters() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wide.json");
    fs::write(&path, "€".repeat(50)).unwrap();
    let out = sample_json(&path, 10).unwrap();
    assert_eq!(out, format!("{}...", "€".repeat(10)));
  }

  #[test]
  fn unbounded_sample_size_reads_whole_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.json");
    fs::write(&path, "{\"cik\": 1}").unwrap();
    assert_eq!(sample_json(&path, usize::MAX).as_deref(), Some("{\"cik\": 1}"));
  }

  #[test]
  fn missing_file_is_none() {
    let dir = TempDir::new().unwrap();
    assert_eq!(sample_json(dir.path().join("absent.json"), 500), None);
  }
}
