//! Runtime configuration.

use std::path::{Path, PathBuf};

use edgar_archive::ExtractOptions;
use edgar_core::rate_limit::RateLimiterConfig;
use serde::Deserialize;

/// Settings for an ingestion run, read from `edgar.toml` and `EDGAR_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
  pub db_path:                 PathBuf,
  pub download_dir:            PathBuf,
  pub extract_dir:             PathBuf,
  pub max_workers:             usize,
  pub sample_chars:            usize,
  pub untrackable_expiry_days: u32,
  pub rate_limiter:            RateLimiterConfig,
}

impl Default for IngestConfig {
  fn default() -> Self {
    let extract = ExtractOptions::default();
    Self {
      db_path:                 PathBuf::from("edgar.db"),
      download_dir:            PathBuf::from("downloads"),
      extract_dir:             PathBuf::from("extracted"),
      max_workers:             extract.workers,
      sample_chars:            extract.sample_chars,
      untrackable_expiry_days: 365,
      rate_limiter:            RateLimiterConfig::default(),
    }
  }
}

impl IngestConfig {
  /// Layer the optional TOML file at `path` under `EDGAR_*` variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("EDGAR"))
      .build()?
      .try_deserialize::<Self>()
      .map(Self::expanded)
  }

  /// Expand `~/` in every configured path.
  pub fn expanded(mut self) -> Self {
    self.db_path = expand_tilde(&self.db_path);
    self.download_dir = expand_tilde(&self.download_dir);
    self.extract_dir = expand_tilde(&self.extract_dir);
    self
  }

  pub fn extract_options(&self) -> ExtractOptions {
    ExtractOptions {
      workers:      self.max_workers,
      sample_chars: self.sample_chars,
    }
  }

  /// Where an archive named on the command line lives: as given when it
  /// exists, otherwise under `download_dir`.
  pub fn resolve_archive(&self, archive: &Path) -> PathBuf {
    if archive.is_relative() && !archive.exists() {
      return self.download_dir.join(archive);
    }
    archive.to_path_buf()
  }

  /// Default extraction target for an archive: `extract_dir/<archive stem>`.
  pub fn extract_dest(&self, archive: &Path) -> PathBuf {
    let stem = archive.file_stem().unwrap_or(archive.as_os_str());
    self.extract_dir.join(stem)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
