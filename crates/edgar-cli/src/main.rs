//! `edgar`: command-line driver for EDGAR bulk-data ingestion.
//!
//! Reads `edgar.toml` (or the path given with `--config`) layered under
//! `EDGAR_*` environment variables, opens the SQLite database named by
//! `db_path`, and runs one subcommand.

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use edgar_archive::{ExtractionStatus, extract_and_sample, inventory_record};
use edgar_cli::{
  IngestConfig,
  backoff::{self, Script},
  documents::{DocumentPair, pair_documents},
};
use edgar_core::archive::ArchiveRecord;
use edgar_store_sqlite as store;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "EDGAR bulk-data ingestion")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "edgar.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Extract the JSON members of a bulk archive and record it in the
  /// inventory.
  Extract {
    archive: PathBuf,
    /// Output directory; defaults to `<extract_dir>/<archive stem>`.
    #[arg(long)]
    dest:    Option<PathBuf>,
  },
  /// Normalize one submission document and report what it contains.
  ParseSubmission {
    file: PathBuf,
    /// Print the full record set as JSON.
    #[arg(long)]
    json: bool,
  },
  /// Normalize one company-facts document.
  ParseFacts {
    file:       PathBuf,
    /// Restrict facts to the filings listed in this submission document.
    #[arg(long, value_name = "FILE")]
    submission: Option<PathBuf>,
    /// Print the full record set as JSON.
    #[arg(long)]
    json:       bool,
  },
  /// Normalize and store every `CIK##########.json` document pair.
  Load {
    submissions_dir:  PathBuf,
    companyfacts_dir: PathBuf,
  },
  /// Manage tickers whose upstream fetch fails permanently.
  Untrackable {
    #[command(subcommand)]
    action: UntrackableAction,
  },
  /// Replay outcomes (`s` success, `r` rate limited, `m` distress; `10s`
  /// repeats) through the configured rate limiter and print each delay.
  SimulateBackoff { script: Script },
}

#[derive(Subcommand)]
enum UntrackableAction {
  /// Record a ticker as untrackable now.
  Mark { ticker: String, reason: String },
  /// List tickers still inside their cooldown window.
  List {
    /// Cooldown in days; defaults to `untrackable_expiry_days`.
    #[arg(long)]
    expiry_days: Option<u32>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = IngestConfig::load(&cli.config).context("failed to load configuration")?;

  match cli.command {
    Command::Extract { archive, dest } => extract(&cfg, &archive, dest).await,
    Command::ParseSubmission { file, json } => parse_submission(&file, json),
    Command::ParseFacts {
      file,
      submission,
      json,
    } => parse_facts(&file, submission.as_deref(), json),
    Command::Load {
      submissions_dir,
      companyfacts_dir,
    } => load(&cfg, &submissions_dir, &companyfacts_dir).await,
    Command::Untrackable { action } => untrackable(&cfg, action).await,
    Command::SimulateBackoff { script } => {
      for (i, step) in backoff::simulate(cfg.rate_limiter, &script).iter().enumerate() {
        println!("{:>4}  {:<11}  {:>8.2}s", i + 1, format!("{:?}", step.outcome), step.delay);
      }
      Ok(())
    }
  }
}

// ─── Database access ─────────────────────────────────────────────────────────

async fn open_db(cfg: &IngestConfig) -> anyhow::Result<tokio_rusqlite::Connection> {
  if let Some(parent) = cfg.db_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  tokio_rusqlite::Connection::open(&cfg.db_path)
    .await
    .with_context(|| format!("failed to open database at {:?}", cfg.db_path))
}

/// Run a store operation on the database thread.
async fn with_db<T, F>(db: &tokio_rusqlite::Connection, op: F) -> anyhow::Result<T>
where
  F: FnOnce(&rusqlite::Connection) -> store::Result<T> + Send + 'static,
  T: Send + 'static,
{
  let value = db
    .call(move |conn| op(conn).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e))))
    .await?;
  Ok(value)
}

// ─── Subcommands ─────────────────────────────────────────────────────────────

async fn extract(cfg: &IngestConfig, archive: &Path, dest: Option<PathBuf>) -> anyhow::Result<()> {
  let archive = cfg.resolve_archive(archive);
  let dest = dest.unwrap_or_else(|| cfg.extract_dest(&archive));

  let outcome = extract_and_sample(&archive, &dest, &cfg.extract_options())
    .await
    .with_context(|| format!("failed to extract {archive:?}"))?;

  let db = open_db(cfg).await?;
  let key = archive.to_string_lossy().into_owned();
  let previous = {
    let key = key.clone();
    with_db(&db, move |conn| store::get_archive_record(conn, &key)).await?
  };

  let status = outcome.status.to_string();
  let mut record = if outcome.status == ExtractionStatus::ArchiveMissing {
    ArchiveRecord::new(key)
  } else {
    inventory_record(&archive, status.clone())
      .with_context(|| format!("failed to stat {archive:?}"))?
  };
  record.status = Some(status);
  if let Some(previous) = previous {
    record.url = previous.url;
    record.download_timestamp_utc = previous.download_timestamp_utc;
  }
  with_db(&db, move |conn| store::upsert_archive_records(conn, &[record])).await?;

  println!("{}: {}", archive.display(), outcome.status);
  println!("  {} JSON file(s) in {}", outcome.files.len(), dest.display());
  if let Some(sample) = outcome.sample {
    println!("  sample: {sample}");
  }
  Ok(())
}

fn parse_submission(file: &Path, json: bool) -> anyhow::Result<()> {
  let records = edgar_json::try_parse_submission(file)
    .with_context(|| format!("failed to parse submission {file:?}"))?;
  if json {
    println!("{}", serde_json::to_string_pretty(&records)?);
  } else {
    println!(
      "{} {}: {} ticker(s), {} former name(s), {} filing(s)",
      records.company.cik,
      records.company.primary_name.as_deref().unwrap_or("<unnamed>"),
      records.tickers.len(),
      records.former_names.len(),
      records.filings.len(),
    );
  }
  Ok(())
}

fn parse_facts(file: &Path, submission: Option<&Path>, json: bool) -> anyhow::Result<()> {
  let relevant: Option<HashSet<String>> = submission
    .map(|path| {
      edgar_json::try_parse_submission(path)
        .map(|s| s.accession_numbers())
        .with_context(|| format!("failed to parse submission {path:?}"))
    })
    .transpose()?;

  let records = edgar_json::try_parse_company_facts(file, relevant.as_ref())
    .with_context(|| format!("failed to parse company facts {file:?}"))?;
  if json {
    println!("{}", serde_json::to_string_pretty(&records)?);
  } else {
    println!(
      "{} {}: {} tag(s), {} fact(s)",
      records.cik,
      records.company_entity_name.as_deref().unwrap_or("<unnamed>"),
      records.xbrl_tags.len(),
      records.xbrl_facts.len(),
    );
  }
  Ok(())
}

async fn load(cfg: &IngestConfig, submissions_dir: &Path, facts_dir: &Path) -> anyhow::Result<()> {
  let pairs = pair_documents(submissions_dir, facts_dir)
    .with_context(|| format!("failed to list {submissions_dir:?}"))?;
  tracing::info!(documents = pairs.len(), "loading document pairs");

  let db = open_db(cfg).await?;
  with_db(&db, store::ensure_edgar_schema).await?;

  let (mut loaded, mut skipped) = (0usize, 0usize);
  for pair in pairs {
    let cik = pair.cik.clone();
    match load_pair(&db, pair).await {
      Ok(true) => loaded += 1,
      Ok(false) => skipped += 1,
      // Database failures leave the store in doubt; stop here.
      Err(e) => return Err(e.context(format!("failed to load CIK {cik}"))),
    }
  }

  tracing::info!(loaded, skipped, "load finished");
  println!("loaded {loaded} compan(ies), skipped {skipped} unreadable document(s)");
  Ok(())
}

/// Normalize and store one entity. Returns `false` when its submission
/// document is unusable.
async fn load_pair(db: &tokio_rusqlite::Connection, pair: DocumentPair) -> anyhow::Result<bool> {
  let parsed = tokio::task::spawn_blocking(move || {
    let submission = edgar_json::parse_submission(&pair.submission)?;
    let relevant = submission.accession_numbers();
    let facts = pair
      .facts
      .and_then(|path| edgar_json::parse_company_facts(path, Some(&relevant)));
    Some((submission, facts))
  })
  .await?;

  let Some((submission, facts)) = parsed else {
    return Ok(false);
  };
  with_db(db, move |conn| {
    store::load_submission(conn, &submission)?;
    if let Some(facts) = facts {
      store::load_company_facts(conn, &facts)?;
    }
    Ok(())
  })
  .await?;
  Ok(true)
}

async fn untrackable(cfg: &IngestConfig, action: UntrackableAction) -> anyhow::Result<()> {
  let db = open_db(cfg).await?;
  match action {
    UntrackableAction::Mark { ticker, reason } => {
      with_db(&db, move |conn| store::mark_untrackable(conn, &ticker, Some(&reason))).await?;
    }
    UntrackableAction::List { expiry_days } => {
      let days = expiry_days.unwrap_or(cfg.untrackable_expiry_days);
      let tickers = db
        .call(move |conn| Ok(store::list_untrackable(conn, days)))
        .await?;
      let mut tickers: Vec<_> = tickers.into_iter().collect();
      tickers.sort();
      for ticker in tickers {
        println!("{ticker}");
      }
    }
  }
  Ok(())
}
