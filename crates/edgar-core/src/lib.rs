//! Core record types for the EDGAR ingestion pipeline.
//!
//! This crate is deliberately free of filesystem and database dependencies.
//! The normalizer, archive extractor and SQLite store all depend on it; it
//! depends on nothing but serialization and time handling.

pub mod archive;
pub mod cik;
pub mod error;
pub mod rate_limit;
pub mod submission;
pub mod untrackable;
pub mod xbrl;

pub use cik::Cik;
pub use error::{Error, Result};
