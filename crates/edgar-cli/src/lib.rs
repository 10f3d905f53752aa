//! Support code for the `edgar` binary: configuration, document discovery
//! and the backoff preview.

pub mod backoff;
pub mod config;
pub mod documents;

pub use config::{IngestConfig, expand_tilde};
