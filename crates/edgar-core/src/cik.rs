//! Central Index Key canonicalization.
//!
//! EDGAR documents carry the CIK as a bare integer (`320193`), as a string
//! (`"320193"`), or as a file-name style token (`"CIK0000320193"`). Every
//! record produced by this workspace uses the canonical ten-digit,
//! zero-padded form.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Width of a canonical CIK.
pub const CIK_WIDTH: usize = 10;

/// A canonical, zero-padded ten-digit CIK.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Cik(String);

impl Cik {
  /// Canonicalize a CIK from its integer form.
  pub fn from_number(n: u64) -> Result<Self> {
    let digits = n.to_string();
    if digits.len() > CIK_WIDTH {
      return Err(Error::InvalidCik(digits));
    }
    Ok(Self(format!("{n:0>CIK_WIDTH$}")))
  }

  /// Canonicalize a CIK from a JSON scalar.
  ///
  /// Accepts non-negative integers, integral floats and digit strings (with
  /// an optional `CIK` prefix). Anything else yields `None`.
  pub fn from_json(value: &serde_json::Value) -> Option<Self> {
    match value {
      serde_json::Value::Number(n) => {
        if let Some(u) = n.as_u64() {
          return Self::from_number(u).ok();
        }
        let f = n.as_f64()?;
        if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < 1e10 {
          Self::from_number(f as u64).ok()
        } else {
          None
        }
      }
      serde_json::Value::String(s) => s.parse().ok(),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for Cik {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let digits = match trimmed.get(..3) {
      Some(prefix) if prefix.eq_ignore_ascii_case("CIK") => &trimmed[3..],
      _ => trimmed,
    };

    if digits.is_empty()
      || digits.len() > CIK_WIDTH
      || !digits.bytes().all(|b| b.is_ascii_digit())
    {
      return Err(Error::InvalidCik(s.to_string()));
    }

    Ok(Self(format!("{digits:0>CIK_WIDTH$}")))
  }
}

impl TryFrom<String> for Cik {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Cik> for String {
  fn from(cik: Cik) -> Self { cik.0 }
}

impl fmt::Display for Cik {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Cik {
  fn as_ref(&self) -> &str { &self.0 }
}
