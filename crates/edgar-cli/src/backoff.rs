//! Offline preview of the adaptive rate limiter.
//!
//! Replays a sequence of upstream outcomes through an
//! [`AdaptiveRateLimiter`] built from the configured bounds, so operators can
//! see how a configuration reacts before pointing a fetcher at it.

use std::str::FromStr;

use edgar_core::rate_limit::{AdaptiveRateLimiter, RateLimiterConfig};

/// One upstream outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Success,
  RateLimited,
  /// A distress signal such as a connection reset, scaled by the default
  /// manual factor.
  Distress,
}

impl TryFrom<char> for Outcome {
  type Error = char;

  fn try_from(c: char) -> Result<Self, Self::Error> {
    match c.to_ascii_lowercase() {
      's' | '.' => Ok(Self::Success),
      'r' | '!' => Ok(Self::RateLimited),
      'm' | 'x' => Ok(Self::Distress),
      other => Err(other),
    }
  }
}

/// Longest script `simulate-backoff` accepts, repeats included.
pub const MAX_SCRIPT_STEPS: usize = 100_000;

/// A parsed outcome script: `s` success, `r` rate limited, `m` distress.
/// Whitespace and commas are ignored; `10s` repeats an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script(pub Vec<Outcome>);

impl FromStr for Script {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut outcomes = Vec::new();
    let mut repeat = String::new();
    for c in s.chars() {
      if c.is_ascii_digit() {
        repeat.push(c);
        continue;
      }
      if c.is_whitespace() || c == ',' {
        if !repeat.is_empty() {
          return Err(format!("count {repeat:?} is not followed by an outcome"));
        }
        continue;
      }
      let outcome = Outcome::try_from(c).map_err(|c| format!("unknown outcome {c:?}"))?;
      let times = if repeat.is_empty() {
        1
      } else {
        repeat.parse::<usize>().map_err(|e| e.to_string())?
      };
      repeat.clear();
      if times > MAX_SCRIPT_STEPS - outcomes.len() {
        return Err(format!("script is longer than {MAX_SCRIPT_STEPS} steps"));
      }
      outcomes.extend(std::iter::repeat_n(outcome, times));
    }
    if !repeat.is_empty() {
      return Err(format!("count {repeat:?} is not followed by an outcome"));
    }
    Ok(Self(outcomes))
  }
}

/// The limiter's delay after one outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
  pub outcome: Outcome,
  pub delay:   f64,
}

/// Replay `script` through a fresh limiter.
pub fn simulate(config: RateLimiterConfig, script: &Script) -> Vec<Step> {
  let mut limiter = AdaptiveRateLimiter::new(config);
  script
    .0
    .iter()
    .map(|&outcome| {
      match outcome {
        Outcome::Success => limiter.on_success(),
        Outcome::RateLimited => limiter.on_rate_limit(),
        Outcome::Distress => limiter.on_manual_increase_default(),
      }
      Step {
        outcome,
        delay: limiter.get_delay(),
      }
    })
    .collect()
}
