//! Per-worker adaptive rate limiting.
//!
//! An [`AdaptiveRateLimiter`] only advises how long to wait before the next
//! upstream request; it never sleeps. Each worker owns its own instance.
//! Sharing one across threads is unsupported, which is why the type takes
//! `&mut self` everywhere and carries no interior mutability.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Consecutive successes required before the delay is relaxed.
pub const RECOVERY_THRESHOLD: u32 = 10;

/// Multiplier applied to the delay after [`RECOVERY_THRESHOLD`] successes.
const RECOVERY_FACTOR: f64 = 0.9;

/// Multiplier applied on a rate-limit response.
const BACKOFF_FACTOR: f64 = 2.0;

/// Delay bounds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
  pub base_delay: f64,
  pub min_delay:  f64,
  pub max_delay:  f64,
}

impl Default for RateLimiterConfig {
  fn default() -> Self {
    Self {
      base_delay: 30.0,
      min_delay:  5.0,
      max_delay:  120.0,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AdaptiveRateLimiter {
  config:           RateLimiterConfig,
  current_delay:    f64,
  success_count:    u32,
  rate_limit_count: u64,
}

impl AdaptiveRateLimiter {
  pub fn new(config: RateLimiterConfig) -> Self {
    let mut limiter = Self {
      config,
      current_delay: config.base_delay,
      success_count: 0,
      rate_limit_count: 0,
    };
    limiter.current_delay = limiter.bounded(config.base_delay);
    limiter
  }

  pub fn config(&self) -> RateLimiterConfig { self.config }

  /// The current advisory wait, in seconds.
  pub fn get_delay(&self) -> f64 { self.current_delay }

  /// The current advisory wait as a [`Duration`].
  pub fn delay(&self) -> Duration {
    Duration::try_from_secs_f64(self.current_delay).unwrap_or(Duration::ZERO)
  }

  /// Total number of rate-limit responses observed.
  pub fn rate_limit_count(&self) -> u64 { self.rate_limit_count }

  /// Record a successful request.
  ///
  /// Only every [`RECOVERY_THRESHOLD`]th consecutive success has an effect:
  /// the delay shrinks by 10%, never below `min_delay`.
  pub fn on_success(&mut self) {
    self.success_count += 1;
    if self.success_count >= RECOVERY_THRESHOLD {
      let relaxed = (self.current_delay * RECOVERY_FACTOR).max(self.config.min_delay);
      if relaxed < self.current_delay {
        self.current_delay = relaxed;
      }
      self.success_count = 0;
    }
  }

  /// Record a rate-limit response. Backoff is immediate: the delay doubles,
  /// is raised to at least `base_delay`, and is capped at `max_delay`.
  pub fn on_rate_limit(&mut self) {
    self.rate_limit_count += 1;
    self.current_delay = (self.current_delay * BACKOFF_FACTOR)
      .max(self.config.base_delay)
      .min(self.config.max_delay);
    self.success_count = 0;
  }

  /// Scale the delay by `factor` in response to a distress signal outside
  /// the success/rate-limit vocabulary (connection resets, timeouts).
  pub fn on_manual_increase(&mut self, factor: f64) {
    self.current_delay = self.bounded(self.current_delay * factor);
  }

  /// [`on_manual_increase`](Self::on_manual_increase) with a factor of 2.
  pub fn on_manual_increase_default(&mut self) { self.on_manual_increase(BACKOFF_FACTOR); }

  fn bounded(&self, delay: f64) -> f64 {
    delay.max(self.config.min_delay).min(self.config.max_delay)
  }
}

impl Default for AdaptiveRateLimiter {
  fn default() -> Self { Self::new(RateLimiterConfig::default()) }
}
