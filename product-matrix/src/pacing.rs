//! Fixed-interval request pacing.
//!
//! The upstream throttles aggressively, so every vendor-SKU lookup and every
//! bulk detail batch waits a fixed interval before it is sent. The wait is
//! best-effort spacing, not a rate guarantee: concurrent callers sleep in
//! parallel.
//!
//! # Examples
//!
//! ```rust
//! use product_matrix::pacing::{Pacer, PacingConfig};
//!
//! # async fn example() {
//! let pacer = Pacer::new(PacingConfig { interval_ms: 0 });
//! pacer.pace().await;
//! assert_eq!(pacer.paced_calls(), 1);
//! # }
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use serde::Deserialize;
use tracing::trace;

/// Pacing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    /// Wait before each paced request, in milliseconds. `0` disables pacing.
    ///
    /// Default: 1000
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

const fn default_interval_ms() -> u64 {
    1000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { interval_ms: default_interval_ms() }
    }
}

impl PacingConfig {
    /// The interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Sleeps a fixed interval before each paced request.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    calls: AtomicU64,
}

impl Pacer {
    /// Creates a pacer from its configuration.
    #[must_use]
    pub const fn new(config: PacingConfig) -> Self {
        Self { interval: config.interval(), calls: AtomicU64::new(0) }
    }

    /// Waits the configured interval.
    pub async fn pace(&self) {
        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if self.interval.is_zero() {
            return;
        }
        trace!(interval_ms = self.interval.as_millis(), calls, "pacing upstream request");
        tokio::time::sleep(self.interval).await;
    }

    /// Number of times [`pace`](Self::pace) has been awaited.
    #[must_use]
    pub fn paced_calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// The configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[test]
    fn test_default_interval() {
        assert_eq!(PacingConfig::default().interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_sleeps_interval() {
        let pacer = Pacer::new(PacingConfig { interval_ms: 1000 });
        let start = Instant::now();

        pacer.pace().await;
        pacer.pace().await;

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(pacer.paced_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_does_not_sleep() {
        let pacer = Pacer::new(PacingConfig { interval_ms: 0 });
        let start = Instant::now();

        pacer.pace().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(pacer.paced_calls(), 1);
        assert!(pacer.interval().is_zero());
    }

    #[test]
    fn test_config_from_toml() {
        let config: PacingConfig = toml::from_str("interval_ms = 250").unwrap();
        assert_eq!(config.interval(), Duration::from_millis(250));

        let config: PacingConfig = toml::from_str("").unwrap();
        assert_eq!(config, PacingConfig::default());
    }
}
