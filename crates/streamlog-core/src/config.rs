//! Recording loop configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

const fn default_poll_interval_secs() -> u64 {
    1
}

const fn default_stale_after_secs() -> u64 {
    120
}

/// Tuning knobs for the recording loop.
///
/// Defaults: one poll per second, staleness warning after two minutes
/// without new messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Seconds slept between poll cycles. The sleep is the only rate
    /// enforcement; request latency is not subtracted.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds without a nonempty batch before the one-time staleness
    /// warning is emitted.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl RecorderConfig {
    /// Sleep duration between poll cycles
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Quiet period after which the staleness warning fires
    pub const fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}
