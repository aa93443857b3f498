//! Constants for the probe module (timeouts, throttling, redirects).

use std::time::Duration;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default probability of sleeping after a probe.
pub const DEFAULT_DELAY_PROBABILITY: f64 = 0.1;

/// Default throttle delays, in milliseconds.
pub const DEFAULT_DELAYS_MS: [u64; 5] = [500, 1000, 1500, 2000, 2500];

/// Maximum number of redirects followed per probe.
pub const MAX_REDIRECTS: usize = 10;

/// Default throttle delays as durations.
#[must_use]
pub fn default_delays() -> Vec<Duration> {
    DEFAULT_DELAYS_MS
        .iter()
        .map(|ms| Duration::from_millis(*ms))
        .collect()
}
